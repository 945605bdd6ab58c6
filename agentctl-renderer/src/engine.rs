//! Tera rendering engine: [`TemplateKind`] and [`Renderer`].
//!
//! # Templates
//!
//! | Kind    | Template name       | Used for                                  |
//! |---------|---------------------|-------------------------------------------|
//! | Bundle  | `bundle.md.tera`    | `CLAUDE.md`, `AGENTS.md`, `GEMINI.md`     |
//! | Overlay | `overlay.md.tera`   | default `<agent>/AGENT.md`                |
//! | Banner  | `banner.txt.tera`   | lines typed into a started window         |
//!
//! A file with the same name under the user template directory replaces the
//! embedded default; other files there are ignored.

use std::path::Path;

use serde::Serialize;
use tera::Tera;

use crate::context::{to_tera_context, BannerContext, BundleContext, OverlayContext};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// TemplateKind
// ---------------------------------------------------------------------------

/// Every document agentctl renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Bundle,
    Overlay,
    Banner,
}

impl TemplateKind {
    pub fn all() -> &'static [TemplateKind] {
        &[TemplateKind::Bundle, TemplateKind::Overlay, TemplateKind::Banner]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            TemplateKind::Bundle  => "bundle.md.tera",
            TemplateKind::Overlay => "overlay.md.tera",
            TemplateKind::Banner  => "banner.txt.tera",
        }
    }

    /// Default template compiled into the binary.
    fn embedded(&self) -> &'static str {
        match self {
            TemplateKind::Bundle  => include_str!("templates/bundle.md.tera"),
            TemplateKind::Overlay => include_str!("templates/overlay.md.tera"),
            TemplateKind::Banner  => include_str!("templates/banner.txt.tera"),
        }
    }

    /// The override at `<dir>/<template name>` if present, else the
    /// embedded default.
    fn source(&self, dir: Option<&Path>) -> Result<String, RenderError> {
        match dir.map(|d| d.join(self.template_name())).filter(|p| p.is_file()) {
            Some(path) => std::fs::read_to_string(&path).map_err(|source| RenderError::Io { path, source }),
            None => Ok(self.embedded().to_string()),
        }
    }
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut sources = Vec::with_capacity(TemplateKind::all().len());
    for kind in TemplateKind::all() {
        sources.push((kind.template_name(), kind.source(user_template_dir)?));
    }

    let mut tera = Tera::default();
    // Markdown and terminal text, never HTML.
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(sources)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Construct a new [`TemplateEngine`], loading embedded templates plus any
    /// overrides found in `user_template_dir`.
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render `kind` with `ctx`, normalising line endings to LF.
    pub fn render<T: Serialize>(&self, kind: TemplateKind, ctx: &T) -> Result<String, RenderError> {
        let tera_ctx = to_tera_context(ctx)?;
        let content = self.tera.render(kind.template_name(), &tera_ctx)?;
        Ok(content.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Typed front door over [`TemplateEngine`]. Create once and reuse.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Construct a new [`Renderer`] with embedded templates.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(None)? })
    }

    /// Embedded templates, overridden by any found in `dir`.
    pub fn with_overrides(dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(Some(dir))? })
    }

    /// The full context bundle text.
    pub fn bundle(&self, ctx: &BundleContext) -> Result<String, RenderError> {
        let mut out = self.engine.render(TemplateKind::Bundle, ctx)?;
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// Default overlay document for a new agent.
    pub fn overlay(&self, ctx: &OverlayContext) -> Result<String, RenderError> {
        self.engine.render(TemplateKind::Overlay, ctx)
    }

    /// Banner lines, blank lines dropped.
    pub fn banner(&self, ctx: &BannerContext) -> Result<Vec<String>, RenderError> {
        let text = self.engine.render(TemplateKind::Banner, ctx)?;
        Ok(text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
