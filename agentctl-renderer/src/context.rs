//! Template contexts: one serializable payload per generated document.

use std::path::Path;

use serde::Serialize;

use agentctl_core::AgentPaths;

use crate::error::RenderError;

/// Payload for the context bundle: global document + agent overlay.
#[derive(Debug, Clone, Serialize)]
pub struct BundleContext {
    pub agent: String,
    pub global_path: String,
    pub overlay_path: String,
    /// Full text of the global context document.
    pub global: String,
    /// Full text of the agent's overlay document.
    pub overlay: String,
}

impl BundleContext {
    pub fn new(paths: &AgentPaths, global_path: &Path, global: String, overlay: String) -> Self {
        Self {
            agent: paths.name.to_string(),
            global_path: global_path.display().to_string(),
            overlay_path: paths.overlay.display().to_string(),
            global,
            overlay,
        }
    }
}

/// Payload for the default overlay written by `create-agent`.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayContext {
    pub agent: String,
    pub work_dir: String,
}

impl OverlayContext {
    pub fn new(paths: &AgentPaths) -> Self {
        Self {
            agent: paths.name.to_string(),
            work_dir: paths.work.display().to_string(),
        }
    }
}

/// Payload for the banner typed into a started window.
#[derive(Debug, Clone, Serialize)]
pub struct BannerContext {
    pub agent: String,
    pub work_dir: String,
    pub global_context: String,
    pub overlay: String,
}

impl BannerContext {
    pub fn new(paths: &AgentPaths, global_context: &Path) -> Self {
        Self {
            agent: paths.name.to_string(),
            work_dir: paths.work.display().to_string(),
            global_context: global_context.display().to_string(),
            overlay: paths.overlay.display().to_string(),
        }
    }
}

/// Convert any context to a [`tera::Context`] for rendering.
pub(crate) fn to_tera_context<T: Serialize>(ctx: &T) -> Result<tera::Context, RenderError> {
    tera::Context::from_serialize(ctx).map_err(RenderError::from)
}
