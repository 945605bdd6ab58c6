//! # agentctl-renderer
//!
//! Tera-based rendering of the documents agentctl generates: the context
//! bundle written into worktrees, the default per-agent overlay, and the
//! banner typed into a freshly started window.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agentctl_renderer::{BundleContext, Renderer};
//!
//! fn render(ctx: &BundleContext) {
//!     if let Ok(renderer) = Renderer::new() {
//!         if let Ok(bundle) = renderer.bundle(ctx) {
//!             println!("{} bytes", bundle.len());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{BannerContext, BundleContext, OverlayContext};
pub use engine::{Renderer, TemplateEngine, TemplateKind};
pub use error::RenderError;
