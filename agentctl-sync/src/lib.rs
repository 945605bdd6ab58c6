//! # agentctl-sync
//!
//! Digest-gated atomic writer and the Context Materializer.
//!
//! [`Materializer::write`] renders the context bundle for one agent and
//! writes it to every generated filename at a worktree root. [`refresh`]
//! runs the materializer across every matching worktree, and [`diff`]
//! produces the unified diffs shown by `refresh-context --dry-run`.

pub mod diff;
pub mod error;
pub mod materialize;
pub mod refresh;
pub mod writer;

pub use diff::FileDiff;
pub use error::SyncError;
pub use materialize::Materializer;
pub use refresh::{RefreshFilter, RefreshReport};
pub use writer::{atomic_write, atomic_write_mode, WriteResult};
