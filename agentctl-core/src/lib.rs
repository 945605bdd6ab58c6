//! agentctl core library: domain types, on-disk agent registry, settings,
//! capability ports and errors.
//!
//! - [`types`]: validated newtypes and [`AgentPaths`]
//! - [`error`]: [`WorkspaceError`] and its [`ErrorKind`] classification
//! - [`layout`]: [`Settings`] (`config.yaml`) resolved into a [`Layout`]
//! - [`registry`]: [`AgentRegistry`]: agent directories and overlay files
//! - [`repos`]: [`RepoMap`]: the repo name → clone URL mapping document
//! - [`ports`]: multiplexer / source-control / secret-store interfaces
//! - [`lock`]: advisory per-agent and per-mirror file locks

pub mod error;
pub mod layout;
pub mod lock;
pub mod ports;
pub mod registry;
pub mod repos;
pub mod types;

pub use error::{ErrorKind, WorkspaceError};
pub use layout::{Layout, Settings};
pub use ports::{Multiplexer, SecretStore, SourceControl, WindowId, WindowInfo};
pub use registry::AgentRegistry;
pub use repos::RepoMap;
pub use types::{AgentName, AgentPaths, BranchName, RepoName, RESERVED_NAMES};
