//! Shared building blocks for `labsync`.
//!
//! * [`models`]: read-only projections of the remote directory (users, groups, members).
//! * [`directory`]: the [`directory::DirectoryClient`] port every backend implements.
//! * [`request`]: caller input for membership commands (group references, sync requests).
//! * [`config`]: connection settings loaded from `config.json`.
//! * [`error`]: the error taxonomy shared by every crate in the workspace.

pub mod config;
pub mod directory;
pub mod error;
pub mod macros;
pub mod models;
pub mod request;

#[doc(hidden)]
pub use tracing;
