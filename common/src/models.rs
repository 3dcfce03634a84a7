//! # Directory Models
//!
//! Read-only snapshots of remote directory state. They are fetched fresh for
//! every invocation and never cached beyond a single run.
//!
//! * [`user::User`]: an account in the directory, identified by `id`.
//! * [`group::Group`] and [`group::Project`]: groups and the projects they own.
//! * [`member::Member`]: a user's membership in a group together with its role.
//! * [`access::AccessLevel`]: the ordered role enumeration.

pub mod access;
pub mod group;
pub mod member;
pub mod user;

pub use access::AccessLevel;
pub use group::{Group, Project};
pub use member::Member;
pub use user::User;
