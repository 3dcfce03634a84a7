//! # Membership Synchronization Engine
//!
//! Everything here talks to the directory exclusively through
//! [`labsync_common::directory::DirectoryClient`], so any backend (the GitLab
//! adapter, an in-memory fake) can drive it.
//!
//! * [`resolver`]: turns a search query into a bounded, deduplicated user set.
//! * [`synchronizer`]: applies membership changes across `groups × users`.
//! * [`report`]: the per-pair outcomes of a run and their summary.
//! * [`service`]: one entry point per command.

pub mod report;
pub mod resolver;
pub mod service;
pub mod synchronizer;

#[cfg(test)]
mod testing;
