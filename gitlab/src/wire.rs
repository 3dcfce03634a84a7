//! Response bodies as GitLab sends them.

use labsync_common::models::{AccessLevel, Group, Member, Project, User};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    id: u64,
    username: String,
    name: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        User {
            id: wire.id,
            username: wire.username,
            display_name: wire.name,
            email: wire.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGroup {
    id: u64,
    name: String,
    path: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<WireGroup> for Group {
    fn from(wire: WireGroup) -> Self {
        Group {
            id: wire.id,
            name: wire.name,
            path: wire.path,
            description: wire.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireProject {
    id: u64,
    name: String,
}

impl From<WireProject> for Project {
    fn from(wire: WireProject) -> Self {
        Project {
            id: wire.id,
            name: wire.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMember {
    id: u64,
    username: String,
    name: String,
    access_level: u8,
}

impl From<WireMember> for Member {
    fn from(wire: WireMember) -> Self {
        Member {
            id: wire.id,
            username: wire.username,
            display_name: wire.name,
            access_level: AccessLevel::from(wire.access_level),
        }
    }
}
