use serde::{Deserialize, Serialize};

use crate::models::AccessLevel;

/// A user's membership in one group.
///
/// `id` is the user id; the group is implied by the query that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub access_level: AccessLevel,
}
