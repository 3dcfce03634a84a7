use std::collections::HashSet;
use std::sync::Arc;

use labsync_common::directory::{DirectoryClient, DirectoryResult};
use labsync_common::models::User;
use tracing::debug;

/// Upper bound on resolved users, so an unfiltered query against a large
/// directory cannot grow without limit.
pub const DEFAULT_MAX_RESULTS: usize = 10_000;

/// Largest page requested from the directory in one call.
pub const PAGE_SIZE: u32 = 100;

/// Produces the candidate user set for a run.
pub struct MembershipResolver {
    client: Arc<dyn DirectoryClient>,
}

impl MembershipResolver {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self { client }
    }

    /// Users matching `query`, deduplicated by id in first-seen order and capped at `max_results`.
    ///
    /// An empty `query` applies no filter. Any remote failure is returned as-is.
    pub async fn resolve(&self, query: &str, max_results: usize) -> DirectoryResult<Vec<User>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let per_page: u32 = u32::try_from(max_results).map_or(PAGE_SIZE, |max| max.min(PAGE_SIZE));
        let mut seen: HashSet<u64> = HashSet::new();
        let mut users: Vec<User> = Vec::new();
        let mut page: u32 = 1;

        loop {
            let batch: Vec<User> = self.client.list_users(query, page, per_page).await?;
            let fetched: usize = batch.len();
            let before: usize = users.len();

            for user in batch {
                if users.len() == max_results {
                    break;
                }
                if seen.insert(user.id) {
                    users.push(user);
                }
            }

            debug!(page, fetched, total = users.len(), "resolved user page");

            let exhausted = fetched < per_page as usize;
            let stalled = users.len() == before;
            if users.len() >= max_results || exhausted || stalled {
                break;
            }
            page += 1;
        }

        Ok(users)
    }
}
