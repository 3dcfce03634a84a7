use std::time::Duration;

use async_trait::async_trait;
use labsync_common::config::Config;
use labsync_common::directory::{DirectoryClient, DirectoryResult, check_paging};
use labsync_common::error::{ConfigurationError, MembershipError};
use labsync_common::models::{AccessLevel, Group, Member, Project, User};
use labsync_common::request::GroupId;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::classify::{status_error, transport_error};
use crate::wire::{WireGroup, WireMember, WireProject, WireUser};

/// Largest `per_page` GitLab honours.
pub const MAX_PAGE_SIZE: u32 = 100;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const NEXT_PAGE_HEADER: &str = "x-next-page";

pub struct GitLabClient {
    http: Client,
    base: Url,
    token: String,
}

impl GitLabClient {
    pub fn new(config: &Config) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let base_url = config.base_url();
        let base = Url::parse(&base_url).map_err(|err| ConfigurationError::InvalidUrl {
            url: base_url.clone(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigurationError::InvalidUrl {
                url: base_url,
                reason: "not a hierarchical url".into(),
            });
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("labsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ConfigurationError::Client(err.to_string()))?;

        Ok(Self {
            http,
            base,
            token: config.token.clone(),
        })
    }

    /// Appends `segments` to the base url, percent-encoding each one so group
    /// paths like `platform/api` stay a single segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> DirectoryResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| MembershipError::Malformed(format!("cannot extend url {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> DirectoryResult<Response> {
        let response = request
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        trace!(%status, url = %response.url(), "directory response");
        if status.is_success() {
            return Ok(response);
        }

        let retry_after: Option<String> = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body: String = response.text().await.unwrap_or_default();
        Err(status_error(status, retry_after.as_deref(), &body))
    }

    /// One page of a list endpoint plus the `X-Next-Page` header.
    ///
    /// The header is `Some(None)` when present but empty, which GitLab sends on the last page.
    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Url,
        page: u32,
        per_page: u32,
    ) -> DirectoryResult<(Vec<T>, Option<Option<u32>>)> {
        let request = self
            .http
            .get(url)
            .query(&[("page", page), ("per_page", per_page)]);
        let response = self.send(request).await?;

        let next: Option<Option<u32>> = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .map(|value| value.to_str().ok().and_then(|v| v.trim().parse().ok()));
        let items: Vec<T> = response.json().await.map_err(transport_error)?;
        Ok((items, next))
    }

    /// Follows `X-Next-Page` until the last page. Without the header, a short
    /// page ends the listing.
    async fn get_all<T: DeserializeOwned>(&self, url: Url) -> DirectoryResult<Vec<T>> {
        let mut items: Vec<T> = Vec::new();
        let mut page: u32 = 1;

        loop {
            let (batch, next) = self.get_page::<T>(url.clone(), page, MAX_PAGE_SIZE).await?;
            let fetched = batch.len();
            items.extend(batch);

            match next {
                Some(Some(next)) if next > page => page = next,
                Some(_) => break,
                None if fetched == MAX_PAGE_SIZE as usize => page += 1,
                None => break,
            }
        }
        Ok(items)
    }

    async fn users_page(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> DirectoryResult<Vec<User>> {
        let mut url = self.endpoint(&["users"])?;
        if !query.is_empty() {
            url.query_pairs_mut().append_pair("search", query);
        }
        let (users, _) = self.get_page::<WireUser>(url, page, per_page).await?;
        Ok(users.into_iter().map(User::from).collect())
    }
}

#[async_trait]
impl DirectoryClient for GitLabClient {
    async fn list_users(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> DirectoryResult<Vec<User>> {
        check_paging(page, per_page)?;

        if per_page <= MAX_PAGE_SIZE {
            return self.users_page(query, page, per_page).await;
        }

        let (first, last, skip) = covering_pages(page, per_page);
        let mut users: Vec<User> = Vec::new();

        for api_page in first..=last {
            let api_page = u32::try_from(api_page)
                .map_err(|_| MembershipError::InvalidPaging { page, per_page })?;
            let batch = self.users_page(query, api_page, MAX_PAGE_SIZE).await?;
            let fetched = batch.len();
            users.extend(batch);
            debug!(api_page, fetched, total = users.len(), "fetched user sub-page");
            if fetched < MAX_PAGE_SIZE as usize {
                break;
            }
        }
        Ok(users.into_iter().skip(skip).take(per_page as usize).collect())
    }

    async fn list_groups(&self) -> DirectoryResult<Vec<Group>> {
        let url = self.endpoint(&["groups"])?;
        let groups = self.get_all::<WireGroup>(url).await?;
        Ok(groups.into_iter().map(Group::from).collect())
    }

    async fn list_group_projects(&self, group: &GroupId) -> DirectoryResult<Vec<Project>> {
        let url = self.endpoint(&["groups", group.as_str(), "projects"])?;
        let projects = self.get_all::<WireProject>(url).await?;
        Ok(projects.into_iter().map(Project::from).collect())
    }

    async fn list_group_members(&self, group: &GroupId) -> DirectoryResult<Vec<Member>> {
        let url = self.endpoint(&["groups", group.as_str(), "members"])?;
        let members = self.get_all::<WireMember>(url).await?;
        Ok(members.into_iter().map(Member::from).collect())
    }

    async fn add_group_member(
        &self,
        group: &GroupId,
        user_id: u64,
        access_level: AccessLevel,
    ) -> DirectoryResult<()> {
        let url = self.endpoint(&["groups", group.as_str(), "members"])?;
        let form = [
            ("user_id", user_id.to_string()),
            ("access_level", access_level.value().to_string()),
        ];
        self.send(self.http.post(url).form(&form)).await?;
        Ok(())
    }

    async fn remove_group_member(&self, group: &GroupId, user_id: u64) -> DirectoryResult<()> {
        let user = user_id.to_string();
        let url = self.endpoint(&["groups", group.as_str(), "members", &user])?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

/// API pages of [`MAX_PAGE_SIZE`] covering caller page `page` of size `per_page`.
///
/// Returns `(first, last, skip)`: the inclusive range of API pages to fetch and
/// how many leading users of the first one belong to the previous caller page.
fn covering_pages(page: u32, per_page: u32) -> (u64, u64, usize) {
    let size = u64::from(MAX_PAGE_SIZE);
    let start = u64::from(page - 1) * u64::from(per_page);
    let end = start + u64::from(per_page);
    let skip = (start % size) as usize;
    (start / size + 1, (end - 1) / size + 1, skip)
}
