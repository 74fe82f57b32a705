//! Directory adapter: the users delta feed and per-user license lookup.

use provision_core::{Cursor, ServicePlanAssignment, UserId};
use provision_sync::{ChangeFeed, EntitlementSource, FeedPage, RemoteError};

use crate::client::{path_segment, GraphClient};
use crate::dto::{DeltaPageDto, LicenseDetailsPageDto};

/// Fields requested from the delta feed.
pub const DELTA_SELECT: &str = "id,mail,displayName";

/// [`ChangeFeed`] and [`EntitlementSource`] over the directory API.
#[derive(Debug, Clone)]
pub struct GraphDirectory {
    client: GraphClient,
}

impl GraphDirectory {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    fn fetch_page(&self, url: &str) -> Result<FeedPage, RemoteError> {
        let page: DeltaPageDto = self.client.get_json(url)?;
        let page = page.into_feed_page();
        tracing::debug!(records = page.records.len(), "delta page received");
        Ok(page)
    }
}

impl ChangeFeed for GraphDirectory {
    fn start_full(&self) -> Result<FeedPage, RemoteError> {
        let url = self.client.url(&format!("/users/delta?$select={DELTA_SELECT}"));
        self.fetch_page(&url)
    }

    /// The cursor is the delta link handed out by the previous run.
    fn resume_from(&self, cursor: &Cursor) -> Result<FeedPage, RemoteError> {
        self.client.check_link(cursor.as_str())?;
        self.fetch_page(cursor.as_str())
    }

    fn next_page(&self, link: &str) -> Result<FeedPage, RemoteError> {
        self.client.check_link(link)?;
        self.fetch_page(link)
    }
}

impl EntitlementSource for GraphDirectory {
    fn entitlements(&self, user: &UserId) -> Result<Vec<ServicePlanAssignment>, RemoteError> {
        let mut url = self
            .client
            .url(&format!("/users/{}/licenseDetails", path_segment(&user.0)?));
        let mut plans = Vec::new();
        loop {
            let mut page: LicenseDetailsPageDto = self.client.get_json(&url)?;
            page.drain_assignments(&mut plans);
            match page.next_link.take() {
                Some(next) => {
                    self.client.check_link(&next)?;
                    url = next;
                }
                None => return Ok(plans),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::{build_agent, AccessToken};

    fn directory() -> GraphDirectory {
        GraphDirectory::new(GraphClient::new(
            build_agent(Duration::from_secs(1)),
            "https://graph.microsoft.com/v1.0",
            AccessToken::new("t"),
        ))
    }

    #[test]
    fn resume_refuses_foreign_cursor_without_a_request() {
        let err = directory()
            .resume_from(&Cursor::new("https://elsewhere.example/users/delta?$deltatoken=x"))
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidRequest { .. }));
    }

    #[test]
    fn next_page_refuses_foreign_link() {
        let err = directory().next_page("https://elsewhere.example/next").unwrap_err();
        assert!(matches!(err, RemoteError::InvalidRequest { .. }));
    }

    #[test]
    fn entitlements_reject_path_like_ids() {
        let err = directory().entitlements(&UserId::from("../me")).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidRequest { .. }));
    }
}
