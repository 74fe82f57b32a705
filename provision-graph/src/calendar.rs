//! Calendar adapter: creates the invitation on the organizer's calendar.

use provision_core::UserId;
use provision_sync::{Calendar, Invitation, RemoteError};

use crate::client::{path_segment, GraphClient};
use crate::dto::EventDto;

#[derive(Debug, Clone)]
pub struct GraphCalendar {
    client: GraphClient,
}

impl GraphCalendar {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

impl Calendar for GraphCalendar {
    fn send_invitation(&self, organizer: &UserId, invitation: &Invitation) -> Result<(), RemoteError> {
        let url = self
            .client
            .url(&format!("/users/{}/events", path_segment(&organizer.0)?));
        let status = self.client.post_json(&url, &EventDto::from_invitation(invitation))?;
        tracing::debug!(status, attendees = invitation.attendees.len(), "event created");
        Ok(())
    }
}
