//! Group membership adapter.

use provision_core::{GroupId, UserId};
use provision_sync::{AddMemberOutcome, GroupMembership, RemoteError};

use crate::client::{path_segment, GraphClient};
use crate::dto::DirectoryObjectRefDto;

#[derive(Debug, Clone)]
pub struct GraphGroups {
    client: GraphClient,
}

impl GraphGroups {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

impl GroupMembership for GraphGroups {
    fn add_member(&self, group: &GroupId, user: &UserId) -> Result<AddMemberOutcome, RemoteError> {
        let url = self
            .client
            .url(&format!("/groups/{}/members/$ref", path_segment(&group.0)?));
        let body = DirectoryObjectRefDto {
            odata_id: self
                .client
                .url(&format!("/directoryObjects/{}", path_segment(&user.0)?)),
        };
        match self.client.post_json(&url, &body) {
            Ok(_) => Ok(AddMemberOutcome::Added),
            Err(err) if is_already_member(&err) => Ok(AddMemberOutcome::AlreadyMember),
            Err(err) => Err(err),
        }
    }
}

/// The directory answers 400 "One or more added object references already
/// exist" for an existing membership.
pub(crate) fn is_already_member(err: &RemoteError) -> bool {
    match err {
        RemoteError::Status { status: 400, message } => {
            message.to_ascii_lowercase().contains("already exist")
        }
        _ => false,
    }
}
