//! Domain types for the provisioning job.
//!
//! Identifiers are newtypes over the directory's string ids; service plans are
//! UUIDs. All types are serializable via serde so run reports and fixtures can
//! be emitted as JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Directory object id of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Directory object id of the target group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a licensed service plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServicePlanId(pub Uuid);

impl ServicePlanId {
    /// Microsoft Teams.
    pub const TEAMS: ServicePlanId =
        ServicePlanId(Uuid::from_u128(0x57ff2da0_773e_42df_b2af_ffb7a2317929));
    /// Exchange Online (Plan 1).
    pub const EXCHANGE_STANDARD: ServicePlanId =
        ServicePlanId(Uuid::from_u128(0x9aaf7827_d63c_4b61_89c3_182f06f82e5c));
    /// Exchange Online (Plan 2).
    pub const EXCHANGE_ENTERPRISE: ServicePlanId =
        ServicePlanId(Uuid::from_u128(0xefb87545_963c_4e0d_99df_69c6916d9eb0));
}

impl fmt::Display for ServicePlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ServicePlanId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Opaque resumption token of the directory delta feed.
///
/// `Debug` prints only the token length; the value itself embeds a signed
/// feed URL and must not end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor(<{} chars>)", self.0.len())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One user entry from the directory delta feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub id: UserId,
    /// Tombstone flag. A removed record carries no usable profile data.
    #[serde(default)]
    pub is_removed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Fields the feed returned that the job does not interpret.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, Value>,
}

impl ChangeRecord {
    /// A live (non-removed) record with profile data.
    pub fn user(id: impl Into<UserId>, mail: &str, display_name: &str) -> Self {
        Self {
            id: id.into(),
            is_removed: false,
            mail: Some(mail.to_owned()),
            display_name: Some(display_name.to_owned()),
            additional: BTreeMap::new(),
        }
    }

    /// A tombstone for `id`.
    pub fn removed(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            is_removed: true,
            mail: None,
            display_name: None,
            additional: BTreeMap::new(),
        }
    }

    /// Invitation recipient for this record, if it has a mail address.
    pub fn recipient(&self) -> Option<Recipient> {
        let email = self.mail.as_deref().map(str::trim).filter(|m| !m.is_empty())?;
        Some(Recipient {
            email: email.to_owned(),
            display_name: self
                .display_name
                .clone()
                .unwrap_or_else(|| email.to_owned()),
        })
    }
}

/// A license entitlement held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlanAssignment {
    pub service_plan_id: ServicePlanId,
    /// Provisioning status reported by the directory (e.g. `Success`).
    pub status: String,
}

impl ServicePlanAssignment {
    pub fn new(service_plan_id: ServicePlanId, status: &str) -> Self {
        Self {
            service_plan_id,
            status: status.to_owned(),
        }
    }
}

/// An invitation attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
