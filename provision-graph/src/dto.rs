//! Wire DTOs for the directory, calendar and token endpoints.
//!
//! Responses are decoded into these transport types first and mapped into
//! domain records in one pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use provision_core::{ChangeRecord, Cursor, Recipient, ServicePlanAssignment, ServicePlanId, UserId};
use provision_sync::{FeedPage, Invitation};

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponseDto {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) expires_in: Option<u64>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ErrorEnvelopeDto {
    error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyDto {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Token endpoint errors use a flat shape.
#[derive(Debug, Deserialize)]
struct OAuthErrorDto {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

const MAX_RAW_MESSAGE: usize = 300;

/// Best-effort human message from an error response body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelopeDto>(body) {
        let ErrorBodyDto { code, message } = envelope.error;
        return match (code, message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => String::new(),
        };
    }
    if let Ok(oauth) = serde_json::from_str::<OAuthErrorDto>(body) {
        return match oauth.error_description {
            Some(description) => format!("{}: {}", oauth.error, first_line(&description)),
            None => oauth.error,
        };
    }
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_RAW_MESSAGE) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_owned(),
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or(s).trim()
}

// ---------------------------------------------------------------------------
// Delta feed
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct DeltaPageDto {
    #[serde(default)]
    value: Vec<DeltaUserDto>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
    #[serde(rename = "@odata.deltaLink", default)]
    delta_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeltaUserDto {
    id: String,
    #[serde(default)]
    mail: Option<String>,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "@removed", default)]
    removed: Option<Value>,
    #[serde(flatten)]
    additional: BTreeMap<String, Value>,
}

impl DeltaPageDto {
    pub(crate) fn into_feed_page(self) -> FeedPage {
        let records = self.value.into_iter().map(DeltaUserDto::into_record).collect();
        match self.next_link {
            Some(link) => FeedPage::next(records, link),
            None => FeedPage::last(records, self.delta_link.map(Cursor::new)),
        }
    }
}

impl DeltaUserDto {
    fn into_record(self) -> ChangeRecord {
        if self.removed.is_some() {
            return ChangeRecord::removed(self.id);
        }
        ChangeRecord {
            id: UserId::from(self.id),
            is_removed: false,
            mail: self.mail,
            display_name: self.display_name,
            additional: self.additional,
        }
    }
}

// ---------------------------------------------------------------------------
// License details
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct LicenseDetailsPageDto {
    #[serde(default)]
    value: Vec<LicenseDetailDto>,
    #[serde(rename = "@odata.nextLink", default)]
    pub(crate) next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LicenseDetailDto {
    #[serde(rename = "servicePlans", default)]
    service_plans: Vec<ServicePlanInfoDto>,
}

#[derive(Debug, Deserialize)]
struct ServicePlanInfoDto {
    #[serde(rename = "servicePlanId")]
    service_plan_id: Uuid,
    #[serde(rename = "provisioningStatus", default)]
    provisioning_status: Option<String>,
}

impl LicenseDetailsPageDto {
    /// Flatten every license's service plans, in response order.
    pub(crate) fn drain_assignments(&mut self, into: &mut Vec<ServicePlanAssignment>) {
        for detail in self.value.drain(..) {
            into.extend(detail.service_plans.into_iter().map(|plan| ServicePlanAssignment {
                service_plan_id: ServicePlanId::from(plan.service_plan_id),
                status: plan.provisioning_status.unwrap_or_default(),
            }));
        }
    }
}

// ---------------------------------------------------------------------------
// Group membership
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct DirectoryObjectRefDto {
    #[serde(rename = "@odata.id")]
    pub(crate) odata_id: String,
}

// ---------------------------------------------------------------------------
// Calendar event
// ---------------------------------------------------------------------------

/// Wall-clock format expected by `dateTimeTimeZone`.
pub(crate) const EVENT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventDto {
    subject: String,
    body: ItemBodyDto,
    start: DateTimeTimeZoneDto,
    end: DateTimeTimeZoneDto,
    attendees: Vec<AttendeeDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBodyDto {
    content_type: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DateTimeTimeZoneDto {
    date_time: String,
    time_zone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttendeeDto {
    email_address: EmailAddressDto,
    #[serde(rename = "type")]
    attendee_type: &'static str,
}

#[derive(Debug, Serialize)]
struct EmailAddressDto {
    address: String,
    name: String,
}

impl EventDto {
    pub(crate) fn from_invitation(invitation: &Invitation) -> Self {
        let at = |when: &chrono::NaiveDateTime| DateTimeTimeZoneDto {
            date_time: when.format(EVENT_DATETIME_FORMAT).to_string(),
            time_zone: invitation.time_zone.clone(),
        };
        EventDto {
            subject: invitation.subject.clone(),
            body: ItemBodyDto {
                content_type: "HTML",
                content: invitation.body_html.clone(),
            },
            start: at(&invitation.start),
            end: at(&invitation.end),
            attendees: invitation.attendees.iter().map(AttendeeDto::required).collect(),
        }
    }
}

impl AttendeeDto {
    fn required(recipient: &Recipient) -> Self {
        AttendeeDto {
            email_address: EmailAddressDto {
                address: recipient.email.clone(),
                name: recipient.display_name.clone(),
            },
            attendee_type: "required",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use provision_sync::Continuation;

    #[test]
    fn delta_page_with_next_link() {
        let body = r#"{
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users(id,mail,displayName)",
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/users/delta?$skiptoken=abc",
            "value": [
                {"id": "u1", "mail": "u1@example.com", "displayName": "Ada", "jobTitle": "Engineer"},
                {"id": "u2", "@removed": {"reason": "changed"}}
            ]
        }"#;
        let page = serde_json::from_str::<DeltaPageDto>(body).unwrap().into_feed_page();

        assert_eq!(
            page.continuation,
            Continuation::Next("https://graph.microsoft.com/v1.0/users/delta?$skiptoken=abc".into())
        );
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].mail.as_deref(), Some("u1@example.com"));
        assert_eq!(page.records[0].additional["jobTitle"], "Engineer");
        assert!(page.records[1].is_removed);
        assert!(page.records[1].mail.is_none());
    }

    #[test]
    fn terminal_page_carries_delta_link() {
        let body = r#"{
            "@odata.deltaLink": "https://graph.microsoft.com/v1.0/users/delta?$deltatoken=T2",
            "value": []
        }"#;
        let page = serde_json::from_str::<DeltaPageDto>(body).unwrap().into_feed_page();
        assert!(page.records.is_empty());
        assert_eq!(
            page.continuation,
            Continuation::End {
                cursor: Some(Cursor::new("https://graph.microsoft.com/v1.0/users/delta?$deltatoken=T2"))
            }
        );
    }

    #[test]
    fn license_details_are_flattened() {
        let body = r#"{
            "value": [
                {"skuId": "s1", "servicePlans": [
                    {"servicePlanId": "57ff2da0-773e-42df-b2af-ffb7a2317929", "servicePlanName": "TEAMS1", "provisioningStatus": "Success"}
                ]},
                {"skuId": "s2", "servicePlans": [
                    {"servicePlanId": "9aaf7827-d63c-4b61-89c3-182f06f82e5c", "provisioningStatus": "PendingInput"}
                ]}
            ]
        }"#;
        let mut page: LicenseDetailsPageDto = serde_json::from_str(body).unwrap();
        let mut plans = Vec::new();
        page.drain_assignments(&mut plans);

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].service_plan_id, ServicePlanId::TEAMS);
        assert_eq!(plans[1].service_plan_id, ServicePlanId::EXCHANGE_STANDARD);
        assert_eq!(plans[1].status, "PendingInput");
        assert!(page.next_link.is_none());
    }

    #[test]
    fn event_payload_shape() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let invitation = Invitation {
            attendees: vec![Recipient {
                email: "u1@example.com".into(),
                display_name: "Ada".into(),
            }],
            subject: "Orientation".into(),
            body_html: "<p>Welcome</p>".into(),
            start: day.and_hms_opt(9, 0, 0).unwrap(),
            end: day.and_hms_opt(18, 0, 0).unwrap(),
            time_zone: "Tokyo Standard Time".into(),
        };
        let json = serde_json::to_value(EventDto::from_invitation(&invitation)).unwrap();

        assert_eq!(json["body"]["contentType"], "HTML");
        assert_eq!(json["start"]["dateTime"], "2026-10-19T09:00:00");
        assert_eq!(json["end"]["dateTime"], "2026-10-19T18:00:00");
        assert_eq!(json["end"]["timeZone"], "Tokyo Standard Time");
        assert_eq!(json["attendees"][0]["type"], "required");
        assert_eq!(json["attendees"][0]["emailAddress"]["address"], "u1@example.com");
    }

    #[test]
    fn oauth_error_message() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret.\r\nTrace ID: x"}"#;
        assert_eq!(error_message(body), "invalid_client: AADSTS7000215: Invalid client secret.");
    }

    #[test]
    fn raw_bodies_are_truncated() {
        let long = "x".repeat(1000);
        let msg = error_message(&long);
        assert!(msg.chars().count() <= MAX_RAW_MESSAGE + 1);
    }
}
