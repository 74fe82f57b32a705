//! Template context — serializable rendering payload for one invitation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use provision_core::Recipient;

use crate::error::RenderError;

/// Rendering payload exposed to the subject and body templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationContext {
    pub recipients: Vec<RecipientCtx>,
    pub recipient_count: usize,
    pub event: EventCtx,
    pub meta: MetaCtx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientCtx {
    pub email: String,
    pub display_name: String,
}

/// When the event takes place, pre-formatted for templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCtx {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub provision_version: String,
}

impl InvitationContext {
    /// Build a context for `recipients` attending from `start` to `end`.
    pub fn new(
        recipients: &[Recipient],
        start: NaiveDateTime,
        end: NaiveDateTime,
        time_zone: &str,
    ) -> Self {
        let recipients: Vec<RecipientCtx> = recipients
            .iter()
            .map(|r| RecipientCtx {
                email: r.email.clone(),
                display_name: r.display_name.clone(),
            })
            .collect();

        InvitationContext {
            recipient_count: recipients.len(),
            recipients,
            event: EventCtx {
                date: start.format("%Y-%m-%d").to_string(),
                start_time: start.format("%H:%M").to_string(),
                end_time: end.format("%H:%M").to_string(),
                time_zone: time_zone.to_owned(),
            },
            meta: MetaCtx {
                provision_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
