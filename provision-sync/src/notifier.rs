//! Notifier — one batched orientation invitation per run.
//!
//! The invitation covers every candidate of the run that has a mail address.
//! Its window is computed from the run start: `days_ahead` days later, from
//! `start_hour` to `end_hour` local time in the configured UTC offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Utc};

use provision_core::{ChangeRecord, Recipient, Settings, UserId};
use provision_renderer::{InvitationContext, InvitationRenderer};

use crate::error::{RemoteError, SyncError};

/// A rendered invitation ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub attendees: Vec<Recipient>,
    pub subject: String,
    pub body_html: String,
    /// Local wall-clock start in `time_zone`.
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub time_zone: String,
}

/// Calendar API used to create the event on the organizer's calendar.
#[cfg_attr(test, mockall::automock)]
pub trait Calendar {
    fn send_invitation(&self, organizer: &UserId, invitation: &Invitation) -> Result<(), RemoteError>;
}

/// When the orientation event takes place relative to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationSchedule {
    pub days_ahead: i64,
    pub start_hour: i64,
    pub end_hour: i64,
    /// Label sent with the event, e.g. `Tokyo Standard Time`.
    pub time_zone: String,
    /// Offset used to decide which calendar day the run falls on.
    pub utc_offset: FixedOffset,
}

impl InvitationSchedule {
    pub fn new(time_zone: impl Into<String>, utc_offset: FixedOffset) -> Self {
        Self {
            days_ahead: 2,
            start_hour: 9,
            end_hour: 18,
            time_zone: time_zone.into(),
            utc_offset,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.event_time_zone.clone(), settings.event_utc_offset)
    }

    /// `(start, end)` of the event for a run started at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (NaiveDateTime, NaiveDateTime) {
        let day = now.with_timezone(&self.utc_offset).date_naive() + Duration::days(self.days_ahead);
        let midnight = day.and_time(NaiveTime::default());
        (
            midnight + Duration::hours(self.start_hour),
            midnight + Duration::hours(self.end_hour),
        )
    }
}

/// Builds and sends the run's invitation.
pub struct Notifier {
    organizer: UserId,
    schedule: InvitationSchedule,
    renderer: InvitationRenderer,
}

impl Notifier {
    pub fn new(organizer: UserId, schedule: InvitationSchedule, renderer: InvitationRenderer) -> Self {
        Self {
            organizer,
            schedule,
            renderer,
        }
    }

    pub fn organizer(&self) -> &UserId {
        &self.organizer
    }

    /// Render the invitation for `candidates`, or `None` when nobody can be
    /// invited.
    pub fn prepare(
        &self,
        candidates: &[ChangeRecord],
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, SyncError> {
        let attendees: Vec<Recipient> = candidates
            .iter()
            .filter_map(|candidate| {
                let recipient = candidate.recipient();
                if recipient.is_none() {
                    tracing::warn!(user = %candidate.id, "candidate has no mail address, not invited");
                }
                recipient
            })
            .collect();
        if attendees.is_empty() {
            return Ok(None);
        }

        let (start, end) = self.schedule.window(now);
        let ctx = InvitationContext::new(&attendees, start, end, &self.schedule.time_zone);
        let rendered = self.renderer.render(&ctx)?;

        Ok(Some(Invitation {
            attendees,
            subject: rendered.subject,
            body_html: rendered.body_html,
            start,
            end,
            time_zone: self.schedule.time_zone.clone(),
        }))
    }

    /// Send at most one invitation. Returns the number of recipients, `0`
    /// when no call was made.
    pub fn notify(
        &self,
        calendar: &dyn Calendar,
        candidates: &[ChangeRecord],
        now: DateTime<Utc>,
    ) -> Result<usize, SyncError> {
        let Some(invitation) = self.prepare(candidates, now)? else {
            return Ok(0);
        };
        let recipients = invitation.attendees.len();
        calendar
            .send_invitation(&self.organizer, &invitation)
            .map_err(|source| SyncError::Notify { recipients, source })?;
        tracing::info!(
            recipients,
            start = %invitation.start,
            time_zone = %invitation.time_zone,
            "invitation sent"
        );
        Ok(recipients)
    }
}
