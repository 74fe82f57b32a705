//! Run report — what one completed run did.

use chrono::{DateTime, Utc};
use serde::Serialize;

use provision_core::UserId;

use crate::enrollment::EnrollmentReport;

/// Whether the run walked the whole directory or only changes since a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Full,
    Incremental,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Full => f.write_str("full"),
            SyncMode::Incremental => f.write_str("incremental"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub mode: SyncMode,
    pub pages: usize,
    pub records_seen: usize,
    pub tombstones: usize,
    /// Records skipped because their entitlements could not be fetched.
    pub lookup_failures: usize,
    pub ineligible: usize,
    pub candidates: Vec<UserId>,
    pub enrollment: EnrollmentReport,
    /// Attendees of the invitation; `0` when none was sent.
    pub invited: usize,
    /// Fingerprint of the cursor persisted by this run, if any.
    pub cursor_fingerprint: Option<String>,
    pub duration_ms: u64,
}

impl RunReport {
    pub(crate) fn new(started_at: DateTime<Utc>, mode: SyncMode) -> Self {
        Self {
            started_at,
            mode,
            pages: 0,
            records_seen: 0,
            tombstones: 0,
            lookup_failures: 0,
            ineligible: 0,
            candidates: Vec::new(),
            enrollment: EnrollmentReport::default(),
            invited: 0,
            cursor_fingerprint: None,
            duration_ms: 0,
        }
    }

    pub fn cursor_saved(&self) -> bool {
        self.cursor_fingerprint.is_some()
    }

    /// `(label, value)` rows for tabular display.
    pub fn summary_rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", self.mode.to_string()),
            ("pages", self.pages.to_string()),
            ("records", self.records_seen.to_string()),
            ("tombstones", self.tombstones.to_string()),
            ("lookup failures", self.lookup_failures.to_string()),
            ("ineligible", self.ineligible.to_string()),
            ("candidates", self.candidates.len().to_string()),
            ("enrolled", self.enrollment.enrolled().to_string()),
            ("already member", self.enrollment.already_member().to_string()),
            (
                "enroll failures",
                format!(
                    "{} ({} permission)",
                    self.enrollment.failed(),
                    self.enrollment.permission_failures()
                ),
            ),
            ("invited", self.invited.to_string()),
            (
                "cursor",
                self.cursor_fingerprint
                    .clone()
                    .unwrap_or_else(|| "unchanged".to_string()),
            ),
            ("duration", format!("{} ms", self.duration_ms)),
        ]
    }
}
