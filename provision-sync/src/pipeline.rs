//! Reconciliation run — the single entrypoint used by the CLI and the daemon.
//!
//! ```text
//! Init → LoadingCursor → Paginating → Finalizing → Done
//!              └────────────┴─────────────┴──→ Failed
//! ```
//!
//! The cursor is written only from `Finalizing`, after every page was walked
//! and the invitation (if any) was sent. Any failure before that leaves the
//! previous cursor in place so the next run replays the same changes.

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;

use provision_core::{ChangeRecord, GroupId, UserId};

use crate::cursor_store::{fingerprint, CursorStore};
use crate::eligibility::{EligibilityPolicy, EntitlementSource};
use crate::enrollment::{enroll_all, GroupMembership};
use crate::error::SyncError;
use crate::feed::{ChangeFeed, PageWalker};
use crate::notifier::{Calendar, Notifier};
use crate::report::{RunReport, SyncMode};

/// Where a run is (or was when it failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    LoadingCursor,
    Paginating,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Init => "init",
            RunState::LoadingCursor => "loading_cursor",
            RunState::Paginating => "paginating",
            RunState::Finalizing => "finalizing",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A run that ended in `Failed`.
#[derive(Debug, Error)]
#[error("run failed while {state}: {error}")]
pub struct RunFailure {
    /// State the run was in when the error surfaced.
    pub state: RunState,
    #[source]
    pub error: SyncError,
}

/// External systems a run talks to.
pub struct Collaborators<'a> {
    pub cursor_store: &'a dyn CursorStore,
    pub feed: &'a dyn ChangeFeed,
    pub entitlements: &'a dyn EntitlementSource,
    pub membership: &'a dyn GroupMembership,
    pub calendar: &'a dyn Calendar,
}

/// Immutable inputs of one run.
pub struct RunContext<'a> {
    pub group: &'a GroupId,
    pub policy: &'a EligibilityPolicy,
    pub notifier: &'a Notifier,
    /// Run start; decides the invitation date.
    pub now: DateTime<Utc>,
}

/// Candidates in feed order, one entry per user.
#[derive(Default)]
struct CandidateBatch {
    records: Vec<ChangeRecord>,
    ids: HashSet<UserId>,
}

impl CandidateBatch {
    fn contains(&self, id: &UserId) -> bool {
        self.ids.contains(id)
    }

    fn push(&mut self, record: ChangeRecord) {
        if self.ids.insert(record.id.clone()) {
            self.records.push(record);
        }
    }

    fn remove(&mut self, id: &UserId) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.records.retain(|r| &r.id != id);
        true
    }
}

struct Run<'r, 'a> {
    ctx: &'r RunContext<'a>,
    io: &'r Collaborators<'a>,
    state: RunState,
}

impl Run<'_, '_> {
    fn enter(&mut self, state: RunState) {
        tracing::debug!(from = %self.state, to = %state, "run state");
        self.state = state;
    }

    fn fail(&self, error: SyncError) -> RunFailure {
        RunFailure {
            state: self.state,
            error,
        }
    }

    fn execute(&mut self) -> Result<RunReport, RunFailure> {
        let started = Instant::now();

        self.enter(RunState::LoadingCursor);
        let previous = self
            .io
            .cursor_store
            .load()
            .map_err(|e| self.fail(SyncError::CursorLoad(e)))?;
        let mode = match &previous {
            Some(cursor) => {
                tracing::info!(cursor = %fingerprint(cursor), "resuming from saved cursor");
                SyncMode::Incremental
            }
            None => {
                tracing::info!("no saved cursor, starting full sync");
                SyncMode::Full
            }
        };
        let mut report = RunReport::new(self.ctx.now, mode);

        self.enter(RunState::Paginating);
        let mut batch = CandidateBatch::default();
        let mut walker = PageWalker::new(self.io.feed, previous);
        while let Some(page) = walker.next() {
            let records = page.map_err(|source| {
                self.fail(SyncError::Feed {
                    page: walker.pages(),
                    source,
                })
            })?;
            tracing::debug!(page = walker.pages(), records = records.len(), "page fetched");
            for record in records {
                self.consider(record, &mut batch, &mut report);
            }
        }
        report.pages = walker.pages();
        let next_cursor = walker.into_final_cursor();

        self.enter(RunState::Finalizing);
        report.candidates = batch.records.iter().map(|r| r.id.clone()).collect();
        report.enrollment = enroll_all(self.io.membership, self.ctx.group, &batch.records);
        report.invited = self
            .ctx
            .notifier
            .notify(self.io.calendar, &batch.records, self.ctx.now)
            .map_err(|e| self.fail(e))?;

        match next_cursor {
            Some(cursor) => {
                self.io
                    .cursor_store
                    .save(&cursor)
                    .map_err(|e| self.fail(SyncError::CursorSave(e)))?;
                let fp = fingerprint(&cursor);
                tracing::info!(cursor = %fp, "cursor saved");
                report.cursor_fingerprint = Some(fp);
            }
            None => tracing::warn!("feed ended without a cursor, previous cursor kept"),
        }

        self.enter(RunState::Done);
        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(report)
    }

    /// Classify one record into the batch. Never fails the run.
    fn consider(&self, record: ChangeRecord, batch: &mut CandidateBatch, report: &mut RunReport) {
        report.records_seen += 1;

        if record.is_removed {
            report.tombstones += 1;
            if batch.remove(&record.id) {
                tracing::debug!(user = %record.id, "removed later in the feed, dropped from batch");
            }
            return;
        }
        if batch.contains(&record.id) {
            return;
        }

        let entitlements = match self.io.entitlements.entitlements(&record.id) {
            Ok(entitlements) => entitlements,
            Err(err) => {
                report.lookup_failures += 1;
                if err.is_permission() {
                    tracing::warn!(user = %record.id, error = %err, "entitlement lookup denied, record skipped");
                } else {
                    tracing::info!(
                        user = %record.id,
                        error = %err,
                        transient = err.is_transient(),
                        "entitlement lookup failed, record skipped"
                    );
                }
                return;
            }
        };

        if self.ctx.policy.is_eligible(&record, &entitlements) {
            tracing::debug!(user = %record.id, "eligible");
            batch.push(record);
        } else {
            report.ineligible += 1;
        }
    }
}

/// Execute one reconciliation run.
pub fn run(ctx: &RunContext<'_>, io: &Collaborators<'_>) -> Result<RunReport, RunFailure> {
    let mut run = Run {
        ctx,
        io,
        state: RunState::Init,
    };
    match run.execute() {
        Ok(report) => {
            tracing::info!(
                mode = %report.mode,
                pages = report.pages,
                candidates = report.candidates.len(),
                enrolled = report.enrollment.enrolled(),
                enroll_failures = report.enrollment.failed(),
                permission_failures = report.enrollment.permission_failures(),
                invited = report.invited,
                "run complete"
            );
            Ok(report)
        }
        Err(failure) => {
            run.enter(RunState::Failed);
            Err(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_keeps_first_occurrence() {
        let mut batch = CandidateBatch::default();
        batch.push(ChangeRecord::user("u1", "first@example.com", "First"));
        batch.push(ChangeRecord::user("u1", "second@example.com", "Second"));
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].mail.as_deref(), Some("first@example.com"));
    }

    #[test]
    fn batch_remove_is_noop_for_unknown_ids() {
        let mut batch = CandidateBatch::default();
        batch.push(ChangeRecord::user("u1", "a@example.com", "A"));
        assert!(!batch.remove(&UserId::from("u2")));
        assert!(batch.remove(&UserId::from("u1")));
        assert!(batch.records.is_empty());
    }

    #[test]
    fn state_labels() {
        assert_eq!(RunState::LoadingCursor.to_string(), "loading_cursor");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }
}
