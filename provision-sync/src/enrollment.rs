//! Enrollment — idempotent "ensure membership" against the target group.
//!
//! Each candidate is attempted once per run, independently. Failures become
//! entries in an [`EnrollmentReport`]; they never abort the batch and are not
//! retried within the run.

use serde::Serialize;

use provision_core::{ChangeRecord, GroupId, UserId};

use crate::error::RemoteError;

/// Result of one `add member` call against the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddMemberOutcome {
    Added,
    AlreadyMember,
}

/// Group membership API.
#[cfg_attr(test, mockall::automock)]
pub trait GroupMembership {
    fn add_member(&self, group: &GroupId, user: &UserId) -> Result<AddMemberOutcome, RemoteError>;
}

/// Ensure `user` is a member of `group`. "Already a member" is success.
pub fn ensure_member(
    membership: &dyn GroupMembership,
    group: &GroupId,
    user: &UserId,
) -> Result<AddMemberOutcome, RemoteError> {
    membership.add_member(group, user)
}

/// Per-candidate enrollment outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EnrollmentOutcome {
    Enrolled,
    AlreadyMember,
    Failed { error: String, permission: bool },
}

/// Aggregate of one run's enrollment attempts, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrollmentReport {
    pub entries: Vec<(UserId, EnrollmentOutcome)>,
}

impl EnrollmentReport {
    pub fn enrolled(&self) -> usize {
        self.count(|o| matches!(o, EnrollmentOutcome::Enrolled))
    }

    pub fn already_member(&self) -> usize {
        self.count(|o| matches!(o, EnrollmentOutcome::AlreadyMember))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EnrollmentOutcome::Failed { .. }))
    }

    /// Failures caused by missing permissions; these repeat every run until
    /// the app registration is fixed.
    pub fn permission_failures(&self) -> usize {
        self.count(|o| matches!(o, EnrollmentOutcome::Failed { permission: true, .. }))
    }

    fn count(&self, f: impl Fn(&EnrollmentOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| f(o)).count()
    }
}

/// Attempt enrollment for every candidate, best-effort.
pub fn enroll_all(
    membership: &dyn GroupMembership,
    group: &GroupId,
    candidates: &[ChangeRecord],
) -> EnrollmentReport {
    let mut report = EnrollmentReport::default();
    for candidate in candidates {
        let outcome = match ensure_member(membership, group, &candidate.id) {
            Ok(AddMemberOutcome::Added) => {
                tracing::info!(user = %candidate.id, group = %group, "enrolled user");
                EnrollmentOutcome::Enrolled
            }
            Ok(AddMemberOutcome::AlreadyMember) => {
                tracing::debug!(user = %candidate.id, group = %group, "user already a member");
                EnrollmentOutcome::AlreadyMember
            }
            Err(err) if err.is_permission() => {
                tracing::warn!(
                    user = %candidate.id,
                    group = %group,
                    error = %err,
                    "enrollment denied; check the application's group permissions",
                );
                EnrollmentOutcome::Failed {
                    error: err.to_string(),
                    permission: true,
                }
            }
            Err(err) => {
                tracing::info!(
                    user = %candidate.id,
                    group = %group,
                    error = %err,
                    transient = err.is_transient(),
                    "enrollment failed, skipping"
                );
                EnrollmentOutcome::Failed {
                    error: err.to_string(),
                    permission: false,
                }
            }
        };
        report.entries.push((candidate.id.clone(), outcome));
    }
    report
}
