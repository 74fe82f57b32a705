//! # provision-sync
//!
//! Incremental reconciliation of a directory against a target group.
//!
//! Call [`run`] with a [`RunContext`] and the run's [`Collaborators`]: it
//! loads the saved cursor, walks the change feed, filters eligible users,
//! enrolls them, sends one batched invitation and persists the new cursor.
//! Every external system sits behind a trait so the algorithm can be driven
//! by in-memory fakes.

pub mod cursor_store;
pub mod eligibility;
pub mod enrollment;
pub mod error;
pub mod feed;
pub mod notifier;
pub mod pipeline;
pub mod report;

pub use cursor_store::{fingerprint, BlobCursorStore, BlobStore, CursorDocument, CursorStore, FileBlobStore};
pub use eligibility::{EligibilityPolicy, EntitlementSource};
pub use enrollment::{AddMemberOutcome, EnrollmentOutcome, EnrollmentReport, GroupMembership};
pub use error::{RemoteError, StoreError, SyncError};
pub use feed::{ChangeFeed, Continuation, FeedPage, PageWalker};
pub use notifier::{Calendar, Invitation, InvitationSchedule, Notifier};
pub use pipeline::{run, Collaborators, RunContext, RunFailure, RunState};
pub use report::{RunReport, SyncMode};
