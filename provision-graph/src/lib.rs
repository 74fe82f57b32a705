//! # provision-graph
//!
//! Blocking HTTP adapters behind the `provision-sync` ports, plus the
//! [`execute`] entrypoint that wires them to a run.
//!
//! | Port              | Adapter           |
//! |-------------------|-------------------|
//! | `ChangeFeed`      | [`GraphDirectory`]|
//! | `EntitlementSource` | [`GraphDirectory`] |
//! | `GroupMembership` | [`GraphGroups`]   |
//! | `Calendar`        | [`GraphCalendar`] |
//! | `BlobStore`       | [`HttpBlobStore`] (or the local `FileBlobStore`) |

pub mod auth;
pub mod blob;
pub mod calendar;
pub mod client;
pub mod directory;
mod dto;
pub mod error;
pub mod groups;
pub mod job;

pub use blob::HttpBlobStore;
pub use calendar::GraphCalendar;
pub use client::{build_agent, AccessToken, GraphClient};
pub use directory::GraphDirectory;
pub use error::JobError;
pub use groups::GraphGroups;
pub use job::{execute, execute_with, log_failure, open_cursor_store, ConfiguredCursorStore};
