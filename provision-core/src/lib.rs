//! Provision core library — domain types, settings loading, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and delta-feed records
//! - [`error`] — [`ConfigError`]
//! - [`config`] — [`Settings`] load / validate

pub mod config;
pub mod error;
pub mod types;

pub use config::{Settings, StorageLocation};
pub use error::ConfigError;
pub use types::{
    ChangeRecord, Cursor, GroupId, Recipient, ServicePlanAssignment, ServicePlanId, UserId,
};
