//! # provision-renderer
//!
//! Tera-based rendering of the orientation invitation sent to newly enrolled
//! users: a one-line subject and an HTML body.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use provision_core::Recipient;
//! use provision_renderer::{InvitationContext, InvitationRenderer};
//!
//! fn render(recipients: &[Recipient]) {
//!     let Ok(renderer) = InvitationRenderer::new() else { return };
//!     let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
//!     let ctx = InvitationContext::new(
//!         recipients,
//!         day.and_hms_opt(9, 0, 0).unwrap(),
//!         day.and_hms_opt(18, 0, 0).unwrap(),
//!         "Tokyo Standard Time",
//!     );
//!     if let Ok(rendered) = renderer.render(&ctx) {
//!         println!("{}", rendered.subject);
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::InvitationContext;
pub use engine::{InvitationRenderer, RenderedInvitation};
pub use error::RenderError;
