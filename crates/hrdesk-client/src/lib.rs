//! HR Desk Client - keeping views in step with the portal
//!
//! The portal never pushes. Every open view (ticket list, admin queue,
//! notification bell) polls for the complete list in its scope and
//! rebuilds what it shows from scratch.
//!
//! - [`PortalApi`]: the portal for one signed-in actor, in process
//!   ([`LocalPortalApi`]) or over REST ([`HttpPortalApi`])
//! - [`MutationClient`]: local validation, version-checked transitions,
//!   retry of idempotent writes only
//! - [`PollingSynchronizer`]: one single-flight loop per view
//! - [`ViewScope`] / [`Navigator`]: view lifecycle and cancellation

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod http;
pub mod local;
pub mod poller;
pub mod retry;
pub mod scope;
pub mod sources;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, PortalApi};
pub use config::{SyncConfig, ViewKind, MAX_POLL_PERIOD, MIN_POLL_PERIOD};
pub use http::HttpPortalApi;
pub use local::LocalPortalApi;
pub use poller::{PollingSynchronizer, ViewHandle, ViewState};
pub use retry::{retry_transient, MutationClient};
pub use scope::{Navigator, ViewScope};
pub use sources::{NotificationSource, SnapshotSource, TicketListSource, TicketScope};
pub use view::{rebuild, NotificationView, TicketFilter, TicketSort, TicketView, ViewSpec};
