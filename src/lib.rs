//! Kio workspace bridge
//!
//! The process side of the Kio code editor: it owns the filesystem, persists
//! user settings and the recent-files list, and supervises live directory
//! watches whose events are pushed to the editor UI.
//!
//! The UI talks to a single [`bridge::Bridge`] through typed
//! [`bridge::Request`]s and receives [`events::BridgeEvent`]s back through an
//! [`events::EventSink`].

pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod files;
pub mod watch;

pub use bridge::{serve, Bridge, Payload, Request, Response};
pub use error::{Error, Result};
pub use events::{BridgeEvent, EventSink};
