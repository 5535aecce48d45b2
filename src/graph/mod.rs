//! Microsoft Graph client: request executor plus the Outlook email and
//! calendar operations built on top of it.
//!
//! The executor owns transport concerns: bearer auth, response
//! classification, bounded exponential-backoff retry. The mail and
//! calendar operations build Graph-shaped payloads from typed arguments
//! and delegate to it.

mod calendar;
mod client;
mod error;
mod mail;

pub use calendar::{AvailabilityQuery, MeetingRequest};
pub use client::{GraphClient, BASE_URL};
pub use error::GraphError;
pub use mail::{DraftMessage, Importance, SearchQuery, SendMail};
