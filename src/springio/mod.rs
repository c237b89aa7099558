//! Spring project and release calendar APIs.
//!
//! - [`client`]: HTTP adapter for `api.spring.io` and `calendar.spring.io`
//! - [`envelope`]: HAL `_embedded` unwrapping
//! - [`model`]: release, generation and calendar records
//! - [`calendar`]: date windows for calendar queries
//! - [`error`]: error taxonomy shared by all tools

pub mod calendar;
pub mod client;
pub mod envelope;
pub mod error;
pub mod model;

pub use calendar::CalendarWindow;
pub use client::{SpringIoClient, Upstream};
pub use envelope::{EnvelopeError, HalEnvelope};
pub use error::{SpringIoError, SpringIoResult};
pub use model::{Generation, Release, UpcomingRelease};
