//! `playlist-core`: provisioning engine for publishing a playlist.
//!
//! A run authenticates once, makes sure a media file and a screen are
//! available, replaces any playlist with the configured name by a fresh one,
//! attaches the file and the screen, sets a schedule, adds a URL item,
//! publishes, and finally reads the proof-of-play overview.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator      ← sequencing, fatal/best-effort classification
//!     │
//!     ├── locator   ← fail-open name lookup over listing endpoints
//!     ├── asset     ← reuse-or-upload of the media file
//!     ├── reconcile ← detach-then-delete of an existing playlist
//!     └── pipeline  ← create + best-effort steps
//!     │
//!     ▼
//! Session<Transport> ← HttpTransport (reqwest) in production
//! ```
//!
//! Repeated runs converge: the backend is re-queried every time, so no local
//! state is kept between runs.

pub mod asset;
pub mod config;
pub mod error;
pub mod http;
pub mod locator;
pub mod orchestrator;
pub mod pipeline;
pub mod reconcile;
pub mod routes;
pub mod schedule;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigWarning, Credential, WarnLevel};
pub use error::{AcquireError, ConfigError, FatalError, Result, ScheduleError, TransportError};
pub use http::HttpTransport;
pub use orchestrator::{ExitStatus, Orchestrator, RunOutcome, RunReport};
pub use pipeline::{Step, StepOutcome, StepRecord};
pub use transport::{Session, SessionToken, Transport};
