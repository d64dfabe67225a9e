//! Tapedeck - Deterministic HTTP record-replay layer for test sessions
//!
//! Records a test process's outbound HTTP traffic once, then replays it
//! byte-for-byte without touching the live network.

#![deny(unsafe_code)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod matcher;
pub mod record;
pub mod server;
pub mod storage;
pub mod transport;

pub use config::{Config, Mode};
pub use error::{Result, TapedeckError};
pub use matcher::{DefaultMatcher, HttpRequest, Matcher};
pub use record::{AssetNameRegistry, HttpResponse, RecordEntry, RecordStore};
pub use server::MockServer;
pub use transport::{HttpTransport, Transport};
