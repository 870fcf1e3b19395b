//! barkcast - push notification fan-out for Bark-compatible servers.
//!
//! This crate composes a push message, optionally seals its title and body
//! with AES-256-GCM, and sends it to every selected target concurrently.
//! History is recorded once per logical send, on the first target that
//! accepts it.
//!
//! # Architecture
//!
//! - **Payload** - Builds the ordered query parameters for one target
//! - **Crypto** - Derives the key and produces the `data` envelope
//! - **Transport** - Issues the GET request and classifies the response
//! - **Dispatch** - Fans out, aggregates outcomes, records history once
//! - **History / Config** - JSON-file stores in the config directory
//!
//! # Modules
//!
//! - [`dispatch`] - Multi-target coordinator
//! - [`transport`] - HTTP client (`reqwest`)
//! - [`config`] - Configuration loading/saving

// Library modules
pub mod commands;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod history;
pub mod message;
pub mod payload;
pub mod target;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{DispatchOutcome, DispatchSummary, Dispatcher};
pub use error::DispatchError;
pub use history::{HistoryRecord, HistoryRecorder, HistoryStore};
pub use message::{Message, NotificationLevel};
pub use target::Target;
pub use transport::{BarkClient, Transport};
