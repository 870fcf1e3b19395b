//! CLI subcommand implementations for barkcast.
//!
//! Commands are organized into submodules by domain:
//!
//! - [`send`] - Compose and dispatch a push
//! - [`targets`] - Manage configured delivery targets
//! - [`history`] - Inspect and prune delivery history
//! - [`decrypt`] - Open an encrypted `data` value
//! - [`config`] - Show the effective configuration
//!
//! # Usage
//!
//! Commands are invoked from the main CLI dispatcher:
//!
//! ```ignore
//! use barkcast::commands;
//!
//! commands::targets::list()?;
//! commands::send_message(message, SendOptions::default()).await?;
//! commands::history::clear()?;
//! ```

pub mod config;
pub mod decrypt;
pub mod history;
pub mod send;
pub mod targets;

// Re-export commonly used functions for convenience
#[doc(inline)]
pub use send::{resolve_targets, run as send_message, SendOptions};
