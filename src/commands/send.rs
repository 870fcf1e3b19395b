//! Push send command.
//!
//! Loads the configured targets, builds the services once, and runs a single
//! logical send through the [`Dispatcher`].
//!
//! # Examples
//!
//! ```bash
//! barkcast send --title Alert --body "Disk full"
//! barkcast send --title Alert --body "Disk full" --target phone --encrypt
//! ```

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::error::DispatchError;
use crate::history::HistoryStore;
use crate::message::Message;
use crate::target::Target;
use crate::transport::BarkClient;

/// Options for one send beyond the message itself.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Explicit target names. Empty means "use the selected targets".
    pub targets: Vec<String>,
    /// Overrides the configured encryption setting when set.
    pub encrypt: Option<bool>,
}

/// Picks the fan-out set: the named targets if any were given, otherwise
/// the targets marked as selected.
///
/// An empty result is passed through so the dispatcher can reject it.
pub fn resolve_targets(config: &Config, names: &[String]) -> Result<Vec<Target>> {
    if names.is_empty() {
        Ok(config.selected_targets())
    } else {
        config.targets_named(names)
    }
}

/// Sends `message` and prints the outcome.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, a named target
/// does not exist, or every target fails.
pub async fn run(message: Message, options: SendOptions) -> Result<()> {
    let config = Config::load()?;
    let targets = resolve_targets(&config, &options.targets)?;
    let encrypt = options.encrypt.unwrap_or(config.encryption_enabled);

    let transport = Arc::new(BarkClient::new()?);
    let history = Arc::new(HistoryStore::in_dir(&Config::config_dir()?));
    let dispatcher = Dispatcher::new(transport, history);

    let summary = dispatcher.dispatch(&message, &targets, encrypt).await?;
    println!("{}", describe(&summary));
    if let Some(err) = &summary.last_error {
        eprintln!("warning: not every target accepted the push; last error: {err}");
    }
    Ok(())
}

/// One-line description of a successful send.
pub fn describe(summary: &DispatchSummary) -> String {
    let mut line = format!("Sent to {} target(s)", summary.attempted);
    if !summary.history_recorded {
        line.push_str(" (history not recorded)");
    }
    line
}

/// Maps a dispatch failure to the exit code the CLI uses for it.
pub fn exit_code(err: &DispatchError) -> i32 {
    if err.is_usage_error() {
        2
    } else {
        1
    }
}
