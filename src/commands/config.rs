//! Configuration display command.

use anyhow::Result;

use crate::config::Config;

/// Prints the effective configuration as JSON with every push key masked.
pub fn show() -> Result<()> {
    let config = Config::load()?;
    println!("{}", serde_json::to_string_pretty(&masked(config))?);
    Ok(())
}

/// Copy of `config` that is safe to print.
pub fn masked(mut config: Config) -> Config {
    for target in &mut config.targets {
        target.push_key = target.masked_key();
    }
    config
}
