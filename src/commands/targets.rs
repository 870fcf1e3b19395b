//! Target management commands.
//!
//! # Examples
//!
//! ```bash
//! barkcast targets add phone --key XXXXXXXX --select
//! barkcast targets add ipad --key YYYYYYYY --server https://push.example.com
//! barkcast targets select ipad
//! barkcast targets list
//! ```

use anyhow::Result;

use crate::config::Config;
use crate::target::Target;

/// Prints every configured target with its key masked.
pub fn list() -> Result<()> {
    let config = Config::load()?;
    if config.targets.is_empty() {
        println!("No targets configured. Add one with `barkcast targets add`.");
        return Ok(());
    }
    for target in &config.targets {
        println!("{}", format_target(target));
    }
    Ok(())
}

/// One listing line: selection marker, name, masked key, server.
pub fn format_target(target: &Target) -> String {
    format!(
        "[{}] {}  key={}  server={}",
        if target.selected { "x" } else { " " },
        target.name,
        target.masked_key(),
        target.server_url
    )
}

/// Adds a target; `server` defaults to the configured default server.
pub fn add(name: &str, push_key: &str, server: Option<&str>, select: bool) -> Result<()> {
    let mut config = Config::load()?;
    let server_url = server.map_or_else(|| config.default_server_url.clone(), str::to_string);
    let mut target = Target::new(name, push_key, server_url);
    target.selected = select;

    config.add_target(target)?;
    config.save()?;
    log::info!("Added target '{}'", name);
    println!("Added target '{name}'");
    Ok(())
}

/// Removes a target by name.
pub fn remove(name: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.remove_target(name)?;
    config.save()?;
    println!("Removed target '{name}'");
    Ok(())
}

/// Marks the named targets as selected (or deselected).
pub fn select(names: &[String], selected: bool) -> Result<()> {
    let mut config = Config::load()?;
    for name in names {
        config.set_selected(name, selected)?;
    }
    config.save()?;
    println!(
        "{} {} target(s)",
        if selected { "Selected" } else { "Deselected" },
        names.len()
    );
    Ok(())
}
