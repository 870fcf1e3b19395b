//! History commands.

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::config::Config;
use crate::history::{HistoryRecord, HistoryStore};

fn store() -> Result<HistoryStore> {
    Ok(HistoryStore::in_dir(&Config::config_dir()?))
}

/// Prints up to `limit` records, newest first.
pub fn list(limit: Option<usize>) -> Result<()> {
    let records = store()?.list()?;
    if records.is_empty() {
        println!("No history yet.");
        return Ok(());
    }
    for record in records.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{}", format_record(record));
    }
    Ok(())
}

/// One listing line for a record.
pub fn format_record(record: &HistoryRecord) -> String {
    format!(
        "{}  {}  {}: {}  -> {}",
        record.id,
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.title,
        record.content.replace('\n', " "),
        record.target_names.join(", ")
    )
}

/// Deletes one record by id.
pub fn delete(id: &str) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("'{id}' is not a valid record id"))?;
    if store()?.delete(id)? {
        println!("Deleted {id}");
    } else {
        anyhow::bail!("No history record with id {id}");
    }
    Ok(())
}

/// Deletes every record.
pub fn clear() -> Result<()> {
    let removed = store()?.clear()?;
    println!("Cleared {removed} record(s)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn test_format_record_flattens_newlines() {
        let record = HistoryRecord::new(
            &Message::new("Alert", "Disk\nfull"),
            &["phone".to_string(), "ipad".to_string()],
        );
        let line = format_record(&record);
        assert!(line.contains("Alert: Disk full"));
        assert!(line.ends_with("-> phone, ipad"));
    }
}
