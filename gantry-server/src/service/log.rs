//! Log Service
//!
//! Business logic for run log management.

use gantry_core::domain::log::LogEntry;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::log_repository;

const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Service error type
#[derive(Debug)]
pub enum LogError {
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for LogError {
    fn from(err: sqlx::Error) -> Self {
        LogError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, LogError>;

/// Store the captured log entries of a run
pub async fn add_log_entries(pool: &PgPool, run_id: Uuid, entries: Vec<LogEntry>) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let count = entries.len();
    log_repository::add_entries(pool, run_id, prepare_entries(entries)).await?;

    tracing::debug!("Added {} log entries for run: {}", count, run_id);

    Ok(())
}

/// Get all log entries for a run
pub async fn get_run_logs(pool: &PgPool, run_id: Uuid) -> Result<Vec<LogEntry>> {
    let logs = log_repository::find_by_run(pool, run_id).await?;

    Ok(logs)
}

/// Truncates oversized messages (scanner reports can be large)
fn prepare_entries(entries: Vec<LogEntry>) -> Vec<LogEntry> {
    entries
        .into_iter()
        .map(|mut entry| {
            if entry.message.len() > MAX_MESSAGE_LENGTH {
                let mut end = MAX_MESSAGE_LENGTH;
                while !entry.message.is_char_boundary(end) {
                    end -= 1;
                }
                entry.message.truncate(end);
                entry.message.push_str(" [truncated]");
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::domain::log::LogLevel;

    #[test]
    fn test_short_messages_are_kept() {
        let entries = prepare_entries(vec![LogEntry::new(LogLevel::Info, None, "hello")]);
        assert_eq!(entries[0].message, "hello");
    }

    #[test]
    fn test_long_messages_are_truncated_on_char_boundary() {
        let message = "é".repeat(MAX_MESSAGE_LENGTH);
        let entries = prepare_entries(vec![LogEntry::new(LogLevel::Info, None, message)]);

        let truncated = &entries[0].message;
        assert!(truncated.ends_with(" [truncated]"));
        assert!(truncated.len() <= MAX_MESSAGE_LENGTH + " [truncated]".len());
    }
}
