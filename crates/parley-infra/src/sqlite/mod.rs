//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod conversation;
pub mod message;
pub mod pool;
pub mod token;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};
use parley_types::error::RepositoryError;

/// Fixed-width RFC 3339 (microseconds, `Z`), so text order equals time order.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn query_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(err.to_string())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use parley_core::repository::user::UserRepository;
    use parley_types::user::{User, UserId};
    use tempfile::TempDir;

    use super::pool::DatabasePool;
    use super::user::SqliteUserRepository;

    /// Fresh migrated database. The directory is removed when the returned
    /// `TempDir` drops, so keep it alive for the duration of the test.
    pub async fn test_pool() -> (DatabasePool, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (pool, dir)
    }

    pub async fn insert_user(pool: &DatabasePool, username: &str) -> User {
        let user = User {
            id: UserId::new(),
            name: format!("{username} name"),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        SqliteUserRepository::new(pool.clone())
            .create(&user, "$argon2id$test")
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_datetime_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let fractional = Utc.timestamp_opt(whole.timestamp(), 120_000).unwrap();
        assert_eq!(format_datetime(&whole), "2024-01-02T03:04:05.000000Z");
        assert_eq!(format_datetime(&fractional), "2024-01-02T03:04:05.000120Z");
        assert!(format_datetime(&whole) < format_datetime(&fractional));
    }

    #[test]
    fn test_parse_datetime_round_trips() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
        assert_eq!(parse_datetime(&format_datetime(&ts)).unwrap(), ts);
        assert!(parse_datetime("yesterday").is_err());
    }
}
