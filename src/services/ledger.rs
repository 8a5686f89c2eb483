use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

use super::feedback::{delete_feedback, FeedbackLedger};
use super::swipes::{delete_swipe, SwipeLedger};
use crate::config::DatabaseSettings;
use crate::error::MatchError;
use crate::models::RemovedMatch;

/// Fixed-width UTC format so that text ordering equals time ordering
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store holding the swipe and feedback ledgers
///
/// Every write is a committed statement (or transaction) by the time the
/// call returns; there is no write-back buffering. Reads share a pool while
/// writes go through a single-connection pool, so concurrent writers queue
/// on acquire instead of racing for the database lock.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    pool: SqlitePool,
    writer: SqlitePool,
}

impl LedgerStore {
    /// Connect to a SQLite database, creating the file if it is missing
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, MatchError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(acquire_timeout)
            .connect_with(options.clone())
            .await?;

        sqlx::migrate!("./migrations").run(&writer).await?;

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        Ok(Self { pool, writer })
    }

    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, MatchError> {
        tracing::info!("Opening ledger database at {}", settings.url);

        Self::new(
            &settings.url,
            settings.max_connections,
            settings.min_connections,
            Duration::from_secs(settings.acquire_timeout_secs),
        )
        .await
    }

    /// Private in-memory database, used by tests and demos
    ///
    /// Each SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, MatchError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            writer: pool.clone(),
            pool,
        })
    }

    pub fn swipes(&self) -> SwipeLedger {
        SwipeLedger::new(self.pool.clone(), self.writer.clone())
    }

    pub fn feedback(&self) -> FeedbackLedger {
        FeedbackLedger::new(self.pool.clone(), self.writer.clone())
    }

    /// Remove the swipe and every feedback note for a pair, atomically
    pub async fn remove_match(
        &self,
        user_id: &str,
        target_id: &str,
    ) -> Result<RemovedMatch, MatchError> {
        let mut tx = self.writer.begin().await?;

        let swipes = delete_swipe(&mut *tx, user_id, target_id).await?;
        let feedback = delete_feedback(&mut *tx, user_id, target_id).await?;

        tx.commit().await?;

        tracing::info!(
            "Removed match {} -> {} ({} swipe, {} feedback entries)",
            user_id,
            target_id,
            swipes,
            feedback
        );

        Ok(RemovedMatch {
            swipe_removed: swipes > 0,
            feedback_removed: feedback,
        })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, MatchError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Current time at the precision the ledgers store
pub(crate) fn ledger_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| sqlx::Error::Decode(format!("bad timestamp `{}`: {}", raw, e).into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SwipeDirection;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format_round_trips_and_sorts() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();
        let later = earlier + chrono::Duration::microseconds(1500);

        let a = format_timestamp(earlier);
        let b = format_timestamp(later);

        assert_eq!(a, "2024-03-09T08:05:01.000000Z");
        assert!(a < b);
        assert_eq!(parse_timestamp(&b).unwrap(), later);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_remove_match_cascades() {
        let store = LedgerStore::in_memory().await.unwrap();
        let swipes = store.swipes();
        let feedback = store.feedback();

        swipes.record_swipe("u1", "u2", SwipeDirection::Right).await.unwrap();
        swipes.record_swipe("u1", "u3", SwipeDirection::Right).await.unwrap();
        feedback.append_feedback("u1", "u2", "Great first date").await.unwrap();
        feedback.append_feedback("u1", "u2", "Second date was fun").await.unwrap();
        feedback.append_feedback("u1", "u3", "Nice chat").await.unwrap();

        let removed = store.remove_match("u1", "u2").await.unwrap();

        assert_eq!(
            removed,
            RemovedMatch {
                swipe_removed: true,
                feedback_removed: 2
            }
        );
        assert_eq!(swipes.list_liked("u1").await.unwrap(), vec!["u3".to_string()]);
        assert!(feedback.last_feedback_date("u1", "u2").await.unwrap().is_none());
        assert!(feedback.last_feedback_date("u1", "u3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_missing_match_is_noop() {
        let store = LedgerStore::in_memory().await.unwrap();

        let removed = store.remove_match("u1", "nobody").await.unwrap();

        assert!(!removed.swipe_removed);
        assert_eq!(removed.feedback_removed, 0);
        assert!(store.health_check().await.unwrap());
    }

    async fn file_store(dir: &tempfile::TempDir) -> LedgerStore {
        let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
        LedgerStore::new(&url, 5, 1, Duration::from_secs(30)).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir).await;

        let mut handles = Vec::new();
        for i in 0..40 {
            let swipes = store.swipes();
            let feedback = store.feedback();
            handles.push(tokio::spawn(async move {
                swipes
                    .record_swipe("u1", &format!("c{}", i), SwipeDirection::Right)
                    .await?;
                swipes
                    .record_swipe(&format!("u{}", i + 100), "u1", SwipeDirection::Left)
                    .await?;
                feedback.append_feedback("u1", "c0", &format!("note {}", i)).await?;
                Ok::<_, MatchError>(())
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let liked = store.swipes().list_liked("u1").await.unwrap();
        assert_eq!(liked.len(), 40);
        let stats = store.swipes().swipe_stats("u1").await.unwrap();
        assert_eq!(stats.total, 40);

        let notes = store
            .feedback()
            .list_feedback("u1", "c0", crate::models::SortOrder::Ascending)
            .await
            .unwrap();
        assert_eq!(notes.len(), 40);
        assert!(notes.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = file_store(&dir).await;
            store.swipes().record_swipe("u1", "u2", SwipeDirection::Right).await.unwrap();
        }

        let store = file_store(&dir).await;
        assert_eq!(store.swipes().list_liked("u1").await.unwrap(), vec!["u2".to_string()]);
    }
}
