use chrono::{DateTime, Utc};
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use super::ledger::{format_timestamp, ledger_now, parse_timestamp};
use crate::error::MatchError;
use crate::models::{FeedbackEntry, SortOrder};

/// Append-only history of feedback notes per (user, target)
#[derive(Debug, Clone)]
pub struct FeedbackLedger {
    pool: SqlitePool,
    writer: SqlitePool,
}

impl FeedbackLedger {
    pub fn new(pool: SqlitePool, writer: SqlitePool) -> Self {
        Self { pool, writer }
    }

    /// Append a feedback note
    ///
    /// The timestamp is never earlier than the pair's previous entry, so
    /// creation order always matches insertion order.
    pub async fn append_feedback(
        &self,
        user_id: &str,
        target_id: &str,
        transcript: &str,
    ) -> Result<FeedbackEntry, MatchError> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(MatchError::EmptyTranscript);
        }

        let mut tx = self.writer.begin().await?;

        let previous: Option<String> = sqlx::query_scalar(
            "SELECT MAX(created_at) FROM feedback WHERE user_id = ? AND target_user_id = ?",
        )
        .bind(user_id)
        .bind(target_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut created_at = ledger_now();
        if let Some(previous) = previous.as_deref().map(parse_timestamp).transpose()? {
            created_at = created_at.max(previous);
        }

        let query = r#"
            INSERT INTO feedback (user_id, target_user_id, transcript, created_at)
            VALUES (?, ?, ?, ?)
        "#;

        let id = sqlx::query(query)
            .bind(user_id)
            .bind(target_id)
            .bind(transcript)
            .bind(format_timestamp(created_at))
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        tx.commit().await?;

        tracing::debug!("Stored feedback #{} for {} -> {}", id, user_id, target_id);

        Ok(FeedbackEntry {
            id,
            user_id: user_id.to_string(),
            target_id: target_id.to_string(),
            transcript: transcript.to_string(),
            created_at,
        })
    }

    /// All entries for a pair in the requested creation order
    pub async fn list_feedback(
        &self,
        user_id: &str,
        target_id: &str,
        order: SortOrder,
    ) -> Result<Vec<FeedbackEntry>, MatchError> {
        let query = format!(
            r#"
            SELECT id, user_id, target_user_id, transcript, created_at
            FROM feedback
            WHERE user_id = ? AND target_user_id = ?
            ORDER BY created_at {order}, id {order}
            "#,
            order = order.as_sql()
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(target_id)
            .fetch_all(&self.pool)
            .await?;

        let entries: Result<Vec<FeedbackEntry>, sqlx::Error> = rows
            .iter()
            .map(|row| {
                let created_at: String = row.try_get("created_at")?;
                Ok(FeedbackEntry {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    target_id: row.try_get("target_user_id")?,
                    transcript: row.try_get("transcript")?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect();

        Ok(entries?)
    }

    /// Timestamp of the newest entry for a pair
    pub async fn last_feedback_date(
        &self,
        user_id: &str,
        target_id: &str,
    ) -> Result<Option<DateTime<Utc>>, MatchError> {
        let latest: Option<String> = sqlx::query_scalar(
            "SELECT MAX(created_at) FROM feedback WHERE user_id = ? AND target_user_id = ?",
        )
        .bind(user_id)
        .bind(target_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(latest.as_deref().map(parse_timestamp).transpose()?)
    }

    /// Delete every entry for a pair; returns the number of rows removed
    pub async fn delete_all_feedback(&self, user_id: &str, target_id: &str) -> Result<u64, MatchError> {
        let removed = delete_feedback(&self.writer, user_id, target_id).await?;

        tracing::info!("Cleared {} feedback entries for {} -> {}", removed, user_id, target_id);

        Ok(removed)
    }
}

pub(crate) async fn delete_feedback<'e, E>(
    executor: E,
    user_id: &str,
    target_id: &str,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM feedback WHERE user_id = ? AND target_user_id = ?")
        .bind(user_id)
        .bind(target_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LedgerStore;

    async fn ledger() -> FeedbackLedger {
        LedgerStore::in_memory().await.unwrap().feedback()
    }

    #[tokio::test]
    async fn test_append_keeps_every_entry() {
        let feedback = ledger().await;

        let first = feedback.append_feedback("u1", "u2", "  Coffee went well ").await.unwrap();
        let second = feedback.append_feedback("u1", "u2", "Coffee went well").await.unwrap();

        assert_eq!(first.transcript, "Coffee went well");
        assert_ne!(first.id, second.id);
        assert!(second.created_at >= first.created_at);

        let entries = feedback.list_feedback("u1", "u2", SortOrder::Ascending).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], first);
        assert_eq!(entries[1], second);
    }

    #[tokio::test]
    async fn test_empty_transcript_is_rejected() {
        let feedback = ledger().await;

        let err = feedback.append_feedback("u1", "u2", "   \n").await.unwrap_err();

        assert!(matches!(err, MatchError::EmptyTranscript));
        assert!(feedback.list_feedback("u1", "u2", SortOrder::Ascending).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_both_ways() {
        let feedback = ledger().await;

        for note in ["first", "second", "third"] {
            feedback.append_feedback("u1", "u2", note).await.unwrap();
        }
        feedback.append_feedback("u1", "u9", "unrelated").await.unwrap();

        let ascending: Vec<String> = feedback
            .list_feedback("u1", "u2", SortOrder::Ascending)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.transcript)
            .collect();
        let descending: Vec<String> = feedback
            .list_feedback("u1", "u2", SortOrder::Descending)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.transcript)
            .collect();

        assert_eq!(ascending, vec!["first", "second", "third"]);
        assert_eq!(descending, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_last_feedback_date() {
        let feedback = ledger().await;

        assert!(feedback.last_feedback_date("u1", "u2").await.unwrap().is_none());

        feedback.append_feedback("u1", "u2", "Met at the park").await.unwrap();
        let latest = feedback.append_feedback("u1", "u2", "Dinner next week").await.unwrap();

        assert_eq!(
            feedback.last_feedback_date("u1", "u2").await.unwrap(),
            Some(latest.created_at)
        );
    }

    #[tokio::test]
    async fn test_delete_all_feedback() {
        let feedback = ledger().await;

        feedback.append_feedback("u1", "u2", "one").await.unwrap();
        feedback.append_feedback("u1", "u2", "two").await.unwrap();

        assert_eq!(feedback.delete_all_feedback("u1", "u2").await.unwrap(), 2);
        assert_eq!(feedback.delete_all_feedback("u1", "u2").await.unwrap(), 0);
        assert!(feedback.last_feedback_date("u1", "u2").await.unwrap().is_none());
    }
}
