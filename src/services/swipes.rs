use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use std::collections::HashSet;

use super::ledger::{format_timestamp, ledger_now, parse_timestamp};
use crate::error::MatchError;
use crate::models::{SwipeDirection, SwipeRecord};

/// Durable record of one swipe decision per (user, candidate)
#[derive(Debug, Clone)]
pub struct SwipeLedger {
    pool: SqlitePool,
    writer: SqlitePool,
}

impl SwipeLedger {
    pub fn new(pool: SqlitePool, writer: SqlitePool) -> Self {
        Self { pool, writer }
    }

    /// Record a swipe, replacing any earlier decision for the same pair
    ///
    /// Uses INSERT ... ON CONFLICT so a re-swipe overwrites the direction and
    /// timestamp instead of failing or duplicating.
    pub async fn record_swipe(
        &self,
        user_id: &str,
        candidate_id: &str,
        direction: SwipeDirection,
    ) -> Result<SwipeRecord, MatchError> {
        require_id("user_id", user_id)?;
        require_id("candidate_id", candidate_id)?;

        let mut tx = self.writer.begin().await?;

        // A re-swipe keeps its old row id, so recency must come from the
        // timestamp alone: keep it strictly after the user's latest swipe.
        let latest: Option<String> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM swipes WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let mut created_at = ledger_now();
        if let Some(latest) = latest.as_deref().map(parse_timestamp).transpose()? {
            if created_at <= latest {
                created_at = latest + chrono::Duration::microseconds(1);
            }
        }

        let query = r#"
            INSERT INTO swipes (user_id, swiped_user_id, direction, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, swiped_user_id)
            DO UPDATE SET
                direction = excluded.direction,
                created_at = excluded.created_at
        "#;

        sqlx::query(query)
            .bind(user_id)
            .bind(candidate_id)
            .bind(direction.as_str())
            .bind(format_timestamp(created_at))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Recorded swipe: {} -> {} ({})", user_id, candidate_id, direction);

        Ok(SwipeRecord {
            user_id: user_id.to_string(),
            candidate_id: candidate_id.to_string(),
            direction,
            created_at,
        })
    }

    pub async fn get_swipe(
        &self,
        user_id: &str,
        candidate_id: &str,
    ) -> Result<Option<SwipeRecord>, MatchError> {
        let query = r#"
            SELECT user_id, swiped_user_id, direction, created_at
            FROM swipes
            WHERE user_id = ? AND swiped_user_id = ?
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let direction: String = row.try_get("direction")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Some(SwipeRecord {
            user_id: row.try_get("user_id")?,
            candidate_id: row.try_get("swiped_user_id")?,
            direction: direction
                .parse()
                .map_err(|_| sqlx::Error::Decode(format!("bad direction `{}`", direction).into()))?,
            created_at: parse_timestamp(&created_at)?,
        }))
    }

    /// Every candidate the user has swiped on, in either direction
    pub async fn list_swiped(&self, user_id: &str) -> Result<HashSet<String>, MatchError> {
        let query = r#"
            SELECT swiped_user_id
            FROM swipes
            WHERE user_id = ?
        "#;

        let ids: Vec<String> = sqlx::query_scalar(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("User {} has swiped {} profiles", user_id, ids.len());

        Ok(ids.into_iter().collect())
    }

    /// Right-swiped candidates, most recent first
    pub async fn list_liked(&self, user_id: &str) -> Result<Vec<String>, MatchError> {
        let query = r#"
            SELECT swiped_user_id
            FROM swipes
            WHERE user_id = ? AND direction = 'right'
            ORDER BY created_at DESC, id DESC
        "#;

        let ids = sqlx::query_scalar(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    /// Delete a swipe; deleting a missing record is not an error
    ///
    /// Returns whether a record was removed.
    pub async fn remove_swipe(&self, user_id: &str, candidate_id: &str) -> Result<bool, MatchError> {
        let removed = delete_swipe(&self.writer, user_id, candidate_id).await?;

        tracing::debug!("Removed swipe {} -> {} (existed: {})", user_id, candidate_id, removed > 0);

        Ok(removed > 0)
    }

    /// Get statistics about a user's swipes
    pub async fn swipe_stats(&self, user_id: &str) -> Result<SwipeStats, MatchError> {
        let query = r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN direction = 'right' THEN 1 ELSE 0 END), 0) AS liked,
                COALESCE(SUM(CASE WHEN direction = 'left' THEN 1 ELSE 0 END), 0) AS passed,
                MAX(created_at) AS last_swiped_at
            FROM swipes
            WHERE user_id = ?
        "#;

        let row = sqlx::query(query).bind(user_id).fetch_one(&self.pool).await?;

        let last_swiped_at: Option<String> = row.try_get("last_swiped_at")?;

        Ok(SwipeStats {
            user_id: user_id.to_string(),
            total: row.try_get("total")?,
            liked: row.try_get("liked")?,
            passed: row.try_get("passed")?,
            last_swiped_at: last_swiped_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

/// Statistics about a user's swipes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwipeStats {
    pub user_id: String,
    pub total: i64,
    pub liked: i64,
    pub passed: i64,
    pub last_swiped_at: Option<DateTime<Utc>>,
}

pub(crate) async fn delete_swipe<'e, E>(
    executor: E,
    user_id: &str,
    candidate_id: &str,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM swipes WHERE user_id = ? AND swiped_user_id = ?")
        .bind(user_id)
        .bind(candidate_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

fn require_id(field: &str, value: &str) -> Result<(), MatchError> {
    if value.trim().is_empty() {
        return Err(MatchError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}
