//! Rating Ledger
//!
//! One row per (user, store), enforced by the table's unique constraint.
//! Resubmission overwrites the value in place.

use super::{RepoError, RepoResult, constraint_error};
use shared::models::Rating;
use sqlx::SqlitePool;

const RATING_COLUMNS: &str = "id, user_id, store_id, rating, created_at, updated_at";

/// Outcome of a submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Created(Rating),
    Updated(Rating),
}

impl Submission {
    pub fn rating(&self) -> &Rating {
        match self {
            Submission::Created(r) | Submission::Updated(r) => r,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Submission::Created(_))
    }
}

pub async fn find(pool: &SqlitePool, user_id: i64, store_id: i64) -> RepoResult<Option<Rating>> {
    let sql = format!("SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = ? AND store_id = ?");
    let row = sqlx::query_as::<_, Rating>(&sql)
        .bind(user_id)
        .bind(store_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Record `value` for (user, store).
///
/// The insert only succeeds for the first submission; any later or racing
/// one hits the unique constraint and falls through to the update, so the
/// pair keeps exactly one row and exactly one caller sees `Created`.
pub async fn upsert(
    pool: &SqlitePool,
    user_id: i64,
    store_id: i64,
    value: i64,
) -> RepoResult<Submission> {
    let now = shared::util::now_millis();

    let insert = format!(
        "INSERT INTO ratings (user_id, store_id, rating, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?4) \
         ON CONFLICT (user_id, store_id) DO NOTHING \
         RETURNING {RATING_COLUMNS}"
    );
    let inserted = sqlx::query_as::<_, Rating>(&insert)
        .bind(user_id)
        .bind(store_id)
        .bind(value)
        .bind(now)
        .fetch_optional(pool)
        .await
        .map_err(|e| constraint_error(e, "store"))?;
    if let Some(rating) = inserted {
        return Ok(Submission::Created(rating));
    }

    let update = format!(
        "UPDATE ratings SET rating = ?1, updated_at = ?2 \
         WHERE user_id = ?3 AND store_id = ?4 \
         RETURNING {RATING_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, Rating>(&update)
        .bind(value)
        .bind(now)
        .bind(user_id)
        .bind(store_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| constraint_error(e, "store"))?;

    // the conflicting row went away in between: its store or user was deleted
    updated
        .map(Submission::Updated)
        .ok_or_else(|| RepoError::InvalidReference("store".to_owned()))
}
