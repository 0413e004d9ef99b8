//! Dashboard rollups

use super::RepoResult;
use shared::models::{AdminDashboard, OwnerDashboard, RatingEntry, RatingSummary};
use sqlx::SqlitePool;

pub async fn admin_dashboard(pool: &SqlitePool) -> RepoResult<AdminDashboard> {
    let row = sqlx::query_as::<_, AdminDashboard>(
        "SELECT (SELECT COUNT(*) FROM users) AS total_users, \
         (SELECT COUNT(*) FROM stores) AS total_stores, \
         (SELECT COUNT(*) FROM ratings) AS total_ratings",
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Rollup for the store held by `owner_id`.
///
/// Summary and rater list are read in one transaction so the count always
/// matches the list. An owner without a store gets an empty dashboard.
pub async fn owner_dashboard(pool: &SqlitePool, owner_id: i64) -> RepoResult<OwnerDashboard> {
    let mut tx = pool.begin().await?;

    let store: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM stores WHERE owner_id = ? ORDER BY id LIMIT 1")
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some((store_id,)) = store else {
        tx.commit().await?;
        return Ok(OwnerDashboard::default());
    };

    let summary = sqlx::query_as::<_, RatingSummary>(
        "SELECT CAST(COALESCE(AVG(rating), 0) AS REAL) AS average_rating, \
         COUNT(*) AS total_ratings \
         FROM ratings WHERE store_id = ?",
    )
    .bind(store_id)
    .fetch_one(&mut *tx)
    .await?;

    let rating_users = sqlx::query_as::<_, RatingEntry>(
        "SELECT u.name, u.email, r.rating, r.created_at, r.updated_at \
         FROM ratings r \
         JOIN users u ON u.id = r.user_id \
         WHERE r.store_id = ? \
         ORDER BY r.created_at DESC, r.id DESC",
    )
    .bind(store_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(OwnerDashboard {
        average_rating: summary.average_rating,
        total_ratings: summary.total_ratings,
        rating_users,
    })
}
