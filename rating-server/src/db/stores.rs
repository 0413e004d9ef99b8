//! Store Repository

use super::filter::{FilterBuilder, ListParams, RATER_STORE_SORT_COLUMNS, STORE_SORT_COLUMNS, Sort};
use super::{RepoError, RepoResult};
use shared::models::{OwnedStore, Store, StoreListItem, StoreWithUserRating};
use sqlx::SqlitePool;

const STORE_COLUMNS: &str = "id, name, email, address, owner_id, created_at, updated_at";

const STORE_LIST_SELECT: &str = "SELECT s.id, s.name, s.email, s.address, s.owner_id, \
     CAST(COALESCE(AVG(r.rating), 0) AS REAL) AS rating, \
     COUNT(r.id) AS total_ratings \
     FROM stores s \
     LEFT JOIN ratings r ON r.store_id = s.id";

/// One pass over the join: the mean excludes the caller, the max picks the
/// caller's own value (at most one row per user and store).
const RATER_STORE_SELECT: &str = "SELECT s.id, s.name, s.address, \
     CAST(COALESCE(AVG(CASE WHEN r.user_id <> ? THEN r.rating END), 0) AS REAL) AS overall_rating, \
     MAX(CASE WHEN r.user_id = ? THEN r.rating END) AS user_rating \
     FROM stores s \
     LEFT JOIN ratings r ON r.store_id = s.id";

#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_id: Option<i64>,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Store>> {
    let sql = format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = ?");
    let row = sqlx::query_as::<_, Store>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn exists(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM stores WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> RepoResult<bool> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM stores WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn find_by_owner(pool: &SqlitePool, owner_id: i64) -> RepoResult<Option<Store>> {
    let sql = format!("SELECT {STORE_COLUMNS} FROM stores WHERE owner_id = ? ORDER BY id LIMIT 1");
    let row = sqlx::query_as::<_, Store>(&sql)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a store.
///
/// Unique violations come back as `Duplicate("owner")` when the owner already
/// holds a store and `Duplicate("email")` otherwise.
pub async fn create(pool: &SqlitePool, data: NewStore) -> RepoResult<Store> {
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO stores (name, email, address, owner_id, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING {STORE_COLUMNS}"
    );
    let store = sqlx::query_as::<_, Store>(&sql)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.address)
        .bind(data.owner_id)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    let what = if db_err.message().contains("owner_id") {
                        "owner"
                    } else {
                        "email"
                    };
                    return RepoError::Duplicate(what.to_owned());
                }
                if db_err.is_foreign_key_violation() {
                    return RepoError::InvalidReference("owner".to_owned());
                }
            }
            RepoError::Database(e)
        })?;
    Ok(store)
}

/// Delete a store together with its ratings
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM stores WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Admin listing: every store with its overall mean and rating count
pub async fn list(pool: &SqlitePool, params: &ListParams) -> RepoResult<Vec<StoreListItem>> {
    let mut filter = FilterBuilder::new();
    filter
        .like("s.name", params.name.as_deref())
        .like("s.email", params.email.as_deref())
        .like("s.address", params.address.as_deref());
    let sort = Sort::resolve(
        STORE_SORT_COLUMNS,
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
    );

    let sql = format!(
        "{STORE_LIST_SELECT}{} GROUP BY s.id{}",
        filter.build_where_clause(),
        sort.order_by("s.id")
    );
    let rows = filter
        .apply_bindings(sqlx::query_as::<_, StoreListItem>(&sql))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Caller-relative listing: everyone else's mean next to the caller's own rating
pub async fn list_for_rater(
    pool: &SqlitePool,
    user_id: i64,
    params: &ListParams,
) -> RepoResult<Vec<StoreWithUserRating>> {
    let mut filter = FilterBuilder::new();
    filter
        .like("s.name", params.name.as_deref())
        .like("s.address", params.address.as_deref());
    let sort = Sort::resolve(
        RATER_STORE_SORT_COLUMNS,
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
    );

    let sql = format!(
        "{RATER_STORE_SELECT}{} GROUP BY s.id{}",
        filter.build_where_clause(),
        sort.order_by("s.id")
    );
    // select-list placeholders come before the WHERE ones
    let query = sqlx::query_as::<_, StoreWithUserRating>(&sql)
        .bind(user_id)
        .bind(user_id);
    let rows = filter.apply_bindings(query).fetch_all(pool).await?;
    Ok(rows)
}

/// The owner's store with its rollup
pub async fn find_owned(pool: &SqlitePool, owner_id: i64) -> RepoResult<Option<OwnedStore>> {
    let row = sqlx::query_as::<_, OwnedStore>(
        "SELECT s.id, s.name, s.email, s.address, \
         CAST(COALESCE(AVG(r.rating), 0) AS REAL) AS average_rating, \
         COUNT(r.id) AS total_ratings \
         FROM stores s \
         LEFT JOIN ratings r ON r.store_id = s.id \
         WHERE s.owner_id = ? \
         GROUP BY s.id \
         ORDER BY s.id LIMIT 1",
    )
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
