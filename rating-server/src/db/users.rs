//! User Repository

use super::filter::{FilterBuilder, ListParams, Sort, USER_SORT_COLUMNS};
use super::{RepoResult, constraint_error};
use shared::models::{Role, User, UserListItem};
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, name, email, password_hash, address, role, created_at, updated_at";

/// Store owners carry the mean over their store's ratings; other roles get NULL.
const USER_LIST_SELECT: &str = "SELECT u.id, u.name, u.email, u.address, u.role, \
     CASE WHEN u.role = 'store_owner' THEN CAST(COALESCE(AVG(r.rating), 0) AS REAL) END AS rating \
     FROM users u \
     LEFT JOIN stores s ON s.owner_id = u.id \
     LEFT JOIN ratings r ON r.store_id = s.id";

/// Insert payload; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub role: Role,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> RepoResult<bool> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Insert a user. A concurrent insert of the same email surfaces as `Duplicate`.
pub async fn create(pool: &SqlitePool, data: NewUser) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO users (name, email, password_hash, address, role, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.address)
        .bind(data.role)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| constraint_error(e, "email"))?;
    Ok(user)
}

pub async fn update_password(pool: &SqlitePool, id: i64, password_hash: &str) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Delete a user. Their ratings cascade; stores they owned lose their owner.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Admin listing with substring filters and an allow-listed sort
pub async fn list(
    pool: &SqlitePool,
    params: &ListParams,
    role: Option<Role>,
) -> RepoResult<Vec<UserListItem>> {
    let mut filter = FilterBuilder::new();
    filter
        .like("u.name", params.name.as_deref())
        .like("u.email", params.email.as_deref())
        .like("u.address", params.address.as_deref());
    if let Some(role) = role {
        filter.exact("u.role", role.as_str());
    }
    let sort = Sort::resolve(
        USER_SORT_COLUMNS,
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
    );

    let sql = format!(
        "{USER_LIST_SELECT}{} GROUP BY u.id{}",
        filter.build_where_clause(),
        sort.order_by("u.id")
    );
    let rows = filter
        .apply_bindings(sqlx::query_as::<_, UserListItem>(&sql))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_list_item(pool: &SqlitePool, id: i64) -> RepoResult<Option<UserListItem>> {
    let sql = format!("{USER_LIST_SELECT} WHERE u.id = ? GROUP BY u.id");
    let row = sqlx::query_as::<_, UserListItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
