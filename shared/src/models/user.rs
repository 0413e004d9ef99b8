//! User Model

use super::{Average, Role};
use serde::{Deserialize, Serialize};

/// User row. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub address: String,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Identity returned next to an issued token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Profile of the calling user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    pub created_at: i64,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            address: user.address,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Admin listing row
///
/// `rating` is only populated for store owners (mean over their store's
/// ratings); it is `null` for admins and regular users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserListItem {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    pub rating: Option<Average>,
}
