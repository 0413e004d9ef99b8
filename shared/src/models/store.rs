//! Store Model

use super::Average;
use serde::{Deserialize, Serialize};

/// Store row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Admin listing row with the store's overall rating
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StoreListItem {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_id: Option<i64>,
    pub rating: Average,
    pub total_ratings: i64,
}

/// Caller-relative listing row
///
/// `overall_rating` averages every rating except the caller's own;
/// `user_rating` is the caller's rating, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StoreWithUserRating {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub overall_rating: Average,
    pub user_rating: Option<i64>,
}

/// The calling owner's store with its rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OwnedStore {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub average_rating: Average,
    pub total_ratings: i64,
}
