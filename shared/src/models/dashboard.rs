//! Dashboard Models

use super::{Average, RatingEntry};
use serde::{Deserialize, Serialize};

/// System-wide counts for administrators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

/// Rollup of the owner's store, most recent raters first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDashboard {
    pub average_rating: Average,
    pub total_ratings: i64,
    pub rating_users: Vec<RatingEntry>,
}
