//! Rating Model

use crate::util::format_average;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lowest accepted rating value
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating value
pub const MAX_RATING: i64 = 5;

/// Ledger row: one per (user, store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub store_id: i64,
    pub rating: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Mean of a set of ratings, `0` when the set is empty.
///
/// Serialized as a two-decimal string (`"3.50"`). Deserializes from either
/// that form or a plain number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(transparent))]
pub struct Average(pub f64);

impl Average {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Serialize for Average {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_average(self.0))
    }
}

impl<'de> Deserialize<'de> for Average {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Average(v)),
            Repr::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Average)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Count and mean of one store's ratings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RatingSummary {
    pub average_rating: Average,
    pub total_ratings: i64,
}

/// One rater as seen by the store owner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RatingEntry {
    pub name: String,
    pub email: String,
    pub rating: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
