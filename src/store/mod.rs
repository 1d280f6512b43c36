// src/store/mod.rs
pub mod memory;
pub mod postgres;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::fashion::{ProductSales, ProductSalesRecord, RecordDraft, ValidationError};

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("duplicate key: a record named \"{product_name}\" already exists")]
    Duplicate { product_name: String },
    #[error("no record named \"{product_name}\"")]
    NotFound { product_name: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Summed sales figures for one season.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonTotals {
    pub total_units_sold: f64,
    pub total_returns: f64,
    pub total_revenue: f64,
    /// Number of records the sums were taken over.
    #[serde(skip)]
    pub matched: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingComparison {
    Gt,
    #[default]
    Gte,
    Lt,
    Lte,
    Eq,
}

impl RatingComparison {
    pub fn matches(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Eq => lhs == rhs,
        }
    }

    pub fn sql_operator(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Eq => "=",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Eq => "eq",
        }
    }
}

impl fmt::Display for RatingComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownComparison(pub String);

impl FromStr for RatingComparison {
    type Err = UnknownComparison;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "eq" => Ok(Self::Eq),
            _ => Err(UnknownComparison(s.to_string())),
        }
    }
}

/// A product whose mean rating passed a [`RatingComparison`], plus one of its records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedProduct {
    pub avg_rating: f64,
    pub product: ProductSalesRecord,
}

/// Keyed collection of [`ProductSalesRecord`]s. Implementations validate every
/// write and keep `product_name` unique.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, draft: RecordDraft) -> Result<ProductSalesRecord, StoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<ProductSalesRecord>, StoreError>;

    /// Merges `patch` over the stored record and re-validates the result.
    async fn update_by_name(&self, name: &str, patch: RecordDraft) -> Result<ProductSalesRecord, StoreError>;

    async fn delete_by_name(&self, name: &str) -> Result<ProductSalesRecord, StoreError>;

    /// Replaces the tracked fields of the record with the same name, or inserts it.
    async fn upsert(&self, draft: RecordDraft) -> Result<ProductSalesRecord, StoreError>;

    /// Up to `limit` records of `season` with `units_sold > min_units_sold`, insertion order.
    async fn find_by_season_above_threshold(
        &self,
        season: &str,
        min_units_sold: f64,
        limit: i64,
    ) -> Result<Vec<ProductSalesRecord>, StoreError>;

    /// Zeroed totals when nothing matches.
    async fn aggregate_totals_by_season(&self, season: &str) -> Result<SeasonTotals, StoreError>;

    /// Groups `season` records by product name and keeps groups whose mean
    /// rating satisfies `op value`. The representative record is the first
    /// inserted one of its group.
    async fn aggregate_avg_rating_by_season_filtered(
        &self,
        season: &str,
        op: RatingComparison,
        value: f64,
    ) -> Result<Vec<RatedProduct>, StoreError>;
}

pub(crate) fn validate_new(draft: RecordDraft) -> Result<ProductSales, StoreError> {
    Ok(draft.validate()?)
}

/// Patches never rename a record; the lookup name wins.
pub(crate) fn validate_patch(existing: &ProductSalesRecord, mut patch: RecordDraft) -> Result<ProductSales, StoreError> {
    patch.product_name = None;
    Ok(RecordDraft::from(existing.fields()).merge(patch).validate()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_parses_case_insensitively() {
        assert_eq!("GTE".parse::<RatingComparison>(), Ok(RatingComparison::Gte));
        assert_eq!("lt".parse::<RatingComparison>(), Ok(RatingComparison::Lt));
        assert!("between".parse::<RatingComparison>().is_err());
    }

    #[test]
    fn comparison_semantics() {
        assert!(RatingComparison::Gte.matches(4.0, 4.0));
        assert!(!RatingComparison::Gt.matches(4.0, 4.0));
        assert!(RatingComparison::Lte.matches(3.9, 4.0));
        assert!(RatingComparison::Eq.matches(4.5, 4.5));
        assert_eq!(RatingComparison::default(), RatingComparison::Gte);
    }
}
