// src/store/memory.rs
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    validate_new, validate_patch, RatedProduct, RatingComparison, RecordStore, SeasonTotals, StoreError,
};
use crate::models::fashion::{ProductSales, ProductSalesRecord, RecordDraft};

#[derive(Default)]
struct Inner {
    records: Vec<ProductSalesRecord>,
    next_id: i64,
}

impl Inner {
    fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.product_name == name)
    }

    fn insert(&mut self, fields: ProductSales) -> ProductSalesRecord {
        self.next_id += 1;
        let now = Utc::now();
        let record = ProductSalesRecord {
            id: self.next_id,
            product_category: fields.product_category,
            product_name: fields.product_name,
            units_sold: fields.units_sold,
            returns: fields.returns,
            revenue: fields.revenue,
            customer_rating: fields.customer_rating,
            stock_level: fields.stock_level,
            season: fields.season,
            trend_score: fields.trend_score,
            created_at: now,
            updated_at: now,
        };
        self.records.push(record.clone());
        record
    }
}

fn apply(record: &mut ProductSalesRecord, fields: ProductSales) {
    record.product_category = fields.product_category;
    record.product_name = fields.product_name;
    record.units_sold = fields.units_sold;
    record.returns = fields.returns;
    record.revenue = fields.revenue;
    record.customer_rating = fields.customer_rating;
    record.stock_level = fields.stock_level;
    record.season = fields.season;
    record.trend_score = fields.trend_score;
    record.updated_at = Utc::now();
}

/// In-process [`RecordStore`]. Records are kept in insertion order.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: RwLock<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, draft: RecordDraft) -> Result<ProductSalesRecord, StoreError> {
        let fields = validate_new(draft)?;
        let mut inner = self.inner.write().await;
        if inner.position(&fields.product_name).is_some() {
            return Err(StoreError::Duplicate { product_name: fields.product_name });
        }
        Ok(inner.insert(fields))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ProductSalesRecord>, StoreError> {
        let name = name.trim();
        let inner = self.inner.read().await;
        Ok(inner.records.iter().find(|r| r.product_name == name).cloned())
    }

    async fn update_by_name(&self, name: &str, patch: RecordDraft) -> Result<ProductSalesRecord, StoreError> {
        let name = name.trim();
        let mut inner = self.inner.write().await;
        let idx = inner
            .position(name)
            .ok_or_else(|| StoreError::NotFound { product_name: name.to_string() })?;
        let fields = validate_patch(&inner.records[idx], patch)?;
        let record = &mut inner.records[idx];
        apply(record, fields);
        Ok(record.clone())
    }

    async fn delete_by_name(&self, name: &str) -> Result<ProductSalesRecord, StoreError> {
        let name = name.trim();
        let mut inner = self.inner.write().await;
        let idx = inner
            .position(name)
            .ok_or_else(|| StoreError::NotFound { product_name: name.to_string() })?;
        Ok(inner.records.remove(idx))
    }

    async fn upsert(&self, draft: RecordDraft) -> Result<ProductSalesRecord, StoreError> {
        let fields = validate_new(draft)?;
        let mut inner = self.inner.write().await;
        match inner.position(&fields.product_name) {
            Some(idx) => {
                let record = &mut inner.records[idx];
                apply(record, fields);
                Ok(record.clone())
            }
            None => Ok(inner.insert(fields)),
        }
    }

    async fn find_by_season_above_threshold(
        &self,
        season: &str,
        min_units_sold: f64,
        limit: i64,
    ) -> Result<Vec<ProductSalesRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.season == season && r.units_sold > min_units_sold)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn aggregate_totals_by_season(&self, season: &str) -> Result<SeasonTotals, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.season == season)
            .fold(SeasonTotals::default(), |acc, r| SeasonTotals {
                total_units_sold: acc.total_units_sold + r.units_sold,
                total_returns: acc.total_returns + r.returns,
                total_revenue: acc.total_revenue + r.revenue,
                matched: acc.matched + 1,
            }))
    }

    async fn aggregate_avg_rating_by_season_filtered(
        &self,
        season: &str,
        op: RatingComparison,
        value: f64,
    ) -> Result<Vec<RatedProduct>, StoreError> {
        let inner = self.inner.read().await;

        // (first record, rating sum, count) per product, in first-seen order
        let mut groups: Vec<(&ProductSalesRecord, f64, u32)> = Vec::new();
        for record in inner.records.iter().filter(|r| r.season == season) {
            match groups.iter_mut().find(|(first, _, _)| first.product_name == record.product_name) {
                Some((_, sum, count)) => {
                    *sum += record.customer_rating;
                    *count += 1;
                }
                None => groups.push((record, record.customer_rating, 1)),
            }
        }

        Ok(groups
            .into_iter()
            .map(|(first, sum, count)| (first, sum / f64::from(count)))
            .filter(|(_, avg)| op.matches(*avg, value))
            .map(|(first, avg_rating)| RatedProduct { avg_rating, product: first.clone() })
            .collect())
    }
}
