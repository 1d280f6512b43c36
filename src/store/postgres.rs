// src/store/postgres.rs
use async_trait::async_trait;
use sqlx::{Error as SqlxError, FromRow, PgPool};
use tracing::{error, instrument};

use super::{
    validate_new, validate_patch, RatedProduct, RatingComparison, RecordStore, SeasonTotals, StoreError,
};
use crate::models::fashion::{ProductSales, ProductSalesRecord, RecordDraft};

const COLUMNS: &str = "id, product_category, product_name,
    units_sold, returns, revenue, customer_rating, stock_level,
    season, trend_score, created_at, updated_at";

fn map_unique_violation(err: SqlxError, product_name: &str) -> StoreError {
    match err {
        SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Duplicate { product_name: product_name.to_string() }
        }
        other => other.into(),
    }
}

#[derive(FromRow)]
struct RatedRow {
    avg_rating: f64,
    #[sqlx(flatten)]
    product: ProductSalesRecord,
}

#[derive(FromRow)]
struct TotalsRow {
    total_units_sold: f64,
    total_returns: f64,
    total_revenue: f64,
    matched: i64,
}

/// [`RecordStore`] backed by the `fashion_shop_data` table.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[instrument(skip(self, draft))]
    async fn create(&self, draft: RecordDraft) -> Result<ProductSalesRecord, StoreError> {
        let fields = validate_new(draft)?;
        let sql = format!(
            "INSERT INTO fashion_shop_data
                (product_category, product_name, units_sold, returns, revenue,
                 customer_rating, stock_level, season, trend_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        bind_fields(sqlx::query_as::<_, ProductSalesRecord>(&sql), &fields)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, &fields.product_name))
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> Result<Option<ProductSalesRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM fashion_shop_data WHERE product_name = $1");
        Ok(sqlx::query_as::<_, ProductSalesRecord>(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    #[instrument(skip(self, patch))]
    async fn update_by_name(&self, name: &str, patch: RecordDraft) -> Result<ProductSalesRecord, StoreError> {
        let name = name.trim();
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {COLUMNS} FROM fashion_shop_data WHERE product_name = $1 FOR UPDATE");
        let existing = sqlx::query_as::<_, ProductSalesRecord>(&select)
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound { product_name: name.to_string() })?;

        let fields = validate_patch(&existing, patch)?;

        let update = format!(
            "UPDATE fashion_shop_data SET
                product_category = $1, product_name = $2, units_sold = $3,
                returns = $4, revenue = $5, customer_rating = $6,
                stock_level = $7, season = $8, trend_score = $9,
                updated_at = now()
             WHERE id = $10
             RETURNING {COLUMNS}"
        );
        let updated = bind_fields(sqlx::query_as::<_, ProductSalesRecord>(&update), &fields)
            .bind(existing.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_by_name(&self, name: &str) -> Result<ProductSalesRecord, StoreError> {
        let name = name.trim();
        let sql = format!("DELETE FROM fashion_shop_data WHERE product_name = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, ProductSalesRecord>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound { product_name: name.to_string() })
    }

    #[instrument(skip(self, draft))]
    async fn upsert(&self, draft: RecordDraft) -> Result<ProductSalesRecord, StoreError> {
        let fields = validate_new(draft)?;
        let sql = format!(
            "INSERT INTO fashion_shop_data
                (product_category, product_name, units_sold, returns, revenue,
                 customer_rating, stock_level, season, trend_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (product_name) DO UPDATE SET
                product_category = EXCLUDED.product_category,
                units_sold = EXCLUDED.units_sold,
                returns = EXCLUDED.returns,
                revenue = EXCLUDED.revenue,
                customer_rating = EXCLUDED.customer_rating,
                stock_level = EXCLUDED.stock_level,
                season = EXCLUDED.season,
                trend_score = EXCLUDED.trend_score,
                updated_at = now()
             RETURNING {COLUMNS}"
        );
        Ok(bind_fields(sqlx::query_as::<_, ProductSalesRecord>(&sql), &fields)
            .fetch_one(&self.pool)
            .await?)
    }

    #[instrument(skip(self))]
    async fn find_by_season_above_threshold(
        &self,
        season: &str,
        min_units_sold: f64,
        limit: i64,
    ) -> Result<Vec<ProductSalesRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM fashion_shop_data
             WHERE season = $1 AND units_sold > $2
             ORDER BY id
             LIMIT $3"
        );
        sqlx::query_as::<_, ProductSalesRecord>(&sql)
            .bind(season)
            .bind(min_units_sold)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(?e, season, "Failed to fetch records above threshold");
                e.into()
            })
    }

    #[instrument(skip(self))]
    async fn aggregate_totals_by_season(&self, season: &str) -> Result<SeasonTotals, StoreError> {
        let row = sqlx::query_as::<_, TotalsRow>(
            "SELECT COALESCE(SUM(units_sold), 0)::FLOAT8 AS total_units_sold,
                    COALESCE(SUM(returns), 0)::FLOAT8    AS total_returns,
                    COALESCE(SUM(revenue), 0)::FLOAT8    AS total_revenue,
                    COUNT(*)                             AS matched
             FROM fashion_shop_data WHERE season = $1",
        )
        .bind(season)
        .fetch_one(&self.pool)
        .await?;

        Ok(SeasonTotals {
            total_units_sold: row.total_units_sold,
            total_returns: row.total_returns,
            total_revenue: row.total_revenue,
            matched: row.matched,
        })
    }

    #[instrument(skip(self))]
    async fn aggregate_avg_rating_by_season_filtered(
        &self,
        season: &str,
        op: RatingComparison,
        value: f64,
    ) -> Result<Vec<RatedProduct>, StoreError> {
        // operator comes from a closed enum, never from user text
        let sql = format!(
            "WITH rating_groups AS (
                SELECT product_name,
                       AVG(customer_rating)::FLOAT8 AS avg_rating,
                       MIN(id) AS first_id
                FROM fashion_shop_data
                WHERE season = $1
                GROUP BY product_name
                HAVING AVG(customer_rating) {} $2
             )
             SELECT g.avg_rating,
                    r.id, r.product_category, r.product_name,
                    r.units_sold, r.returns, r.revenue, r.customer_rating, r.stock_level,
                    r.season, r.trend_score, r.created_at, r.updated_at
             FROM rating_groups g
             JOIN fashion_shop_data r ON r.id = g.first_id
             ORDER BY r.id",
            op.sql_operator()
        );
        let rows = sqlx::query_as::<_, RatedRow>(&sql)
            .bind(season)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| RatedProduct { avg_rating: row.avg_rating, product: row.product })
            .collect())
    }
}

fn bind_fields<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, ProductSalesRecord, sqlx::postgres::PgArguments>,
    fields: &'q ProductSales,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, ProductSalesRecord, sqlx::postgres::PgArguments> {
    query
        .bind(&fields.product_category)
        .bind(&fields.product_name)
        .bind(fields.units_sold)
        .bind(fields.returns)
        .bind(fields.revenue)
        .bind(fields.customer_rating)
        .bind(fields.stock_level)
        .bind(&fields.season)
        .bind(fields.trend_score)
}
