// src/dtos/fashion.rs
use serde::{Deserialize, Serialize};

use crate::models::fashion::ProductSalesRecord;
use crate::store::{RatedProduct, RatingComparison, SeasonTotals};

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub message: &'static str,
    pub data: ProductSalesRecord,
}

#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub season: String,
    pub totals: SeasonTotals,
}

// Query values stay raw strings so bad numbers become a 400 with our own message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUnitsQuery {
    pub season: Option<String>,
    pub min_units_sold: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUnitsResponse {
    pub season: String,
    pub min_units_sold: f64,
    pub count: usize,
    pub data: Vec<ProductSalesRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RatingConditionQuery {
    pub season: Option<String>,
    pub op: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RatingCondition {
    pub op: RatingComparison,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct RatingConditionResponse {
    pub season: String,
    pub condition: RatingCondition,
    pub count: usize,
    pub data: Vec<RatedProduct>,
}
