// src/handlers/fashion.rs
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::dtos::fashion::{
    RatingCondition, RatingConditionQuery, RatingConditionResponse, RecordResponse, TopUnitsQuery,
    TopUnitsResponse, TotalsResponse,
};
use crate::error::AppError;
use crate::models::fashion::{coerce_text, non_blank, RecordDraft};
use crate::state::AppState;
use crate::store::RatingComparison;

pub const TOP_UNITS_LIMIT: i64 = 10;

fn body_object(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    match payload {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(_) => Err(AppError::bad_request("Request body must be a JSON object")),
        Err(rejection) => Err(AppError::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))),
    }
}

fn take_product_name(body: &mut Map<String, Value>) -> Result<String, AppError> {
    body.remove("productName")
        .as_ref()
        .and_then(coerce_text)
        .ok_or_else(|| AppError::bad_request("productName is required"))
}

/// An empty parameter (`?value=`) is not a number.
fn finite_number(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn required_season(season: Option<String>) -> Result<String, AppError> {
    season
        .as_deref()
        .and_then(non_blank)
        .ok_or_else(|| AppError::bad_request("season is required"))
}

// POST /add
#[instrument(skip(state, payload))]
pub async fn add_record(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordResponse>), AppError> {
    const FAILED: &str = "Insert failed";

    let body = body_object(payload)?;
    let draft = RecordDraft::from_json(&body);
    let record = state.store.create(draft).await.map_err(AppError::store(FAILED))?;

    info!(product_name = %record.product_name, "Record inserted");
    Ok((StatusCode::CREATED, Json(RecordResponse { message: "Inserted", data: record })))
}

// POST /update
#[instrument(skip(state, payload))]
pub async fn update_record(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecordResponse>, AppError> {
    const FAILED: &str = "Update failed";

    let mut body = body_object(payload)?;
    let product_name = take_product_name(&mut body)?;
    let patch = RecordDraft::from_json(&body);

    let record = state
        .store
        .update_by_name(&product_name, patch)
        .await
        .map_err(AppError::store(FAILED))?;

    Ok(Json(RecordResponse { message: "Updated", data: record }))
}

// POST /delete
#[instrument(skip(state, payload))]
pub async fn delete_record(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecordResponse>, AppError> {
    let mut body = body_object(payload)?;
    let product_name = take_product_name(&mut body)?;

    let record = state
        .store
        .delete_by_name(&product_name)
        .await
        .map_err(AppError::store("Delete failed"))?;

    info!(product_name = %record.product_name, "Record deleted");
    Ok(Json(RecordResponse { message: "Deleted", data: record }))
}

// GET /totals/{season}
#[instrument(skip(state))]
pub async fn season_totals(
    State(state): State<AppState>,
    Path(season): Path<String>,
) -> Result<(StatusCode, Json<TotalsResponse>), AppError> {
    let season = season.trim().to_string();
    let totals = state
        .store
        .aggregate_totals_by_season(&season)
        .await
        .map_err(AppError::store("Totals query failed"))?;

    if totals.matched == 0 {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(TotalsResponse { message: Some("No records for that season"), season, totals }),
        ));
    }

    Ok((StatusCode::OK, Json(TotalsResponse { message: None, season, totals })))
}

// GET /top10-units?season=&minUnitsSold=
#[instrument(skip(state))]
pub async fn top_units(
    State(state): State<AppState>,
    Query(params): Query<TopUnitsQuery>,
) -> Result<Json<TopUnitsResponse>, AppError> {
    let season = required_season(params.season)?;
    let min_units_sold = finite_number(params.min_units_sold.as_deref())
        .ok_or_else(|| AppError::bad_request("minUnitsSold must be a number"))?;

    let data = state
        .store
        .find_by_season_above_threshold(&season, min_units_sold, TOP_UNITS_LIMIT)
        .await
        .map_err(AppError::store("Top10 query failed"))?;

    Ok(Json(TopUnitsResponse { season, min_units_sold, count: data.len(), data }))
}

// GET /rating-condition?season=&op=&value=
#[instrument(skip(state))]
pub async fn rating_condition(
    State(state): State<AppState>,
    Query(params): Query<RatingConditionQuery>,
) -> Result<Json<RatingConditionResponse>, AppError> {
    let season = required_season(params.season)?;
    let value = finite_number(params.value.as_deref())
        .ok_or_else(|| AppError::bad_request("value must be a number"))?;
    let op = match params.op.as_deref().and_then(non_blank) {
        None => RatingComparison::default(),
        Some(raw) => raw
            .parse::<RatingComparison>()
            .map_err(|_| AppError::bad_request("op must be one of: gt, gte, lt, lte, eq"))?,
    };

    let data = state
        .store
        .aggregate_avg_rating_by_season_filtered(&season, op, value)
        .await
        .map_err(AppError::store("Rating condition query failed"))?;

    Ok(Json(RatingConditionResponse {
        season,
        condition: RatingCondition { op, value },
        count: data.len(),
        data,
    }))
}
