use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::fashion::{
    add_record, update_record, delete_record, season_totals, top_units, rating_condition
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_record))
        .route("/update", post(update_record))
        .route("/delete", post(delete_record))
        .route("/totals/{season}", get(season_totals))
        .route("/top10-units", get(top_units))
        .route("/rating-condition", get(rating_condition))
}
