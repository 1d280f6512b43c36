// src/models/fashion.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;
use thiserror::Error;

/// A stored product-sales document. One row per distinct `product_name`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductSalesRecord {
    pub id: i64,
    pub product_category: String,
    pub product_name: String,
    pub units_sold: f64,
    pub returns: f64,
    pub revenue: f64,
    pub customer_rating: f64,
    pub stock_level: f64,
    pub season: String,
    pub trend_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductSalesRecord {
    pub fn fields(&self) -> ProductSales {
        ProductSales {
            product_category: self.product_category.clone(),
            product_name: self.product_name.clone(),
            units_sold: self.units_sold,
            returns: self.returns,
            revenue: self.revenue,
            customer_rating: self.customer_rating,
            stock_level: self.stock_level,
            season: self.season.clone(),
            trend_score: self.trend_score,
        }
    }
}

/// The tracked, user-supplied fields of a record after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSales {
    pub product_category: String,
    pub product_name: String,
    pub units_sold: f64,
    pub returns: f64,
    pub revenue: f64,
    pub customer_rating: f64,
    pub stock_level: f64,
    pub season: String,
    pub trend_score: f64,
}

impl From<ProductSales> for RecordDraft {
    fn from(fields: ProductSales) -> Self {
        Self {
            product_category: Some(fields.product_category),
            product_name: Some(fields.product_name),
            units_sold: Some(fields.units_sold),
            returns: Some(fields.returns),
            revenue: Some(fields.revenue),
            customer_rating: Some(fields.customer_rating),
            stock_level: Some(fields.stock_level),
            season: Some(fields.season),
            trend_score: Some(fields.trend_score),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every constraint a write violated, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Error)]
#[error("validation failed: {}", render(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

fn render(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Keeps the first violation per field.
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        if !self.has_field(field) {
            self.violations.push(FieldViolation { field, message: message.into() });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    fn extend(&mut self, other: ValidationError) {
        for v in other.violations {
            self.push(v.field, v.message);
        }
    }
}

/// Unvalidated field values, as received from a request body or an import row.
/// `None` means the field was absent (or null / an empty string).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub product_category: Option<String>,
    pub product_name: Option<String>,
    pub units_sold: Option<f64>,
    pub returns: Option<f64>,
    pub revenue: Option<f64>,
    pub customer_rating: Option<f64>,
    pub stock_level: Option<f64>,
    pub season: Option<String>,
    pub trend_score: Option<f64>,
    /// Fields sent explicitly as `null` or blank. A merge clears them.
    pub cleared: Vec<&'static str>,
    /// Values of the wrong JSON type, reported again by [`RecordDraft::validate`].
    pub rejected: ValidationError,
}

impl RecordDraft {
    /// Reads the known camelCase keys out of a JSON object. Unknown keys are
    /// ignored. Values of the wrong JSON type are kept in `rejected`.
    pub fn from_json(body: &Map<String, Value>) -> Self {
        let mut draft = Self::default();
        draft.product_category = draft.json_string(body, "productCategory");
        draft.product_name = draft.json_string(body, "productName");
        draft.units_sold = draft.json_number(body, "unitsSold");
        draft.returns = draft.json_number(body, "returns");
        draft.revenue = draft.json_number(body, "revenue");
        draft.customer_rating = draft.json_number(body, "customerRating");
        draft.stock_level = draft.json_number(body, "stockLevel");
        draft.season = draft.json_string(body, "season");
        draft.trend_score = draft.json_number(body, "trendScore");
        draft
    }

    fn json_string(&mut self, body: &Map<String, Value>, key: &'static str) -> Option<String> {
        let value = body.get(key)?;
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            self.rejected.push(key, "must be a string");
            return None;
        }
        let text = coerce_text(value);
        if text.is_none() {
            self.cleared.push(key);
        }
        text
    }

    fn json_number(&mut self, body: &Map<String, Value>, key: &'static str) -> Option<f64> {
        match body.get(key)? {
            Value::Null => {
                self.cleared.push(key);
                None
            }
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => {
                self.cleared.push(key);
                None
            }
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Some(n),
                _ => {
                    self.rejected.push(key, format!("cast to number failed for value \"{s}\""));
                    None
                }
            },
            _ => {
                self.rejected.push(key, "must be a number");
                None
            }
        }
    }

    /// Overlays `patch` onto `self`: present fields replace, cleared fields
    /// become absent, everything else is kept.
    pub fn merge(self, patch: RecordDraft) -> Self {
        let RecordDraft {
            product_category,
            product_name,
            units_sold,
            returns,
            revenue,
            customer_rating,
            stock_level,
            season,
            trend_score,
            cleared,
            rejected: patch_rejected,
        } = patch;
        let keep = |field: &str| !cleared.iter().any(|c| *c == field);

        let mut rejected = self.rejected;
        rejected.extend(patch_rejected);

        Self {
            product_category: product_category.or(self.product_category.filter(|_| keep("productCategory"))),
            product_name: product_name.or(self.product_name.filter(|_| keep("productName"))),
            units_sold: units_sold.or(self.units_sold.filter(|_| keep("unitsSold"))),
            returns: returns.or(self.returns.filter(|_| keep("returns"))),
            revenue: revenue.or(self.revenue.filter(|_| keep("revenue"))),
            customer_rating: customer_rating.or(self.customer_rating.filter(|_| keep("customerRating"))),
            stock_level: stock_level.or(self.stock_level.filter(|_| keep("stockLevel"))),
            season: season.or(self.season.filter(|_| keep("season"))),
            trend_score: trend_score.or(self.trend_score.filter(|_| keep("trendScore"))),
            cleared: Vec::new(),
            rejected,
        }
    }

    /// Runs every record constraint and returns the complete field set, or all
    /// violations at once, type errors included.
    pub fn validate(self) -> Result<ProductSales, ValidationError> {
        let mut errors = ValidationError::default();
        errors.extend(self.rejected);

        let product_category = required_text("productCategory", self.product_category, &mut errors);
        let product_name = required_text("productName", self.product_name, &mut errors);
        let units_sold = non_negative("unitsSold", self.units_sold, &mut errors);
        let returns = non_negative("returns", self.returns, &mut errors);
        let revenue = non_negative("revenue", self.revenue, &mut errors);
        let customer_rating = rating("customerRating", self.customer_rating, &mut errors);
        let stock_level = non_negative("stockLevel", self.stock_level, &mut errors);
        let season = required_text("season", self.season, &mut errors);
        let trend_score = required_number("trendScore", self.trend_score, &mut errors);

        if !errors.is_empty() {
            errors.violations.sort_by_key(|v| field_order(v.field));
            return Err(errors);
        }

        Ok(ProductSales {
            product_category,
            product_name,
            units_sold,
            returns,
            revenue,
            customer_rating,
            stock_level,
            season,
            trend_score,
        })
    }
}

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

const FIELDS: [&str; 9] = [
    "productCategory",
    "productName",
    "unitsSold",
    "returns",
    "revenue",
    "customerRating",
    "stockLevel",
    "season",
    "trendScore",
];

fn field_order(field: &str) -> usize {
    FIELDS.iter().position(|f| *f == field).unwrap_or(FIELDS.len())
}

/// Text value of a scalar JSON field, trimmed. Numbers and booleans are
/// stringified; null, blank strings and containers give `None`.
pub(crate) fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required_text(field: &'static str, value: Option<String>, errors: &mut ValidationError) -> String {
    match value.as_deref().and_then(non_blank) {
        Some(s) => s,
        None => {
            errors.push(field, "is required");
            String::new()
        }
    }
}

fn required_number(field: &'static str, value: Option<f64>, errors: &mut ValidationError) -> f64 {
    match value {
        Some(n) if n.is_finite() => n,
        Some(_) => {
            errors.push(field, "must be a finite number");
            0.0
        }
        None => {
            errors.push(field, "is required");
            0.0
        }
    }
}

fn non_negative(field: &'static str, value: Option<f64>, errors: &mut ValidationError) -> f64 {
    let n = required_number(field, value, errors);
    if !errors.has_field(field) && n < 0.0 {
        errors.push(field, format!("must be at least 0, got {n}"));
    }
    n
}

fn rating(field: &'static str, value: Option<f64>, errors: &mut ValidationError) -> f64 {
    let n = required_number(field, value, errors);
    if !errors.has_field(field) {
        if n < MIN_RATING {
            errors.push(field, format!("must be at least {MIN_RATING}, got {n}"));
        } else if n > MAX_RATING {
            errors.push(field, format!("must be at most {MAX_RATING}, got {n}"));
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn red_scarf() -> Map<String, Value> {
        json!({
            "productCategory": " Accessories ",
            "productName": "Red Scarf",
            "unitsSold": 50,
            "returns": 2,
            "revenue": 500,
            "customerRating": 4.2,
            "stockLevel": 10,
            "season": "Winter",
            "trendScore": 7
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn valid_payload_is_trimmed_and_accepted() {
        let fields = RecordDraft::from_json(&red_scarf()).validate().unwrap();
        assert_eq!(fields.product_category, "Accessories");
        assert_eq!(fields.units_sold, 50.0);
        assert_eq!(fields.customer_rating, 4.2);
    }

    #[test]
    fn rating_above_five_is_rejected() {
        let mut body = red_scarf();
        body.insert("customerRating".into(), json!(6));
        let err = RecordDraft::from_json(&body).validate().unwrap_err();
        assert!(err.has_field("customerRating"));
        assert_eq!(err.violations.len(), 1);
        assert!(err.to_string().contains("customerRating: must be at most 5"));
    }

    #[test]
    fn every_violation_is_reported() {
        let body = json!({ "productName": "   ", "unitsSold": -1, "returns": -3 })
            .as_object()
            .cloned()
            .unwrap();
        let err = RecordDraft::from_json(&body).validate().unwrap_err();
        for field in [
            "productCategory",
            "productName",
            "unitsSold",
            "returns",
            "revenue",
            "customerRating",
            "stockLevel",
            "season",
            "trendScore",
        ] {
            assert!(err.has_field(field), "missing violation for {field}");
        }
    }

    #[test]
    fn type_errors_are_reported_with_other_violations() {
        let body = json!({ "productName": "X", "revenue": "lots", "stockLevel": [1] })
            .as_object()
            .cloned()
            .unwrap();
        let err = RecordDraft::from_json(&body).validate().unwrap_err();
        let fields: Vec<_> = err.violations.iter().map(|v| v.field).collect();
        assert_eq!(
            fields,
            [
                "productCategory",
                "unitsSold",
                "returns",
                "revenue",
                "customerRating",
                "stockLevel",
                "season",
                "trendScore",
            ]
        );
        assert!(err.violations[3].message.contains("cast to number failed"));
        assert_eq!(err.violations[5].message, "must be a number");
    }

    #[test]
    fn numeric_strings_are_cast() {
        let mut body = red_scarf();
        body.insert("unitsSold".into(), json!(" 12 "));
        let fields = RecordDraft::from_json(&body).validate().unwrap();
        assert_eq!(fields.units_sold, 12.0);
    }

    #[test]
    fn negative_trend_score_is_allowed() {
        let mut body = red_scarf();
        body.insert("trendScore".into(), json!(-4.5));
        assert!(RecordDraft::from_json(&body).validate().is_ok());
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let base: RecordDraft = RecordDraft::from_json(&red_scarf());
        let patch = RecordDraft { units_sold: Some(75.0), ..Default::default() };
        let merged = base.merge(patch).validate().unwrap();
        assert_eq!(merged.units_sold, 75.0);
        assert_eq!(merged.season, "Winter");
    }

    #[test]
    fn explicit_null_or_blank_clears_on_merge() {
        let base = RecordDraft::from_json(&red_scarf());
        let patch = json!({ "season": "", "unitsSold": null, "revenue": 20 })
            .as_object()
            .cloned()
            .unwrap();
        let patch = RecordDraft::from_json(&patch);
        assert_eq!(patch.cleared, ["unitsSold", "season"]);

        let err = base.merge(patch).validate().unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.has_field("season"));
        assert!(err.has_field("unitsSold"));
        assert!(err.to_string().contains("season: is required"));
    }

    #[test]
    fn numeric_names_are_stringified() {
        assert_eq!(coerce_text(&json!(123)).as_deref(), Some("123"));
        assert_eq!(coerce_text(&json!("  ")), None);
        assert_eq!(coerce_text(&json!({ "a": 1 })), None);
    }
}
