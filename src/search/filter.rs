//! Translation of structured archive filters into the index predicate language.
//!
//! The backing index evaluates JSON predicates with `$eq`/`$gte`/`$lte`
//! operators keyed by metadata attribute. Each recognized filter field maps
//! to exactly one predicate clause; unrecognized fields are skipped.

use serde_json::{json, Map, Value};

/// Error type for filter translation.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("malformed value for filter '{field}': {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl FilterError {
    fn malformed(field: &'static str, reason: impl Into<String>) -> FilterError {
        FilterError::Malformed {
            field,
            reason: reason.into(),
        }
    }
}

/// Build an index-side predicate from a filter mapping.
///
/// Recognized fields: `year`, `year_range`, `designer`, `category`,
/// `season`, `city`, `min_aesthetic`. Unknown keys emit no clause and no
/// error. `year` and `year_range` both write the `year` attribute, so
/// `year_range` wins when both are present.
///
/// Returns `None` when no filters are given or none of the keys are
/// recognized, so the index query carries no filter at all.
pub fn translate_filters(
    filters: Option<&Map<String, Value>>,
) -> Result<Option<Value>, FilterError> {
    let Some(filters) = filters else {
        return Ok(None);
    };

    let mut predicate = Map::new();

    if let Some(year) = filters.get("year") {
        let year = require_number("year", year)?;
        predicate.insert("year".to_string(), json!({ "$eq": year }));
    }

    if let Some(range) = filters.get("year_range") {
        let bounds = range
            .as_object()
            .ok_or_else(|| FilterError::malformed("year_range", "expected an object"))?;
        let min = bounds
            .get("min")
            .ok_or_else(|| FilterError::malformed("year_range", "missing 'min' bound"))?;
        let max = bounds
            .get("max")
            .ok_or_else(|| FilterError::malformed("year_range", "missing 'max' bound"))?;

        let min = require_number("year_range", min)?;
        let max = require_number("year_range", max)?;

        predicate.insert("year".to_string(), json!({ "$gte": min, "$lte": max }));
    }

    for field in ["designer", "category", "season", "city"] {
        if let Some(value) = filters.get(field) {
            predicate.insert(field.to_string(), json!({ "$eq": value }));
        }
    }

    if let Some(score) = filters.get("min_aesthetic") {
        let score = require_number("min_aesthetic", score)?;
        predicate.insert("aesthetic_score".to_string(), json!({ "$gte": score }));
    }

    if predicate.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::Object(predicate)))
    }
}

fn require_number(field: &'static str, value: &Value) -> Result<Value, FilterError> {
    if value.is_number() {
        Ok(value.clone())
    } else {
        Err(FilterError::malformed(
            field,
            format!("expected a number, got {value}"),
        ))
    }
}
