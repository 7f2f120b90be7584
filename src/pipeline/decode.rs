//! Decode the recognition service's answer into row objects.
//!
//! Even when told to "return ONLY a JSON array", models wrap the array in
//! ```` ```json ```` fences, prefix it with a sentence of prose, or nest it
//! under a `rows` key. The decoder peels those layers off before parsing and
//! reports anything it cannot recover as [`TimetableError::MalformedResponse`]
//! with an excerpt of the offending text.

use crate::error::TimetableError;
use crate::table::Row;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static RE_LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").unwrap());
static RE_TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").unwrap());

/// Decode a raw answer from `model` into rows.
///
/// # Errors
/// * [`TimetableError::EmptyResponse`] — `raw` is empty or whitespace.
/// * [`TimetableError::MalformedResponse`] — no `[`…`]` pair, invalid JSON,
///   or the JSON is not an array.
pub fn decode(raw: &str, model: &str) -> Result<Vec<Row>, TimetableError> {
    if raw.trim().is_empty() {
        return Err(TimetableError::EmptyResponse {
            model: model.to_string(),
        });
    }

    let content = strip_fences(raw);

    let items = match rows_object(&content) {
        Some(items) => items,
        None => parse_array(&content)?,
    };

    let total = items.len();
    let rows: Vec<Row> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            if !item.is_object() {
                warn!("Skipping element {} of {}: not an object", i, total);
                return None;
            }
            match serde_json::from_value::<Row>(item) {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!("Skipping element {} of {}: {}", i, total, e);
                    None
                }
            }
        })
        .collect();

    debug!("Decoded {} rows from {} bytes", rows.len(), raw.len());
    Ok(rows)
}

/// Remove a leading fence (with optional language tag) and a trailing fence.
fn strip_fences(raw: &str) -> String {
    let s = raw.trim();
    let s = RE_LEADING_FENCE.replace(s, "");
    let s = RE_TRAILING_FENCE.replace(&s, "");
    s.trim().to_string()
}

/// Tolerate `{"rows": [...]}` as an answer shape.
fn rows_object(content: &str) -> Option<Vec<Value>> {
    if !content.starts_with('{') {
        return None;
    }
    match serde_json::from_str::<Value>(content).ok()? {
        Value::Object(mut obj) => match obj.remove("rows")? {
            Value::Array(items) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Slice from the first `[` to the last `]` and parse it as a JSON array.
fn parse_array(content: &str) -> Result<Vec<Value>, TimetableError> {
    let (start, end) = match (content.find('['), content.rfind(']')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => {
            return Err(TimetableError::malformed(
                "could not locate a JSON array in the response",
                content,
            ))
        }
    };
    let slice = &content[start..=end];

    match serde_json::from_str::<Value>(slice) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(TimetableError::malformed("response JSON is not an array", slice)),
        Err(e) => Err(TimetableError::malformed(
            format!("JSON parse failed: {e}"),
            slice,
        )),
    }
}
