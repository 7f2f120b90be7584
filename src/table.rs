//! Row objects and the rectangular schedule table.
//!
//! The recognition service is untrusted: two rows of the same answer may
//! carry different key sets (a merged cell, a dropped column, a typo in a
//! header). Rows are therefore kept as sparse, insertion-ordered mappings and
//! only projected onto a fixed header list at the very end.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Header of the placeholder table produced for an empty extraction.
pub const NO_DATA_HEADER: &str = "Schedule";
/// Message of the placeholder table produced for an empty extraction.
pub const NO_DATA_MESSAGE: &str = "No schedule data found.";

/// One extracted row: column label → cell text, in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `label` to `value`, keeping the original position of an existing key.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == label) {
            Some((_, v)) => *v = value,
            None => self.cells.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut String> {
        self.cells
            .iter_mut()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.cells.iter_mut().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Render a JSON cell value as display text.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of column label to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((label, value)) = map.next_entry::<String, Value>()? {
                    row.insert(label, cell_text(value));
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Ordered union of all row labels, in first-seen order.
pub fn header_union(rows: &[Row]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for label in rows.iter().flat_map(Row::labels) {
        if !headers.iter().any(|h| h == label) {
            headers.push(label.to_string());
        }
    }
    headers
}

/// A rectangular table: every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ScheduleTable {
    /// The one-cell table shown when nothing was extracted.
    pub fn placeholder() -> Self {
        Self {
            headers: vec![NO_DATA_HEADER.to_string()],
            rows: vec![vec![NO_DATA_MESSAGE.to_string()]],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Project heterogeneous rows onto their header union.
///
/// An empty input (or rows without a single key) yields
/// [`ScheduleTable::placeholder`] instead of an error.
pub fn normalize(rows: &[Row]) -> ScheduleTable {
    let headers = header_union(rows);
    if headers.is_empty() {
        return ScheduleTable::placeholder();
    }

    let rows = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| row.get(h).unwrap_or_default().to_string())
                .collect()
        })
        .collect();

    ScheduleTable { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    #[test]
    fn normalize_empty_is_placeholder() {
        let table = normalize(&[]);
        assert_eq!(table.headers, vec![NO_DATA_HEADER]);
        assert_eq!(table.rows, vec![vec![NO_DATA_MESSAGE.to_string()]]);
        assert!(table.is_placeholder());
    }

    #[test]
    fn normalize_keyless_rows_is_placeholder() {
        assert!(normalize(&[Row::new(), Row::new()]).is_placeholder());
    }

    #[test]
    fn normalize_fills_missing_cells() {
        let table = normalize(&[row(&[("A", "1")]), row(&[("B", "2")])]);
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows[0], vec!["1", ""]);
        assert_eq!(table.rows[1], vec!["", "2"]);
    }

    #[test]
    fn normalize_is_rectangular() {
        let rows = vec![
            row(&[("Time", "8:00"), ("Sun", "CSE")]),
            row(&[("Mon", "EEE")]),
            row(&[("Sun", "MAT"), ("Tue", "PHY"), ("Time", "9:30")]),
        ];
        let table = normalize(&rows);
        assert_eq!(table.headers, vec!["Time", "Sun", "Mon", "Tue"]);
        assert!(table.rows.iter().all(|r| r.len() == table.column_count()));
        assert_eq!(table.rows[2], vec!["9:30", "MAT", "", "PHY"]);
    }

    #[test]
    fn row_deserialize_keeps_key_order_and_stringifies() {
        let r: Row =
            serde_json::from_str(r#"{"Zeta":"z","Alpha":1,"Mid":null,"Flag":true}"#).unwrap();
        let labels: Vec<&str> = r.labels().collect();
        assert_eq!(labels, vec!["Zeta", "Alpha", "Mid", "Flag"]);
        assert_eq!(r.get("Alpha"), Some("1"));
        assert_eq!(r.get("Mid"), Some(""));
        assert_eq!(r.get("Flag"), Some("true"));
    }

    #[test]
    fn row_serializes_as_ordered_object() {
        let r = row(&[("Time", "8:00"), ("Day", "Sun")]);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"Time":"8:00","Day":"Sun"}"#);
    }

    #[test]
    fn insert_existing_label_keeps_position() {
        let mut r = row(&[("A", "1"), ("B", "2")]);
        r.insert("A", "3");
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![("A", "3"), ("B", "2")]);
    }
}
