//! Exact-match filtering and json-server style sorting over records.
//!
//! Query strings map onto [`Query`] one pair at a time: ordinary keys become
//! equality filters on top-level fields, `_sort` and `_order` control the
//! ordering of the result, and any other `_`-prefixed key is ignored.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<(String, String)>,
    sort: Option<String>,
    order: SortOrder,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query from raw query-string pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut query = Self::new();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                "_sort" => query.sort = Some(value),
                "_order" => {
                    query.order = if value.eq_ignore_ascii_case("desc") {
                        SortOrder::Desc
                    } else {
                        SortOrder::Asc
                    }
                }
                k if k.starts_with('_') => {}
                _ => query.filters.push((key, value)),
            }
        }
        query
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(field.into());
        self.order = order;
        self
    }

    /// Whether every filter equals the record's field of the same name.
    pub fn matches(&self, record: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| field_equals(record, field, expected))
    }

    /// Filter and sort a snapshot of a collection.
    pub fn apply<'a, I>(&self, records: I) -> Vec<Value>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut out: Vec<Value> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();

        if let Some(field) = &self.sort {
            out.sort_by(|a, b| {
                let ord = compare_fields(a.get(field), b.get(field));
                match self.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        out
    }
}

/// Render a scalar JSON value the way it appears in a query string.
///
/// Objects, arrays and null have no query-string form and never match.
pub(crate) fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

pub(crate) fn field_equals(record: &Value, field: &str, expected: &str) -> bool {
    record
        .get(field)
        .and_then(scalar_text)
        .is_some_and(|actual| actual == expected)
}

// Missing fields sort after present ones in ascending order.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => match (scalar_text(x), scalar_text(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Value> {
        vec![
            json!({ "id": "1", "userId": "u1", "size": 10, "createdAt": "2024-01-02T00:00:00Z" }),
            json!({ "id": "2", "userId": "u2", "size": 5, "createdAt": "2024-01-01T00:00:00Z" }),
            json!({ "id": "3", "userId": "u1", "size": 7, "createdAt": "2024-01-03T00:00:00Z" }),
        ]
    }

    #[test]
    fn filter_returns_exact_subset() {
        let query = Query::from_pairs([("userId", "u1")]);
        let ids: Vec<_> = query
            .apply(&records())
            .into_iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn filter_matches_numbers_by_rendering() {
        let query = Query::new().filter("size", "5");
        let out = query.apply(&records());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], "2");
    }

    #[test]
    fn missing_field_never_matches() {
        let query = Query::new().filter("threadId", "t1");
        assert!(query.apply(&records()).is_empty());
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let query = Query::from_pairs([("_sort", "createdAt"), ("_order", "desc"), ("_page", "2")]);
        let out = query.apply(&records());
        let ids: Vec<_> = out.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn numeric_sort_is_not_lexical() {
        let query = Query::new().sort_by("size", SortOrder::Asc);
        let out = query.apply(&records());
        let sizes: Vec<_> = out.iter().map(|r| r["size"].as_i64().unwrap()).collect();
        assert_eq!(sizes, vec![5, 7, 10]);
    }
}
