//! List queries and their embedded page cursor.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field holding the page cursor.
pub const CURSOR_FIELD: &str = "after";
/// Field holding the filter expression.
pub const FILTER_FIELD: &str = "filter";
/// Field holding the positional filter parameters.
pub const FILTER_PARAMS_FIELD: &str = "filter_params";
/// Field holding the requested page size.
pub const PAGE_SIZE_FIELD: &str = "page_size";

/// A list query.
///
/// A query is a flat mapping of keys to JSON values. The page cursor lives in
/// the same mapping under [`CURSOR_FIELD`]; it is absent on the first request
/// and replayed on every following one. Everything except the cursor is the
/// query's *criteria*, and a cursor is only valid against the criteria that
/// produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query {
    fields: BTreeMap<String, Value>,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Appends `value` to the list stored under `key`.
    ///
    /// A missing or non-list value is replaced by a one-element list.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let entry = self
            .fields
            .entry(key.into())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(items) => items.push(value.into()),
            other => *other = Value::Array(vec![value.into()]),
        }
    }

    /// Removes the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Returns the number of fields, cursor included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the query has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the page cursor, if any.
    pub fn cursor(&self) -> Option<&str> {
        self.fields.get(CURSOR_FIELD).and_then(Value::as_str)
    }

    /// Sets the page cursor.
    pub fn set_cursor(&mut self, cursor: impl Into<String>) {
        self.fields
            .insert(CURSOR_FIELD.to_string(), Value::String(cursor.into()));
    }

    /// Clears the page cursor.
    pub fn clear_cursor(&mut self) {
        self.fields.remove(CURSOR_FIELD);
    }

    /// Returns the filter expression, if any.
    pub fn filter(&self) -> Option<&str> {
        self.fields.get(FILTER_FIELD).and_then(Value::as_str)
    }

    /// Returns the positional filter parameters.
    pub fn filter_params(&self) -> &[Value] {
        self.fields
            .get(FILTER_PARAMS_FIELD)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the requested page size, if any.
    pub fn page_size(&self) -> Option<u64> {
        self.fields.get(PAGE_SIZE_FIELD).and_then(Value::as_u64)
    }

    /// Returns true if both queries have the same criteria, ignoring cursors.
    pub fn same_criteria(&self, other: &Query) -> bool {
        let criteria = |q: &Query| {
            q.fields
                .iter()
                .filter(|(k, _)| k.as_str() != CURSOR_FIELD)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        criteria(self) == criteria(other)
    }
}

impl FromIterator<(String, Value)> for Query {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
