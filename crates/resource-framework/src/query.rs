//! # Query Compiler
//!
//! Pure translation of `{pagination, filters, sorter, search}` into the flat parameter map
//! the backend understands:
//!
//! | Input                          | Output                         |
//! |--------------------------------|--------------------------------|
//! | page / page size               | `_page`, `_limit`              |
//! | `FilterValue::Scalar(v)`       | `key=v`                        |
//! | `FilterValue::Set([a, b])`     | `key_in=a,b`                   |
//! | `FilterValue::Pattern([p, ..])`| `key=p` (first element only)   |
//! | sorter                         | `_sort=field`, `_order=asc\|desc` |
//! | non-empty search term          | `q=term`                       |
//!
//! After all rules ran, blank values (`Null`, `""`) are pruned, so no compiled query ever
//! carries an empty parameter.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

pub const PAGE_PARAM: &str = "_page";
pub const LIMIT_PARAM: &str = "_limit";
pub const SORT_PARAM: &str = "_sort";
pub const ORDER_PARAM: &str = "_order";
pub const SEARCH_PARAM: &str = "q";

/// Key suffixes that mark a substring ("LIKE") filter.
pub const PATTERN_SUFFIXES: [&str; 3] = ["_like", "_ilike", "_contains"];

/// Returns true when `key` names a substring-match filter.
pub fn is_pattern_key(key: &str) -> bool {
    PATTERN_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// `Null` and the empty string never reach the wire.
    pub fn is_blank(&self) -> bool {
        match self {
            ParamValue::Null => true,
            ParamValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => Ok(()),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

/// Flat, deterministic (key-sorted) parameter map handed to the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }

    /// Merges `other` into `self`; keys from `other` win.
    pub fn merge(&mut self, other: QueryParams) {
        self.0.extend(other.0);
    }

    /// Drops every `Null` and empty-string value.
    pub fn prune_blank(&mut self) {
        self.0.retain(|_, value| !value.is_blank());
    }

    /// Stringified pairs for URL encoding.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, ParamValue)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a QueryParams {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Tagged filter value.
///
/// Which variant a list becomes is decided at construction from the key name (see
/// [`FilterValue::list`]). Compilation re-checks the key, so a `Set` that ends up under a
/// pattern key still sends only its first element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Scalar(ParamValue),
    /// Membership test, compiled to `key_in=a,b,c`.
    Set(Vec<ParamValue>),
    /// Substring match; only the first element is sent.
    Pattern(Vec<String>),
    Absent,
}

impl FilterValue {
    pub fn scalar(value: impl Into<ParamValue>) -> Self {
        FilterValue::Scalar(value.into())
    }

    /// Classifies a list of values by the key it will be stored under.
    pub fn list<V: Into<ParamValue>>(key: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<ParamValue> = values.into_iter().map(Into::into).collect();
        if is_pattern_key(key) {
            FilterValue::Pattern(values.into_iter().map(|v| v.to_string()).collect())
        } else {
            FilterValue::Set(values)
        }
    }

    /// Absent, null or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Absent => true,
            FilterValue::Scalar(value) => matches!(value, ParamValue::Null),
            FilterValue::Set(values) => values.is_empty(),
            FilterValue::Pattern(values) => values.is_empty(),
        }
    }
}

/// Filter key to value mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<String, FilterValue>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FilterValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    /// Value for `key`, treating a missing key as [`FilterValue::Absent`].
    pub fn value_of(&self, key: &str) -> &FilterValue {
        self.0.get(key).unwrap_or(&FilterValue::Absent)
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FilterValue> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, FilterValue)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, FilterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for FilterSet {
    type Item = (String, FilterValue);
    type IntoIter = btree_map::IntoIter<String, FilterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Wire value for `_order`.
    pub fn as_order(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Everything the compiler reads.
#[derive(Debug, Clone, Copy)]
pub struct QueryInput<'a> {
    pub page: u32,
    pub page_size: u32,
    pub filters: &'a FilterSet,
    pub sorter: Option<&'a SortSpec>,
    pub search_term: &'a str,
}

/// Compiles controller state into backend query parameters.
pub fn compile(input: QueryInput<'_>) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert(PAGE_PARAM, input.page);
    params.insert(LIMIT_PARAM, input.page_size);

    for (key, value) in input.filters.iter() {
        match value {
            FilterValue::Absent => {}
            FilterValue::Scalar(scalar) => params.insert(key.clone(), scalar.clone()),
            // A set stored under a pattern key (from config or a table widget) is
            // still a substring match.
            FilterValue::Set(values) if is_pattern_key(key) => {
                if let Some(first) = values.first() {
                    params.insert(key.clone(), first.clone());
                }
            }
            FilterValue::Set(values) if values.is_empty() => {}
            FilterValue::Set(values) => {
                let joined = values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                params.insert(format!("{key}_in"), joined);
            }
            FilterValue::Pattern(values) => {
                if let Some(first) = values.first() {
                    params.insert(key.clone(), first.clone());
                }
            }
        }
    }

    // Runs after the filter rules so the list branches cannot leak blanks.
    params.prune_blank();

    if let Some(sorter) = input.sorter.filter(|s| !s.field.is_empty()) {
        params.insert(SORT_PARAM, sorter.field.clone());
        params.insert(ORDER_PARAM, sorter.direction.as_order());
    }

    if !input.search_term.is_empty() {
        params.insert(SEARCH_PARAM, input.search_term);
    }

    params
}
