//! Query options and their flattening into a query string.
//!
//! # Design
//! `RequestOptions` keeps the two JSON:API families that need bracketed keys
//! (`fields`, `filter`) apart from the free-form extras. Nothing is mutated
//! while building a URL: [`RequestOptions::query_pairs`] derives a fresh,
//! sorted list of flat pairs every time it is called.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters left unescaped by `encodeURIComponent`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Caller-supplied query modifiers for one request.
///
/// `fields` maps a resource type to its sparse fieldset (`"title,body"`),
/// `filter` maps a field to the value to filter on, and `extra` holds every
/// other parameter (`include`, `sort`, `page[size]`, ...) verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOptions")]
pub struct RequestOptions {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filter: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sparse fieldset for `resource_type`, emitted as `fields[resource_type]`.
    pub fn field(mut self, resource_type: impl Into<String>, fields: impl Into<String>) -> Self {
        self.fields.insert(resource_type.into(), fields.into());
        self
    }

    /// Filter on `field`, emitted as `filter[field]`.
    pub fn filter(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.filter.insert(field.into(), value.to_string());
        self
    }

    /// Any other flat parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra.insert(key.into(), value.to_string());
        self
    }

    pub fn include(self, relationships: &str) -> Self {
        self.param("include", relationships)
    }

    pub fn sort(self, keys: &str) -> Self {
        self.param("sort", keys)
    }

    /// Flat `(key, raw value)` pairs sorted by key.
    ///
    /// `fields` and `filter` entries become `fields[..]` / `filter[..]` keys
    /// and take precedence over an extra parameter with the same key.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut flat = self.extra.clone();
        flat.extend(bracketed("fields", &self.fields));
        flat.extend(bracketed("filter", &self.filter));
        flat.into_iter().collect()
    }

    /// Encoded query string without the leading `?`, or `None` when there are
    /// no parameters.
    pub fn query_string(&self) -> Option<String> {
        let pairs = self.query_pairs();
        if pairs.is_empty() {
            return None;
        }
        let encoded: Vec<String> = pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, QUERY_VALUE)))
            .collect();
        Some(encoded.join("&"))
    }
}

fn bracketed<'a>(
    family: &'a str,
    entries: &'a BTreeMap<String, String>,
) -> impl Iterator<Item = (String, String)> + 'a {
    entries
        .iter()
        .map(move |(name, value)| (format!("{family}[{name}]"), value.clone()))
}

/// Lenient shape accepted when options come from JSON or config files:
/// scalar values of any JSON type are stringified.
#[derive(Deserialize)]
struct RawOptions {
    #[serde(default)]
    fields: BTreeMap<String, Value>,
    #[serde(default)]
    filter: BTreeMap<String, Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<RawOptions> for RequestOptions {
    fn from(raw: RawOptions) -> Self {
        let stringify = |map: BTreeMap<String, Value>| -> BTreeMap<String, String> {
            map.into_iter()
                .map(|(key, value)| (key, scalar_to_string(value)))
                .collect()
        };
        Self {
            fields: stringify(raw.fields),
            filter: stringify(raw.filter),
            extra: stringify(raw.extra),
        }
    }
}

/// Lists join with `,` so `"fields": {"posts": ["title", "body"]}` reads the
/// same as `"title,body"`.
fn scalar_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_produce_no_query() {
        assert_eq!(RequestOptions::new().query_string(), None);
    }

    #[test]
    fn fields_and_filter_are_bracketed_and_sorted() {
        let options = RequestOptions::new()
            .param("sort", "-created")
            .filter("status", "open")
            .field("widgets", "name,size")
            .include("owner");
        let query = options.query_string().unwrap();
        assert_eq!(
            query,
            "fields[widgets]=name%2Csize&filter[status]=open&include=owner&sort=-created"
        );
        assert!(!query.contains("fields="));
        assert!(!query.contains("filter="));
    }

    #[test]
    fn values_use_component_encoding() {
        let options = RequestOptions::new().param("q", "a b&c=d/é!*'()~");
        assert_eq!(
            options.query_string().unwrap(),
            "q=a%20b%26c%3Dd%2F%C3%A9!*'()~"
        );
    }

    #[test]
    fn bracketed_keys_override_same_named_extras() {
        let options = RequestOptions::new()
            .param("filter[name]", "extra")
            .filter("name", "synthesized");
        assert_eq!(
            options.query_pairs(),
            vec![("filter[name]".to_string(), "synthesized".to_string())]
        );
    }

    #[test]
    fn query_pairs_do_not_mutate_options() {
        let options = RequestOptions::new().field("a", "b");
        let first = options.query_string();
        let second = options.query_string();
        assert_eq!(first, second);
        assert_eq!(options.fields.len(), 1);
        assert!(options.extra.is_empty());
    }

    #[test]
    fn deserializes_loose_json_options() {
        let options: RequestOptions = serde_json::from_str(
            r#"{"fields":{"posts":["title","body"]},"filter":{"published":true},"page[size]":10}"#,
        )
        .unwrap();
        assert_eq!(options.fields["posts"], "title,body");
        assert_eq!(options.filter["published"], "true");
        assert_eq!(options.extra["page[size]"], "10");
    }
}
