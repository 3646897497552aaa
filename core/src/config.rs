//! Construction-time configuration for an adapter instance.
//!
//! # Design
//! An `AdapterConfig` is read once and owned by one `JsonApiAdapter`; nothing
//! changes it afterwards. It deserializes from any serde source and can also
//! be taken from the environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Environment variable holding the URL prefix.
pub const BASE_URL_ENV: &str = "JSONAPI_BASE_URL";
/// Environment variable holding extra headers as a JSON object.
pub const HEADERS_ENV: &str = "JSONAPI_HEADERS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
    /// Prefix for every request path. Empty means paths stay relative.
    pub base: String,
    /// Headers sent with every request. The two JSON:API media-type headers
    /// always override entries with the same name.
    pub additional_headers: BTreeMap<String, String>,
}

impl AdapterConfig {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            additional_headers: BTreeMap::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.insert(name.into(), value.into());
        self
    }

    /// Read `JSONAPI_BASE_URL` and `JSONAPI_HEADERS`; unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup(BASE_URL_ENV).unwrap_or_default();
        let additional_headers = match lookup(HEADERS_ENV) {
            Some(raw) => parse_headers(&raw)?,
            None => BTreeMap::new(),
        };
        Ok(Self {
            base,
            additional_headers,
        })
    }

    /// Base with any trailing `/` removed.
    pub(crate) fn normalized_base(&self) -> &str {
        self.base.trim_end_matches('/')
    }
}

fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, Error> {
    serde_json::from_str(raw).map_err(|e| Error::Config(format!("{HEADERS_ENV}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty() {
        let config: AdapterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AdapterConfig::default());
        assert_eq!(config.normalized_base(), "");
    }

    #[test]
    fn deserializes_camel_case_keys() {
        let config: AdapterConfig = serde_json::from_str(
            r#"{"base":"https://api.test/v1/","additionalHeaders":{"Authorization":"Bearer t"}}"#,
        )
        .unwrap();
        assert_eq!(config.normalized_base(), "https://api.test/v1");
        assert_eq!(config.additional_headers["Authorization"], "Bearer t");
    }

    #[test]
    fn header_env_must_be_a_json_object() {
        assert!(parse_headers(r#"{"X-Tenant":"acme"}"#).is_ok());
        let err = parse_headers("X-Tenant: acme").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = AdapterConfig::from_lookup(vars(&[])).unwrap();
        assert_eq!(config, AdapterConfig::default());
    }

    #[test]
    fn reads_base_and_headers_from_variables() {
        let config = AdapterConfig::from_lookup(vars(&[
            (BASE_URL_ENV, "https://api.test/v2/"),
            (HEADERS_ENV, r#"{"Authorization":"Bearer t"}"#),
        ]))
        .unwrap();
        assert_eq!(config.normalized_base(), "https://api.test/v2");
        assert_eq!(config.additional_headers["Authorization"], "Bearer t");
    }

    #[test]
    fn invalid_header_variable_is_a_config_error() {
        let err = AdapterConfig::from_lookup(vars(&[(HEADERS_ENV, "[1,2]")])).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.starts_with(HEADERS_ENV)));
    }
}
