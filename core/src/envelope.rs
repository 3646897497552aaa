//! Classification of HTTP responses into JSON:API documents or errors.
//!
//! # Design
//! The body is parsed to a generic JSON value first so that "not JSON at all"
//! (a proxy's HTML error page) is told apart from "JSON, but not a document".
//! The status code decides which member must be present: `errors` for
//! status >= 400, `data` otherwise. Failures are classified on that value
//! alone; only a successful response is decoded into a typed [`Document`].

use serde_json::Value;

use crate::document::{Document, ErrorObject};
use crate::error::Error;
use crate::http::HttpResponse;

/// First status code treated as a failure.
const FAILURE_STATUS: u16 = 400;

/// Parse and classify `response`, returning the document unchanged on success.
pub fn validate(response: &HttpResponse) -> Result<Document, Error> {
    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(status = response.status, "response body is not JSON");
            return Err(Error::Transport(response.body.clone()));
        }
    };
    if !value.is_object() {
        return Err(Error::MalformedDocument(
            "top-level value must be an object".to_string(),
        ));
    }

    if response.status >= FAILURE_STATUS {
        return Err(api_error(response.status, &value));
    }
    if value.get("data").map_or(true, Value::is_null) {
        tracing::warn!(status = response.status, "response document has no data");
        return Err(Error::MissingData);
    }

    let document: Document =
        serde_json::from_value(value).map_err(|e| Error::MalformedDocument(e.to_string()))?;
    tracing::debug!(status = response.status, "response document accepted");
    Ok(document)
}

/// Only `errors[0].title` and `errors[0].detail` are required. Error objects
/// that do not decode are left out of the carried list.
fn api_error(status: u16, value: &Value) -> Error {
    let raw = match value.get("errors") {
        Some(Value::Array(raw)) if !raw.is_empty() => raw,
        _ => {
            tracing::warn!(status, "error response carries no error objects");
            return Error::MissingErrors { status };
        }
    };
    let errors: Vec<ErrorObject> = raw
        .iter()
        .filter_map(|error| serde_json::from_value(error.clone()).ok())
        .collect();

    let first = &raw[0];
    match (first["title"].as_str(), first["detail"].as_str()) {
        (Some(title), Some(detail)) => {
            tracing::debug!(status, %title, "server rejected request");
            Error::Api {
                status,
                title: title.to_string(),
                detail: detail.to_string(),
                errors,
            }
        }
        _ => Error::MalformedErrors { status, errors },
    }
}
