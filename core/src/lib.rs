//! JSON:API adapter: CRUD intentions in, HTTP requests out, store mutations back.
//!
//! # Overview
//! Application code asks for `create`, `load`, `update` or `destroy` against a
//! local [`Store`]. The adapter builds the JSON:API request (URL, query,
//! headers, `{ "data": ... }` body), hands it to a [`Transport`], validates
//! the response envelope and reconciles the result into the store.
//!
//! # Design
//! - `JsonApiAdapter` holds only an immutable [`AdapterConfig`] and a transport.
//! - Request building (`build_*`, [`build_url`]) and response validation
//!   ([`envelope::validate`]) are pure; the transport is the only I/O.
//! - [`RequestPath`] (what goes on the wire) and [`CollectionName`] (what the
//!   store is keyed by) are separate types with one explicit mapping.
//! - The store is an external collaborator described by the [`Store`] trait.

pub mod adapter;
pub mod config;
pub mod document;
pub mod envelope;
pub mod error;
pub mod http;
pub mod options;
pub mod path;
pub mod store;
pub mod transport;

pub use adapter::{build_url, JsonApiAdapter, Loaded};
pub use config::AdapterConfig;
pub use document::{Document, ErrorObject, PrimaryData, Resource};
pub use error::{Error, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, JSON_API_MEDIA_TYPE};
pub use options::RequestOptions;
pub use path::{CollectionName, RequestPath};
pub use store::Store;
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
