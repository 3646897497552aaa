//! CRUD against a JSON:API backend, reconciled into a local store.
//!
//! # Design
//! `JsonApiAdapter` holds only its configuration and a transport. Every
//! operation is one linear pipeline:
//!
//! 1. ask the store for a payload (create/update),
//! 2. build an `HttpRequest` (`build_*`, pure),
//! 3. send it through the transport,
//! 4. validate the envelope,
//! 5. reconcile into the store and look the result up.
//!
//! Any stage may fail, and the store is only touched after step 4 succeeds.
//! Concurrent calls are not ordered against each other.

use serde::Serialize;

use crate::config::AdapterConfig;
use crate::document::{Document, Resource};
use crate::envelope;
use crate::error::Error;
use crate::http::{HttpMethod, HttpRequest, JSON_API_MEDIA_TYPE};
use crate::options::RequestOptions;
use crate::path::{CollectionName, RequestPath};
use crate::store::Store;
use crate::transport::Transport;

/// Result of [`JsonApiAdapter::load`]: one entity when an id was given, the
/// whole collection otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<E> {
    One(E),
    Many(Vec<E>),
}

impl<E> Loaded<E> {
    pub fn into_one(self) -> Option<E> {
        match self {
            Loaded::One(entity) => Some(entity),
            Loaded::Many(_) => None,
        }
    }

    pub fn into_many(self) -> Option<Vec<E>> {
        match self {
            Loaded::One(_) => None,
            Loaded::Many(entities) => Some(entities),
        }
    }
}

/// Request body wrapper `{ "data": ... }`.
#[derive(Serialize)]
struct RequestBody<'a> {
    data: &'a Resource,
}

/// Fully qualified URL for `path`, optional `id` and `options`.
///
/// `base` is used verbatim; an empty `id` counts as absent.
pub fn build_url(base: &str, path: &RequestPath, id: Option<&str>, options: &RequestOptions) -> String {
    let segment = path.url_segment();
    let mut url = match present(id) {
        Some(id) => format!("{base}/{segment}/{id}"),
        None => format!("{base}/{segment}"),
    };
    if let Some(query) = options.query_string() {
        url.push('?');
        url.push_str(&query);
    }
    url
}

fn present(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.is_empty())
}

#[derive(Debug, Clone)]
pub struct JsonApiAdapter<T> {
    config: AdapterConfig,
    transport: T,
}

#[cfg(feature = "ureq")]
impl JsonApiAdapter<crate::transport::UreqTransport> {
    /// Adapter using a default `ureq` agent.
    pub fn with_ureq(config: AdapterConfig) -> Self {
        Self::new(config, crate::transport::UreqTransport::new())
    }
}

impl<T: Transport> JsonApiAdapter<T> {
    pub fn new(mut config: AdapterConfig, transport: T) -> Self {
        config.base = config.normalized_base().to_string();
        Self { config, transport }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn url(&self, path: &RequestPath, id: Option<&str>, options: &RequestOptions) -> String {
        build_url(&self.config.base, path, id, options)
    }

    /// Configured headers first, then the JSON:API media-type headers, which
    /// replace any configured header of the same name.
    fn headers(&self) -> Vec<(String, String)> {
        let fixed = [("Accept", JSON_API_MEDIA_TYPE), ("Content-Type", JSON_API_MEDIA_TYPE)];
        let mut headers: Vec<(String, String)> = self
            .config
            .additional_headers
            .iter()
            .filter(|(name, _)| !fixed.iter().any(|(fixed_name, _)| name.eq_ignore_ascii_case(fixed_name)))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        headers.extend(
            fixed
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );
        headers
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: self.headers(),
            body,
        }
    }

    pub fn build_create(
        &self,
        path: &RequestPath,
        payload: &Resource,
        options: &RequestOptions,
    ) -> Result<HttpRequest, Error> {
        let body = encode_body(payload)?;
        Ok(self.request(HttpMethod::Post, self.url(path, None, options), Some(body)))
    }

    pub fn build_load(&self, path: &RequestPath, id: Option<&str>, options: &RequestOptions) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(path, id, options), None)
    }

    pub fn build_update(
        &self,
        path: &RequestPath,
        id: &str,
        payload: &Resource,
        options: &RequestOptions,
    ) -> Result<HttpRequest, Error> {
        let body = encode_body(payload)?;
        Ok(self.request(HttpMethod::Patch, self.url(path, Some(id), options), Some(body)))
    }

    /// DELETE carries no body.
    pub fn build_destroy(&self, path: &RequestPath, id: &str, options: &RequestOptions) -> HttpRequest {
        self.request(HttpMethod::Delete, self.url(path, Some(id), options), None)
    }

    /// Send `request` and validate the response envelope.
    pub async fn execute(&self, request: HttpRequest) -> Result<Document, Error> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(request).await?;
        envelope::validate(&response)
    }

    /// Create a record and return the store's view of it, keyed by the type
    /// and id the server echoed back.
    pub async fn create<S: Store>(
        &self,
        store: &S,
        path: &RequestPath,
        partial: &S::Partial,
        options: &RequestOptions,
    ) -> Result<S::Entity, Error> {
        let payload = store.convert(&path.collection(), partial).map_err(Error::store)?;
        let document = self.execute(self.build_create(path, &payload, options)?).await?;

        let (collection, id) = created_identity(&document)?;
        store.push(&document).map_err(Error::store)?;
        store.find(&collection, &id).await.map_err(Error::store)
    }

    /// Fetch one record (`id` given) or a collection and reconcile it.
    ///
    /// `path` may be compound (`users/5/posts`); lookups use its final
    /// segment while the URL keeps the full path.
    pub async fn load<S: Store>(
        &self,
        store: &S,
        path: &RequestPath,
        id: Option<&str>,
        options: &RequestOptions,
    ) -> Result<Loaded<S::Entity>, Error> {
        let collection = path.collection();
        let id = present(id);
        let document = self.execute(self.build_load(path, id, options)).await?;

        store.push(&document).map_err(Error::store)?;
        let loaded = match id {
            Some(id) => store.find(&collection, id).await.map(Loaded::One),
            None => store.find_all(&collection).await.map(Loaded::Many),
        };
        loaded.map_err(Error::store)
    }

    /// Collection load; same as [`load`](Self::load) without an id.
    pub async fn load_all<S: Store>(
        &self,
        store: &S,
        path: &RequestPath,
        options: &RequestOptions,
    ) -> Result<Vec<S::Entity>, Error> {
        let loaded = self.load(store, path, None, options).await?;
        Ok(loaded.into_many().unwrap_or_default())
    }

    /// Patch record `id`. The locally built payload, not the server's echo,
    /// is merged into the store before reading the record back.
    ///
    /// For a compound path such as `users/5/blog_posts` the URL keeps the
    /// full path, while `convert_update` and `find` receive the final
    /// segment (`blog_posts`), the same collection `load` reads from.
    pub async fn update<S: Store>(
        &self,
        store: &S,
        path: &RequestPath,
        id: &str,
        partial: &S::Partial,
        options: &RequestOptions,
    ) -> Result<S::Entity, Error> {
        let collection = path.collection();
        let payload = store
            .convert_update(&collection, id, partial)
            .map_err(Error::store)?;
        self.execute(self.build_update(path, id, &payload, options)?).await?;

        store.add(&payload).map_err(Error::store)?;
        store.find(&collection, id).await.map_err(Error::store)
    }

    /// Delete record `id`; the response document tells the store what to evict.
    pub async fn destroy<S: Store>(
        &self,
        store: &S,
        path: &RequestPath,
        id: &str,
        options: &RequestOptions,
    ) -> Result<(), Error> {
        let document = self.execute(self.build_destroy(path, id, options)).await?;
        store.remove(&document).map_err(Error::store)
    }
}

fn encode_body(payload: &Resource) -> Result<String, Error> {
    serde_json::to_string(&RequestBody { data: payload }).map_err(|e| Error::Serialization(e.to_string()))
}

fn created_identity(document: &Document) -> Result<(CollectionName, String), Error> {
    let resource = document
        .primary_resource()
        .ok_or_else(|| Error::MalformedDocument("create response must hold a single resource".to_string()))?;
    let id = resource
        .id
        .clone()
        .ok_or_else(|| Error::MalformedDocument("created resource has no id".to_string()))?;
    Ok((CollectionName::new(resource.kind.clone()), id))
}
