use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const JSON_API: &str = "application/vnd.api+json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
}

impl Resource {
    /// True when any relationship links to `{kind, id}`, to-one or to-many.
    fn links_to(&self, kind: &str, id: &str) -> bool {
        let matches = |linkage: &Value| linkage["type"] == kind && linkage["id"] == id;
        self.relationships.values().any(|rel| match &rel["data"] {
            Value::Array(items) => items.iter().any(|item| matches(item)),
            single => matches(single),
        })
    }
}

#[derive(Deserialize)]
pub struct Payload {
    pub data: Resource,
}

const COLLECTION_ROUTE: &str = "/{kind}";
const RESOURCE_ROUTE: &str = "/{kind}/{id}";
const RELATED_ROUTE: &str = "/{parent}/{parent_id}/{kind}";

/// Every route the backend serves; anything else falls through to an HTML 404.
pub const ROUTES: [&str; 3] = [COLLECTION_ROUTE, RESOURCE_ROUTE, RELATED_ROUTE];

/// Collections keyed by type, then records keyed by id.
pub type Db = Arc<RwLock<HashMap<String, BTreeMap<String, Resource>>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route(COLLECTION_ROUTE, get(list_resources).post(create_resource))
        .route(
            RESOURCE_ROUTE,
            get(get_resource).patch(update_resource).delete(delete_resource),
        )
        .route(RELATED_ROUTE, get(list_related))
        .fallback(not_found_page)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// JSON:API error document with a single error object.
pub struct ApiError {
    status: StatusCode,
    title: &'static str,
    detail: String,
}

impl ApiError {
    fn not_found(kind: &str, id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            title: "Not Found",
            detail: format!("no {kind} with id {id}"),
        }
    }

    fn conflict(detail: String) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            title: "Conflict",
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::info!(status = self.status.as_u16(), detail = %self.detail, "request rejected");
        let body = json!({
            "errors": [{
                "status": self.status.as_u16().to_string(),
                "title": self.title,
                "detail": self.detail,
            }]
        });
        document(self.status, body)
    }
}

fn document(status: StatusCode, body: Value) -> Response {
    (status, [(header::CONTENT_TYPE, JSON_API)], Json(body)).into_response()
}

fn primary(status: StatusCode, data: impl Serialize) -> Response {
    document(status, json!({ "data": data }))
}

async fn list_resources(
    State(db): State<Db>,
    Path(kind): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let db = db.read().await;
    let resources: Vec<Resource> = db
        .get(&kind)
        .map(|records| {
            records
                .values()
                .filter(|r| matches_filters(r, &params))
                .map(|r| sparse(r, &params))
                .collect()
        })
        .unwrap_or_default();
    primary(StatusCode::OK, resources)
}

async fn list_related(
    State(db): State<Db>,
    Path((parent, parent_id, kind)): Path<(String, String, String)>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let db = db.read().await;
    let resources: Vec<Resource> = db
        .get(&kind)
        .map(|records| {
            records
                .values()
                .filter(|r| r.links_to(&parent, &parent_id))
                .filter(|r| matches_filters(r, &params))
                .map(|r| sparse(r, &params))
                .collect()
        })
        .unwrap_or_default();
    primary(StatusCode::OK, resources)
}

async fn create_resource(
    State(db): State<Db>,
    Path(kind): Path<String>,
    Json(payload): Json<Payload>,
) -> Result<Response, ApiError> {
    let mut resource = payload.data;
    if resource.kind != kind {
        return Err(ApiError::conflict(format!(
            "resource type {} does not match endpoint {kind}",
            resource.kind
        )));
    }

    let mut db = db.write().await;
    let records = db.entry(kind.clone()).or_default();
    let id = resource
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if records.contains_key(&id) {
        return Err(ApiError::conflict(format!("{kind} {id} already exists")));
    }
    resource.id = Some(id.clone());
    records.insert(id.clone(), resource.clone());

    tracing::info!(%kind, %id, "created resource");
    Ok(primary(StatusCode::CREATED, resource))
}

async fn get_resource(
    State(db): State<Db>,
    Path((kind, id)): Path<(String, String)>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let db = db.read().await;
    let resource = db
        .get(&kind)
        .and_then(|records| records.get(&id))
        .ok_or_else(|| ApiError::not_found(&kind, &id))?;
    Ok(primary(StatusCode::OK, sparse(resource, &params)))
}

async fn update_resource(
    State(db): State<Db>,
    Path((kind, id)): Path<(String, String)>,
    Json(payload): Json<Payload>,
) -> Result<Response, ApiError> {
    let patch = payload.data;
    if patch.kind != kind || patch.id.as_deref().is_some_and(|patch_id| patch_id != id) {
        return Err(ApiError::conflict(format!(
            "payload does not identify {kind} {id}"
        )));
    }

    let mut db = db.write().await;
    let resource = db
        .get_mut(&kind)
        .and_then(|records| records.get_mut(&id))
        .ok_or_else(|| ApiError::not_found(&kind, &id))?;
    resource.attributes.extend(patch.attributes);
    resource.relationships.extend(patch.relationships);

    tracing::info!(%kind, %id, "updated resource");
    Ok(primary(StatusCode::OK, resource.clone()))
}

async fn delete_resource(
    State(db): State<Db>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let mut db = db.write().await;
    db.get_mut(&kind)
        .and_then(|records| records.remove(&id))
        .ok_or_else(|| ApiError::not_found(&kind, &id))?;

    tracing::info!(%kind, %id, "deleted resource");
    Ok(primary(StatusCode::OK, json!({ "type": kind, "id": id })))
}

/// Imitates an upstream proxy page: the body is deliberately not JSON.
async fn not_found_page() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::NOT_FOUND,
        Html("<html><body><h1>404 Not Found</h1></body></html>"),
    )
}

/// `filter[attr]=value` compares against the attribute's string form.
fn matches_filters(resource: &Resource, params: &BTreeMap<String, String>) -> bool {
    params.iter().all(|(key, expected)| match bracketed(key, "filter") {
        Some(attr) => resource
            .attributes
            .get(attr)
            .is_some_and(|value| attribute_text(value) == *expected),
        None => true,
    })
}

/// `fields[type]=a,b` keeps only the listed attributes.
fn sparse(resource: &Resource, params: &BTreeMap<String, String>) -> Resource {
    let Some(wanted) = params.get(&format!("fields[{}]", resource.kind)) else {
        return resource.clone();
    };
    let wanted: Vec<&str> = wanted.split(',').collect();
    let mut trimmed = resource.clone();
    trimmed
        .attributes
        .retain(|name, _| wanted.contains(&name.as_str()));
    trimmed
}

fn bracketed<'a>(key: &'a str, family: &str) -> Option<&'a str> {
    key.strip_prefix(family)?.strip_prefix('[')?.strip_suffix(']')
}

fn attribute_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
