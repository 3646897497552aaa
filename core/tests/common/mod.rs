//! Test doubles shared by the integration test binaries.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use jsonapi_adapter::{
    CollectionName, Document, Error, HttpRequest, HttpResponse, Resource, Store, Transport,
};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum StoreMiss {
    #[error("{collection} {id} not found in store")]
    NotFound { collection: String, id: String },
    #[error("cannot store a {0} without an id")]
    MissingId(String),
}

/// Normalized in-memory store: collection -> id -> resource.
///
/// Every call is journaled so tests can assert on order and on the absence
/// of mutations.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, BTreeMap<String, Resource>>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn merge(&self, resource: &Resource) -> Result<(), StoreMiss> {
        let id = resource
            .id
            .clone()
            .ok_or_else(|| StoreMiss::MissingId(resource.kind.clone()))?;
        let mut records = self.records.lock().unwrap();
        let collection = records.entry(resource.kind.clone()).or_default();
        match collection.get_mut(&id) {
            Some(existing) => {
                existing.attributes.extend(resource.attributes.clone());
                existing.relationships.extend(resource.relationships.clone());
            }
            None => {
                collection.insert(id, resource.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Partial = Map<String, Value>;
    type Entity = Resource;
    type Error = StoreMiss;

    fn convert(&self, collection: &CollectionName, partial: &Self::Partial) -> Result<Resource, StoreMiss> {
        self.log(format!("convert {collection}"));
        Ok(Resource {
            attributes: partial.clone(),
            ..Resource::new(collection.as_str())
        })
    }

    fn convert_update(
        &self,
        collection: &CollectionName,
        id: &str,
        partial: &Self::Partial,
    ) -> Result<Resource, StoreMiss> {
        self.log(format!("convert {collection} {id}"));
        Ok(Resource {
            attributes: partial.clone(),
            ..Resource::new(collection.as_str()).with_id(id)
        })
    }

    fn push(&self, document: &Document) -> Result<(), StoreMiss> {
        self.log("push".to_string());
        for resource in document.resources().into_iter().chain(&document.included) {
            self.merge(resource)?;
        }
        Ok(())
    }

    fn add(&self, resource: &Resource) -> Result<(), StoreMiss> {
        self.log(format!(
            "add {} {}",
            resource.kind,
            resource.id.as_deref().unwrap_or("")
        ));
        self.merge(resource)
    }

    fn remove(&self, document: &Document) -> Result<(), StoreMiss> {
        self.log("remove".to_string());
        let mut records = self.records.lock().unwrap();
        for resource in document.resources() {
            if let (Some(collection), Some(id)) = (records.get_mut(&resource.kind), &resource.id) {
                collection.remove(id);
            }
        }
        Ok(())
    }

    async fn find(&self, collection: &CollectionName, id: &str) -> Result<Resource, StoreMiss> {
        self.log(format!("find {collection} {id}"));
        self.records
            .lock()
            .unwrap()
            .get(collection.as_str())
            .and_then(|records| records.get(id))
            .cloned()
            .ok_or_else(|| StoreMiss::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn find_all(&self, collection: &CollectionName) -> Result<Vec<Resource>, StoreMiss> {
        self.log(format!("find_all {collection}"));
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(collection.as_str())
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// Replays canned responses in order and records every request sent.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn replying(status: u16, body: &str) -> Self {
        let transport = Self::default();
        transport.responses.lock().unwrap().push_back(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        });
        transport
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.sent.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Connection("no scripted response left".to_string()))
    }
}
