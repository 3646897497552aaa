//! The entity store the adapter reconciles responses into.
//!
//! The store is owned by the application: it keeps normalized local copies of
//! resources and decides how partial records become wire payloads. The adapter
//! only calls into it, and only after a response has validated.
//!
//! Methods take `&self`; a store shared between concurrent calls provides its
//! own interior mutability and ordering.

use async_trait::async_trait;

use crate::document::{Document, Resource};
use crate::path::CollectionName;

#[async_trait]
pub trait Store: Send + Sync {
    /// Caller-side, possibly incomplete record handed to `create`/`update`.
    type Partial: Send + Sync + ?Sized;
    /// What lookups return to the caller.
    type Entity: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Payload for creating a record; `id` is normally left to the server.
    fn convert(
        &self,
        collection: &CollectionName,
        partial: &Self::Partial,
    ) -> Result<Resource, Self::Error>;

    /// Payload for updating record `id`.
    fn convert_update(
        &self,
        collection: &CollectionName,
        id: &str,
        partial: &Self::Partial,
    ) -> Result<Resource, Self::Error>;

    /// Ingest a full response document.
    fn push(&self, document: &Document) -> Result<(), Self::Error>;

    /// Merge one locally built payload without a server document.
    fn add(&self, resource: &Resource) -> Result<(), Self::Error>;

    /// Evict the record(s) identified by a response document.
    fn remove(&self, document: &Document) -> Result<(), Self::Error>;

    async fn find(&self, collection: &CollectionName, id: &str) -> Result<Self::Entity, Self::Error>;

    async fn find_all(&self, collection: &CollectionName) -> Result<Vec<Self::Entity>, Self::Error>;
}
