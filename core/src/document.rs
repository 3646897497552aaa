//! JSON:API wire types.
//!
//! # Design
//! These types describe the top-level document and resource objects exactly
//! as they travel over the wire. They are independent from whatever shape the
//! store keeps locally; the store's `convert` step produces a `Resource` and
//! its `push`/`remove` steps consume a `Document`.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One JSON:API resource object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    /// Absent on create payloads when the server assigns ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Resource {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            attributes: Map::new(),
            relationships: Map::new(),
            links: None,
            meta: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// To-one relationship linkage `{ "data": { "type", "id" } }`.
    pub fn with_relationship(
        mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        let linkage = serde_json::json!({ "data": { "type": kind.into(), "id": id.into() } });
        self.relationships.insert(name.into(), linkage);
        self
    }
}

/// Primary data of a document: one resource or a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    One(Box<Resource>),
    Many(Vec<Resource>),
}

/// Top-level JSON:API document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// `null` is folded into `None`; both count as "no data".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PrimaryData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonapi: Option<Value>,
}

impl Document {
    /// The single primary resource, if the document carries exactly one.
    pub fn primary_resource(&self) -> Option<&Resource> {
        match &self.data {
            Some(PrimaryData::One(resource)) => Some(resource.as_ref()),
            _ => None,
        }
    }

    /// All primary resources, whether the document holds one or many.
    pub fn resources(&self) -> Vec<&Resource> {
        match &self.data {
            Some(PrimaryData::One(resource)) => vec![resource.as_ref()],
            Some(PrimaryData::Many(resources)) => resources.iter().collect(),
            None => Vec::new(),
        }
    }
}

/// One entry of a document's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Servers disagree on `"404"` versus `404`; both are kept as text.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_serializes_type_key_and_skips_empty_members() {
        let resource = Resource::new("widgets").with_attribute("name", "x");
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "widgets", "attributes": { "name": "x" } }));
    }

    #[test]
    fn null_data_counts_as_absent() {
        let doc: Document = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(doc.data.is_none());
    }

    #[test]
    fn collection_data_deserializes_as_many() {
        let doc: Document =
            serde_json::from_str(r#"{"data":[{"type":"widgets","id":"1"},{"type":"widgets","id":"2"}]}"#)
                .unwrap();
        assert!(doc.primary_resource().is_none());
        let ids: Vec<_> = doc.resources().iter().map(|r| r.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn relationship_linkage_shape() {
        let resource = Resource::new("comments").with_relationship("post", "posts", "9");
        assert_eq!(
            resource.relationships["post"],
            serde_json::json!({ "data": { "type": "posts", "id": "9" } })
        );
    }

    #[test]
    fn error_object_accepts_numeric_status_and_code() {
        let error: ErrorObject = serde_json::from_str(
            r#"{"id":12,"status":422,"code":"E42","title":"Invalid"}"#,
        )
        .unwrap();
        assert_eq!(error.id.as_deref(), Some("12"));
        assert_eq!(error.status.as_deref(), Some("422"));
        assert_eq!(error.code.as_deref(), Some("E42"));
    }
}
