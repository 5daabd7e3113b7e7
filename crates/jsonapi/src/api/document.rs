//! Top-level documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error_object::ErrorObject;
use super::link::{Links, Meta};
use super::resource::{Resource, ResourceIdentifier};
use crate::error::InternalError;

/// The closed set of document shapes.
///
/// A document is exactly one of these; the builder fixes the type when
/// primary data or errors are first declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    /// Meta and/or links only.
    Document,
    /// `"data": []` without a resource type.
    EmptyDocument,
    /// Top-level `errors`.
    ErrorsDocument,
    /// `"data": null`.
    NullDocument,
    /// A single primary resource.
    ResourceDocument,
    /// A collection of primary resources.
    ResourceCollectionDocument,
    /// A single resource identifier.
    ResourceIdentifierDocument,
    /// A collection of resource identifiers.
    ResourceIdentifierCollectionDocument,
}

impl DocumentType {
    /// Returns the type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Document => "Document",
            DocumentType::EmptyDocument => "EmptyDocument",
            DocumentType::ErrorsDocument => "ErrorsDocument",
            DocumentType::NullDocument => "NullDocument",
            DocumentType::ResourceDocument => "ResourceDocument",
            DocumentType::ResourceCollectionDocument => "ResourceCollectionDocument",
            DocumentType::ResourceIdentifierDocument => "ResourceIdentifierDocument",
            DocumentType::ResourceIdentifierCollectionDocument => {
                "ResourceIdentifierCollectionDocument"
            }
        }
    }

    /// Returns true for documents whose primary data are full resources.
    pub fn is_resource_bearing(&self) -> bool {
        matches!(
            self,
            DocumentType::ResourceDocument | DocumentType::ResourceCollectionDocument
        )
    }

    /// Returns true for documents whose primary data are resource identifiers.
    pub fn is_identifier_bearing(&self) -> bool {
        matches!(
            self,
            DocumentType::ResourceIdentifierDocument
                | DocumentType::ResourceIdentifierCollectionDocument
        )
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Document" => Ok(DocumentType::Document),
            "EmptyDocument" => Ok(DocumentType::EmptyDocument),
            "ErrorsDocument" => Ok(DocumentType::ErrorsDocument),
            "NullDocument" => Ok(DocumentType::NullDocument),
            "ResourceDocument" => Ok(DocumentType::ResourceDocument),
            "ResourceCollectionDocument" => Ok(DocumentType::ResourceCollectionDocument),
            "ResourceIdentifierDocument" => Ok(DocumentType::ResourceIdentifierDocument),
            "ResourceIdentifierCollectionDocument" => {
                Ok(DocumentType::ResourceIdentifierCollectionDocument)
            }
            other => Err(InternalError::UnknownEnumValue {
                enum_name: "DocumentType",
                value: other.to_string(),
            }),
        }
    }
}

/// The `jsonapi` top-level member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonApiVersion {
    /// Highest JSON:API version supported, e.g. `"1.0"`.
    pub version: String,

    /// Optional meta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl JsonApiVersion {
    /// JSON:API 1.0.
    pub fn v1_0() -> Self {
        Self::new("1.0")
    }

    /// JSON:API 1.1.
    pub fn v1_1() -> Self {
        Self::new("1.1")
    }

    /// Creates a version member.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            meta: None,
        }
    }
}

/// Primary data of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// `"data": null`.
    Null,
    /// A single resource.
    Resource(Box<Resource>),
    /// A collection of resources, possibly empty.
    Resources(Vec<Resource>),
    /// A single resource identifier.
    Identifier(ResourceIdentifier),
    /// A collection of resource identifiers.
    Identifiers(Vec<ResourceIdentifier>),
}

/// A complete JSON:API document.
///
/// # JSON shape
///
/// ```json
/// {
///   "jsonapi": { "version": "1.0" },
///   "links": { "self": "http://example.com/articles/1" },
///   "data": { "type": "articles", "id": "1", "attributes": { … } },
///   "included": [ { "type": "people", "id": "9", … } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The document shape.
    #[serde(skip, default = "default_document_type")]
    pub document_type: DocumentType,

    /// Implementation information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonapi: Option<JsonApiVersion>,

    /// Top-level meta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    /// Top-level links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    /// Primary data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PrimaryData>,

    /// Included resources in canonical order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<Resource>>,

    /// Error objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorObject>>,
}

fn default_document_type() -> DocumentType {
    DocumentType::Document
}

impl Document {
    /// Creates an empty document of the given type.
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            document_type,
            jsonapi: None,
            meta: None,
            links: None,
            data: None,
            included: None,
            errors: None,
        }
    }

    /// Returns the single primary resource, if any.
    pub fn resource(&self) -> Option<&Resource> {
        match &self.data {
            Some(PrimaryData::Resource(resource)) => Some(resource),
            _ => None,
        }
    }

    /// Returns the primary resources of a collection document.
    pub fn resources(&self) -> &[Resource] {
        match &self.data {
            Some(PrimaryData::Resources(resources)) => resources,
            _ => &[],
        }
    }

    /// Returns the included resources.
    pub fn included(&self) -> &[Resource] {
        self.included.as_deref().unwrap_or(&[])
    }

    /// Finds a primary or included resource by identity.
    pub fn find_resource(&self, identifier: &ResourceIdentifier) -> Option<&Resource> {
        self.resource()
            .into_iter()
            .chain(self.resources())
            .chain(self.included())
            .find(|r| r.identifier().as_ref() == Some(identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_type_round_trip_names() {
        for document_type in [
            DocumentType::Document,
            DocumentType::EmptyDocument,
            DocumentType::ErrorsDocument,
            DocumentType::NullDocument,
            DocumentType::ResourceDocument,
            DocumentType::ResourceCollectionDocument,
            DocumentType::ResourceIdentifierDocument,
            DocumentType::ResourceIdentifierCollectionDocument,
        ] {
            assert_eq!(document_type.as_str().parse::<DocumentType>().unwrap(), document_type);
        }
    }

    #[test]
    fn test_unknown_document_type_is_internal_error() {
        let err = "PatchDocument".parse::<DocumentType>().unwrap_err();
        assert!(err.to_string().contains("PatchDocument"));
    }

    #[test]
    fn test_null_and_empty_data_serialization() {
        let mut null_doc = Document::new(DocumentType::NullDocument);
        null_doc.data = Some(PrimaryData::Null);
        assert_eq!(serde_json::to_value(&null_doc).unwrap(), json!({"data": null}));

        let mut empty_doc = Document::new(DocumentType::EmptyDocument);
        empty_doc.data = Some(PrimaryData::Resources(Vec::new()));
        assert_eq!(serde_json::to_value(&empty_doc).unwrap(), json!({"data": []}));
    }
}
