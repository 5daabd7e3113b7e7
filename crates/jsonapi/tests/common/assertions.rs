//! Document and error assertions.

use helios_jsonapi::api::{Document, Resource};
use helios_jsonapi::{BuildResult, DocumentBuildError};
use serde_json::Value;

/// Serializes a document to a JSON value.
pub fn to_json(document: &Document) -> Value {
    serde_json::to_value(document).expect("document serializes")
}

/// Returns the error of a result that must have failed.
pub fn expect_err<T>(result: BuildResult<T>) -> DocumentBuildError {
    match result {
        Ok(_) => panic!("expected the build step to fail"),
        Err(err) => err,
    }
}

/// Asserts the href of a resource link.
pub fn assert_link(resource: &Resource, rel: &str, href: &str) {
    let links = resource
        .links
        .as_ref()
        .unwrap_or_else(|| panic!("{} has no links", resource.api_type));
    let link = links
        .get(rel)
        .unwrap_or_else(|| panic!("{} has no '{}' link", resource.api_type, rel));
    assert_eq!(link.href, href, "'{}' link of {}", rel, resource.api_type);
}

/// Returns the `(type, id)` pairs of the included resources in order.
pub fn included_identities(document: &Document) -> Vec<(String, String)> {
    document
        .included()
        .iter()
        .map(|r| (r.api_type.clone(), r.api_id.clone().unwrap_or_default()))
        .collect()
}
