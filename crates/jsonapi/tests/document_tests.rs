//! Document building tests.
//!
//! Covers the fluent builders end to end:
//! - Document types (resource, collection, identifier, null, empty, errors)
//! - Resource deduplication and included ordering
//! - Linkage merging between relationship builders and included resources
//! - Sparse fieldsets
//! - Usage errors and inert builders

mod common;

use common::assertions::{assert_link, expect_err, included_identities, to_json};
use common::fixtures::{article, comment, identifier, model, person, request, testing};
use helios_jsonapi::api::{
    DocumentType, ErrorObject, Link, Links, PrimaryData, ResourceLinkage,
};
use helios_jsonapi::error::BuildUsageError;
use helios_jsonapi::{DocumentBuildError, DocumentBuilder, DocumentConfig};
use serde_json::json;

#[test]
fn test_resource_document_with_included_author() {
    let article = article(1);
    let document = DocumentBuilder::new(model(), &request("http://example.com/articles/1"))
        .unwrap()
        .links()
        .unwrap()
        .add_self_link()
        .unwrap()
        .links_end()
        .resource(article.clone())
        .unwrap()
        .links()
        .unwrap()
        .add_self_link()
        .unwrap()
        .links_end()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_one(&article, "author", person(9, "Dan Gebhardt"))
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    assert_eq!(document.document_type, DocumentType::ResourceDocument);
    assert_eq!(
        to_json(&document),
        json!({
            "links": { "self": "http://example.com/articles/1" },
            "data": {
                "type": "articles",
                "id": "1",
                "attributes": {
                    "title": "Article 1",
                    "body": "The shortest article. Ever."
                },
                "relationships": {
                    "author": { "data": { "type": "people", "id": "9" } }
                },
                "links": { "self": "http://example.com/articles/1" }
            },
            "included": [
                {
                    "type": "people",
                    "id": "9",
                    "attributes": { "name": "Dan Gebhardt" }
                }
            ]
        })
    );
}

#[test]
fn test_collection_document() {
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource_collection(vec![article(1), article(2)])
        .unwrap()
        .meta_each([json!({"rank": 1}), json!({"rank": 2})])
        .unwrap()
        .resource_end()
        .unwrap()
        .write_document()
        .unwrap();

    assert_eq!(document.document_type, DocumentType::ResourceCollectionDocument);
    let resources = document.resources();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].api_id.as_deref(), Some("1"));
    assert_eq!(resources[1].meta, Some(json!({"rank": 2})));
    assert!(document.included.is_none());
}

#[test]
fn test_duplicate_included_resource_is_emitted_once() {
    let first = article(1);
    let second = article(2);
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource_collection(vec![first.clone(), second.clone()])
        .unwrap()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_one_each(
            "author",
            [(&first, person(9, "Dan")), (&second, person(9, "Daniel"))],
        )
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    assert_eq!(
        included_identities(&document),
        vec![("people".to_string(), "9".to_string())]
    );
    // Attributes come from the first presentation only.
    assert_eq!(document.included()[0].attribute("name"), Some(&json!("Dan")));

    for resource in document.resources() {
        let author = resource
            .relationships
            .as_ref()
            .and_then(|r| r.get("author"))
            .unwrap();
        assert_eq!(
            author.data,
            Some(ResourceLinkage::to_one(identifier("people", "9")))
        );
    }
}

#[test]
fn test_primary_resource_is_not_included_again() {
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource_collection(vec![article(1), article(2)])
        .unwrap()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .resource(article(1))
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    assert_eq!(document.resources().len(), 2);
    assert!(document.included().is_empty());
    assert!(to_json(&document).get("included").is_none());
}

#[test]
fn test_included_resources_are_sorted_by_type_then_id() {
    let article = article(1);
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article.clone())
        .unwrap()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .resource(person(3, "Three"))
        .unwrap()
        .resource_end()
        .unwrap()
        .to_many(&article, "comments", vec![comment(1)])
        .unwrap()
        .resource_end()
        .unwrap()
        .resource(person(1, "One"))
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    assert_eq!(
        included_identities(&document),
        vec![
            ("comments".to_string(), "1".to_string()),
            ("people".to_string(), "1".to_string()),
            ("people".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn test_direct_and_included_to_many_linkage_are_unioned() {
    let article = article(1);
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article.clone())
        .unwrap()
        .relationships()
        .unwrap()
        .relationship("comments")
        .unwrap()
        .data_many([identifier("comments", "5")])
        .unwrap()
        .relationship_end()
        .relationships_end()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_many(&article, "comments", vec![comment(5), comment(12)])
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    let comments = document
        .resource()
        .and_then(|r| r.relationships.as_ref())
        .and_then(|r| r.get("comments"))
        .unwrap();
    assert_eq!(
        comments.data,
        Some(ResourceLinkage::ToMany(vec![
            identifier("comments", "5"),
            identifier("comments", "12"),
        ]))
    );
    assert_eq!(document.included().len(), 2);
}

#[test]
fn test_empty_to_many_and_null_to_one_linkage() {
    let article = article(1);
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article.clone())
        .unwrap()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_many(&article, "comments", Vec::<common::fixtures::Comment>::new())
        .unwrap()
        .resource_end()
        .unwrap()
        .to_one_null(&article, "author")
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    let value = to_json(&document);
    assert_eq!(
        value["data"]["relationships"],
        json!({
            "author": { "data": null },
            "comments": { "data": [] }
        })
    );
    assert!(value.get("included").is_none());
}

#[test]
fn test_agreeing_to_one_linkage_is_accepted() {
    let article = article(1);
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article.clone())
        .unwrap()
        .relationships()
        .unwrap()
        .relationship("author")
        .unwrap()
        .data(Some(identifier("people", "9")))
        .unwrap()
        .relationship_end()
        .relationships_end()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_one(&article, "author", person(9, "Dan"))
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    assert_eq!(
        to_json(&document)["data"]["relationships"]["author"]["data"],
        json!({"type": "people", "id": "9"})
    );
}

#[test]
fn test_conflicting_to_one_linkage_fails_the_build() {
    let article = article(1);
    let builder = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article.clone())
        .unwrap()
        .relationships()
        .unwrap()
        .relationship("author")
        .unwrap()
        .data(Some(identifier("people", "2")))
        .unwrap()
        .relationship_end()
        .relationships_end()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_one(&article, "author", person(9, "Dan"))
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end();

    let err = expect_err(builder.write_document());
    assert!(err.is_linkage_conflict());
    let message = err.to_string();
    assert!(message.contains("articles/1"));
    assert!(message.contains("people/2"));
    assert!(message.contains("people/9"));
}

#[test]
fn test_included_to_one_declared_twice_with_different_targets_conflicts() {
    let article = article(1);
    let builder = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article.clone())
        .unwrap()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_one(&article, "author", person(9, "Dan"))
        .unwrap()
        .resource_end()
        .unwrap()
        .to_one(&article, "author", person(2, "Steve"))
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end();

    let err = expect_err(builder.write_document());
    assert!(err.is_linkage_conflict());
    let message = err.to_string();
    assert!(message.contains("articles/1"));
    assert!(message.contains("author"));
    assert!(message.contains("people/9"));
    assert!(message.contains("people/2"));
}

#[test]
fn test_included_to_one_declared_twice_with_same_target_is_idempotent() {
    let article = article(1);
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article.clone())
        .unwrap()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_one(&article, "author", person(9, "Dan"))
        .unwrap()
        .resource_end()
        .unwrap()
        .to_one(&article, "author", person(9, "Dan"))
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    assert_eq!(
        to_json(&document)["data"]["relationships"]["author"]["data"],
        json!({"type": "people", "id": "9"})
    );
    assert_eq!(document.included().len(), 1);
}

#[test]
fn test_meta_of_repeated_resource_stays_with_first_builder() {
    let article = article(1);
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article.clone())
        .unwrap()
        .resource_end()
        .unwrap()
        .included()
        .unwrap()
        .to_one(&article, "author", person(9, "Dan"))
        .unwrap()
        .meta(json!({"role": "author"}))
        .unwrap()
        .resource_end()
        .unwrap()
        .resource(person(9, "Dan"))
        .unwrap()
        .meta(json!({"role": "reviewer"}))
        .unwrap()
        .resource_end()
        .unwrap()
        .included_end()
        .write_document()
        .unwrap();

    assert_eq!(document.included().len(), 1);
    assert_eq!(document.included()[0].meta, Some(json!({"role": "author"})));
}

#[test]
fn test_sparse_fieldsets_filter_attributes_and_relationships() {
    let article = article(1);
    let build = |config: DocumentConfig| {
        DocumentBuilder::new(model(), &config)
            .unwrap()
            .resource(article.clone())
            .unwrap()
            .relationships()
            .unwrap()
            .relationship("comments")
            .unwrap()
            .links()
            .unwrap()
            .add_related_link()
            .unwrap()
            .links_end()
            .relationship_end()
            .relationships_end()
            .resource_end()
            .unwrap()
            .included()
            .unwrap()
            .to_one(&article, "author", person(9, "Dan"))
            .unwrap()
            .resource_end()
            .unwrap()
            .included_end()
            .write_document()
            .unwrap()
    };

    let sparse = build(request(
        "http://example.com/articles/1?fields[articles]=title&fields[people]=",
    ));
    let value = to_json(&sparse);
    assert_eq!(value["data"]["attributes"], json!({"title": "Article 1"}));
    // Unrequested relationships keep their linkage; link-only ones vanish.
    assert_eq!(
        value["data"]["relationships"],
        json!({"author": {"data": {"type": "people", "id": "9"}}})
    );
    assert!(value["included"][0].get("attributes").is_none());

    let full = build(DocumentConfig {
        sparse_fieldsets: false,
        ..request("http://example.com/articles/1?fields[articles]=title")
    });
    let value = to_json(&full);
    assert_eq!(value["data"]["attributes"]["body"], "The shortest article. Ever.");
    assert_eq!(
        value["data"]["relationships"]["comments"],
        json!({"links": {"related": "http://example.com/articles/1/comments"}})
    );
}

#[test]
fn test_identifier_documents() {
    let single = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource_identifier(identifier("people", "9"))
        .unwrap()
        .meta(json!({"primary": true}))
        .unwrap()
        .resource_identifier_end()
        .write_document()
        .unwrap();
    assert_eq!(
        to_json(&single),
        json!({"data": {"type": "people", "id": "9", "meta": {"primary": true}}})
    );

    let collection = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource_identifier_collection([identifier("comments", "5"), identifier("comments", "12")])
        .unwrap()
        .resource_identifier_end()
        .write_document()
        .unwrap();
    assert_eq!(
        collection.data,
        Some(PrimaryData::Identifiers(vec![
            identifier("comments", "5"),
            identifier("comments", "12"),
        ]))
    );
}

#[test]
fn test_null_and_empty_documents() {
    let null = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .null_resource()
        .unwrap()
        .write_document()
        .unwrap();
    assert_eq!(null.document_type, DocumentType::NullDocument);
    assert_eq!(to_json(&null), json!({"data": null}));

    let empty = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .meta(json!({"total": 0}))
        .unwrap()
        .empty()
        .unwrap()
        .write_document()
        .unwrap();
    assert_eq!(to_json(&empty), json!({"meta": {"total": 0}, "data": []}));
}

#[test]
fn test_errors_document() {
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .error(ErrorObject::new("404", "Not Found"))
        .unwrap()
        .errors([ErrorObject::new("422", "Invalid Attribute").with_detail("title is blank")])
        .unwrap()
        .write_document()
        .unwrap();

    assert_eq!(document.document_type, DocumentType::ErrorsDocument);
    let value = to_json(&document);
    assert_eq!(value["errors"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["errors"][1]["detail"], "title is blank");
    assert!(value.get("data").is_none());
}

#[test]
fn test_jsonapi_version_and_meta() {
    let config = DocumentConfig {
        version: Some("1.0".to_string()),
        ..testing()
    };
    let document = DocumentBuilder::new(model(), &config)
        .unwrap()
        .meta(json!({"copyright": "Helios"}))
        .unwrap()
        .write_document()
        .unwrap();

    assert_eq!(document.document_type, DocumentType::Document);
    assert_eq!(
        to_json(&document),
        json!({"jsonapi": {"version": "1.0"}, "meta": {"copyright": "Helios"}})
    );
}

#[test]
fn test_primary_data_cannot_be_declared_twice() {
    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .null_resource()
            .unwrap()
            .null_resource(),
    );
    assert!(matches!(
        err,
        DocumentBuildError::Usage(BuildUsageError::PrimaryDataAlreadySet { .. })
    ));
}

#[test]
fn test_document_type_conflict() {
    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .error(ErrorObject::new("500", "Server Error"))
            .unwrap()
            .resource(article(1)),
    );
    assert!(matches!(
        err,
        DocumentBuildError::Usage(BuildUsageError::DocumentTypeConflict { .. })
    ));
}

#[test]
fn test_included_requires_resource_primary_data() {
    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .resource_identifier(identifier("people", "9"))
            .unwrap()
            .resource_identifier_end()
            .included(),
    );
    assert!(matches!(
        err,
        DocumentBuildError::Usage(BuildUsageError::IncludedNotAllowed { .. })
    ));
}

#[test]
fn test_collection_overload_on_single_resource_is_rejected() {
    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .resource(article(1))
            .unwrap()
            .meta_each([json!({})]),
    );
    assert!(matches!(
        err,
        DocumentBuildError::Usage(BuildUsageError::CardinalityMismatch { .. })
    ));
    assert!(err.to_string().contains("articles"));
}

#[test]
fn test_value_count_must_match_bound_resources() {
    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .resource_collection(vec![article(1), article(2)])
            .unwrap()
            .links()
            .unwrap()
            .add_link_href_each("describedby", ["/schemas/article"]),
    );
    assert!(matches!(
        err,
        DocumentBuildError::Usage(BuildUsageError::ItemCountMismatch {
            expected: 2,
            actual: 1,
            ..
        })
    ));
}

#[test]
fn test_linkage_must_match_declared_cardinality() {
    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .resource(article(1))
            .unwrap()
            .relationships()
            .unwrap()
            .relationship("comments")
            .unwrap()
            .data(Some(identifier("comments", "5"))),
    );
    assert!(matches!(
        err,
        DocumentBuildError::Usage(BuildUsageError::RelationshipCardinalityMismatch { .. })
    ));

    let article = article(1);
    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .resource(article.clone())
            .unwrap()
            .resource_end()
            .unwrap()
            .included()
            .unwrap()
            .to_one(&article, "comments", comment(5)),
    );
    assert!(err.is_usage_error());
}

#[test]
fn test_unknown_relationship_is_a_service_model_error() {
    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .resource(article(1))
            .unwrap()
            .relationships()
            .unwrap()
            .relationship("tags"),
    );
    assert!(matches!(err, DocumentBuildError::ServiceModel(_)));
    assert!(err.to_string().contains("tags"));
}

#[test]
fn test_inert_builders_accept_calls_and_change_nothing() {
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource_collection(vec![article(1), article(2)])
        .unwrap()
        .links_if(|a| a.id > 10)
        .unwrap()
        .add_link_href_each("describedby", ["a", "b", "c"])
        .unwrap()
        .add_self_link()
        .unwrap()
        .links_end()
        .relationships()
        .unwrap()
        .relationship_if("author", |_| false)
        .unwrap()
        .data_each([None])
        .unwrap()
        .meta(json!({"ignored": true}))
        .unwrap()
        .links()
        .unwrap()
        .add_related_link()
        .unwrap()
        .links_end()
        .relationship_end()
        .relationships_end()
        .resource_end()
        .unwrap()
        .write_document()
        .unwrap();

    for resource in document.resources() {
        assert!(resource.links.is_none());
        assert!(resource.relationships.is_none());
    }
}

#[test]
fn test_predicate_selects_resources() {
    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource_collection(vec![article(1), article(2)])
        .unwrap()
        .links_if(|a| a.id == 2)
        .unwrap()
        .add_self_link()
        .unwrap()
        .links_end()
        .resource_end()
        .unwrap()
        .write_document()
        .unwrap();

    let resources = document.resources();
    assert!(resources[0].links.is_none());
    assert_link(&resources[1], "self", "http://example.com/articles/2");
}

#[test]
fn test_verbatim_links_are_read_only() {
    let links = Links::new().with("self", Link::new("http://cdn.example.com/articles/1"));

    let document = DocumentBuilder::new(model(), &testing())
        .unwrap()
        .resource(article(1))
        .unwrap()
        .set_links(links.clone())
        .unwrap()
        .resource_end()
        .unwrap()
        .write_document()
        .unwrap();
    assert_eq!(document.resource().and_then(|r| r.links.clone()), Some(links.clone()));

    let err = expect_err(
        DocumentBuilder::new(model(), &testing())
            .unwrap()
            .resource(article(1))
            .unwrap()
            .set_links(links)
            .unwrap()
            .links(),
    );
    assert!(err.is_internal());
}
