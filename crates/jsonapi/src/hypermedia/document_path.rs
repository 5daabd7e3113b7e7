//! Path context of the document being built, derived from the request URL.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use super::path_builder::PathStep;
use crate::api::keywords;
use crate::service_model::{RelationshipCardinality, ResourceType, ServiceModel};

const RELATIVE_BASE: &str = "http://localhost/";

/// Where the document lives in the API's path hierarchy.
///
/// For a request to `http://example.com/api/articles/1/comments` the
/// context holds the base `http://example.com/api`, one traversal step
/// (`articles/1` over `comments`) and the primary api type `comments`.
/// Primary resources of that type get self paths below the request path.
#[derive(Debug, Clone, Default)]
pub struct DocumentPathContext {
    request_url: Option<Url>,
    base_url: Option<Url>,
    prefix: Vec<String>,
    steps: Vec<PathStep>,
    relationships: bool,
    primary_type: Option<Arc<ResourceType>>,
    primary_api_id: Option<String>,
}

impl DocumentPathContext {
    /// Creates a context without a request URL; links are relative paths.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derives the context from the request URL and an optional base URL.
    ///
    /// An explicit base URL wins over the origin and leading segments of
    /// the request URL.
    pub fn new(model: &ServiceModel, request_url: Option<&Url>, base_url: Option<&Url>) -> Self {
        let mut context = Self {
            request_url: request_url.cloned(),
            base_url: base_url.cloned(),
            ..Self::default()
        };

        let Some(request_url) = request_url else {
            return context;
        };

        let segments: Vec<String> = request_url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let start = segments
            .iter()
            .position(|segment| model.resource_type_by_path_segment(segment).is_some());

        match start {
            None => context.prefix = segments,
            Some(start) => {
                context.prefix = segments[..start].to_vec();
                context.parse_resource_path(model, &segments[start..]);
            }
        }

        if context.base_url.is_none() {
            let mut base = request_url.clone();
            base.set_query(None);
            base.set_fragment(None);
            if let Ok(mut path) = base.path_segments_mut() {
                path.clear().extend(&context.prefix);
            }
            context.base_url = Some(base);
        }

        debug!(
            prefix = ?context.prefix,
            steps = context.steps.len(),
            primary_type = context.primary_type.as_ref().map(|t| t.api_type()),
            "Derived document path context"
        );
        context
    }

    fn parse_resource_path(&mut self, model: &ServiceModel, segments: &[String]) {
        let mut rest = segments.iter();
        let Some(mut current) = rest
            .next()
            .and_then(|segment| model.resource_type_by_path_segment(segment))
            .cloned()
        else {
            return;
        };
        let mut current_id = if current.is_singleton() {
            None
        } else {
            rest.next().cloned()
        };

        while let Some(mut segment) = rest.next() {
            if segment == keywords::RELATIONSHIPS {
                self.relationships = true;
                match rest.next() {
                    Some(next) => segment = next,
                    None => break,
                }
            }

            let Some(info) = current.relationship_by_path_segment(segment) else {
                warn!(
                    api_type = current.api_type(),
                    segment = segment.as_str(),
                    "Request path segment is not a relationship; ignoring the rest of the path"
                );
                break;
            };
            let Ok(target) = model.resource_type(&info.to_api_type) else {
                warn!(
                    to_api_type = info.to_api_type.as_str(),
                    "Relationship target type is not registered"
                );
                break;
            };

            self.steps.push(PathStep {
                resource_type: current.clone(),
                api_id: current_id.take(),
                rel: info.clone(),
            });
            current_id = match info.cardinality {
                RelationshipCardinality::ToMany => rest.next().cloned(),
                RelationshipCardinality::ToOne => None,
            };
            current = target.clone();
        }

        self.primary_type = Some(current);
        self.primary_api_id = current_id;
    }

    /// Returns the request URL.
    pub fn request_url(&self) -> Option<&Url> {
        self.request_url.as_ref()
    }

    /// Returns the URL links are generated under.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Returns the traversal steps of the request path.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns true if the request addresses a relationship endpoint.
    pub fn is_relationships_request(&self) -> bool {
        self.relationships
    }

    /// Returns the api type addressed by the request path.
    pub fn primary_api_type(&self) -> Option<&str> {
        self.primary_type.as_ref().map(|t| t.api_type())
    }

    /// Returns the api id addressed by the request path, if any.
    pub fn primary_api_id(&self) -> Option<&str> {
        self.primary_api_id.as_deref()
    }

    /// Returns the traversal a primary resource of `api_type` continues.
    ///
    /// Resources of the request's primary type continue the request's
    /// traversal; others start at the top level.
    pub fn primary_steps(&self, api_type: &str) -> &[PathStep] {
        if self.primary_api_type() == Some(api_type) {
            &self.steps
        } else {
            &[]
        }
    }

    /// Renders URL segments below the base URL, or as a root-relative path
    /// when there is no base.
    pub fn url(&self, segments: &[String]) -> Result<String, url::ParseError> {
        let relative = self.base_url.is_none();
        let mut url = match &self.base_url {
            Some(base) => base.clone(),
            None => Url::parse(RELATIVE_BASE)?,
        };
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);

        if relative {
            Ok(url.path().to_string())
        } else {
            Ok(url.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypermedia::ResourcePathContextBuilder;
    use crate::service_model::RelationshipInfo;

    struct Article;
    struct Person;
    struct Comment;

    fn model() -> ServiceModel {
        ServiceModel::builder()
            .resource_type(
                ResourceType::builder::<Article>("articles")
                    .relationship(
                        RelationshipInfo::to_one("author", "people").drop_previous_path_segments(),
                    )
                    .relationship(RelationshipInfo::to_many("comments", "comments"))
                    .build(),
            )
            .resource_type(ResourceType::builder::<Person>("people").build())
            .resource_type(ResourceType::builder::<Comment>("comments").build())
            .build()
    }

    fn parse(url: &str) -> DocumentPathContext {
        let url = Url::parse(url).unwrap();
        DocumentPathContext::new(&model(), Some(&url), None)
    }

    #[test]
    fn test_collection_request() {
        let context = parse("http://example.com/articles?include=author");
        assert_eq!(context.primary_api_type(), Some("articles"));
        assert_eq!(context.primary_api_id(), None);
        assert!(context.steps().is_empty());
        assert_eq!(
            context.url(&["articles".to_string(), "1".to_string()]).unwrap(),
            "http://example.com/articles/1"
        );
    }

    #[test]
    fn test_prefix_and_nested_request() {
        let context = parse("http://example.com/api/v1/articles/1/comments/5");
        assert_eq!(context.steps().len(), 1);
        assert_eq!(context.steps()[0].api_id.as_deref(), Some("1"));
        assert_eq!(context.steps()[0].rel.rel, "comments");
        assert_eq!(context.primary_api_type(), Some("comments"));
        assert_eq!(context.primary_api_id(), Some("5"));
        assert_eq!(
            context.url(&["people".to_string()]).unwrap(),
            "http://example.com/api/v1/people"
        );
    }

    #[test]
    fn test_relationships_request() {
        let context = parse("http://example.com/articles/1/relationships/author");
        assert!(context.is_relationships_request());
        assert_eq!(context.primary_api_type(), Some("people"));
    }

    #[test]
    fn test_primary_steps_continue_request_traversal() {
        let model = model();
        let context = parse("http://example.com/articles/1/author");
        let people = model.resource_type("people").unwrap();

        let path = ResourcePathContextBuilder::from_steps(context.primary_steps("people"), true)
            .build(people, Some("9".to_string()));
        assert_eq!(path.self_segments(), vec!["articles", "1", "author"]);
        assert_eq!(path.canonical_segments(), vec!["people", "9"]);

        assert!(context.primary_steps("comments").is_empty());
        let top_level = ResourcePathContextBuilder::from_steps(context.primary_steps("comments"), true)
            .build(model.resource_type("comments").unwrap(), Some("5".to_string()));
        assert_eq!(top_level.self_segments(), vec!["comments", "5"]);
    }

    #[test]
    fn test_relative_urls_without_base() {
        let context = DocumentPathContext::empty();
        assert_eq!(
            context.url(&["articles".to_string(), "1".to_string()]).unwrap(),
            "/articles/1"
        );
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let request = Url::parse("http://internal:8080/articles").unwrap();
        let base = Url::parse("https://api.example.com/v2/").unwrap();
        let context = DocumentPathContext::new(&model(), Some(&request), Some(&base));
        assert_eq!(
            context.url(&["articles".to_string()]).unwrap(),
            "https://api.example.com/v2/articles"
        );
    }
}
