//! Incremental computation of resource path contexts.

use std::fmt;
use std::sync::Arc;

use super::path::{HypermediaPath, HypermediaPathMode, ResourcePathContext};
use crate::service_model::{
    CanonicalPathMode, RelationshipCardinality, RelationshipInfo, ResourceType,
};

/// One traversal step: from a resource over one of its relationships.
#[derive(Debug, Clone)]
pub struct PathStep {
    /// Type of the resource the traversal starts from.
    pub resource_type: Arc<ResourceType>,
    /// Id of that resource; `None` for singletons.
    pub api_id: Option<String>,
    /// The relationship traversed.
    pub rel: RelationshipInfo,
}

type PathAction = Box<dyn FnOnce(&mut ResourcePathContextBuilder) + Send>;

#[derive(Debug, Clone, Default)]
struct PathAccumulator {
    path: Vec<HypermediaPath>,
    previous: Option<RelationshipInfo>,
}

impl PathAccumulator {
    fn push_source(
        &mut self,
        resource_type: &ResourceType,
        api_id: Option<&str>,
        rel: &RelationshipInfo,
    ) {
        let segment = match &self.previous {
            None if resource_type.is_singleton() => HypermediaPath::Singleton {
                path_segment: resource_type.path_segment().to_string(),
            },
            None => match api_id {
                Some(api_id) => HypermediaPath::Resource {
                    path_segment: resource_type.path_segment().to_string(),
                    api_id: api_id.to_string(),
                },
                None => HypermediaPath::ResourceCollection {
                    path_segment: resource_type.path_segment().to_string(),
                },
            },
            Some(previous) => match (previous.cardinality, api_id) {
                (RelationshipCardinality::ToOne, _) => HypermediaPath::ToOneResource {
                    rel_path_segment: previous.api_rel_path_segment.clone(),
                },
                (RelationshipCardinality::ToMany, Some(api_id)) => HypermediaPath::ToManyResource {
                    rel_path_segment: previous.api_rel_path_segment.clone(),
                    api_id: api_id.to_string(),
                },
                (RelationshipCardinality::ToMany, None) => {
                    HypermediaPath::ToManyResourceCollection {
                        rel_path_segment: previous.api_rel_path_segment.clone(),
                    }
                }
            },
        };
        self.path.push(segment);
        self.previous = Some(rel.clone());
    }

    fn reset(&mut self) {
        self.path.clear();
        self.previous = None;
    }

    fn push_literal(&mut self, segment: String) {
        if let Some(HypermediaPath::NonResource(segments)) = self.path.last_mut() {
            segments.push(segment);
            return;
        }
        self.path.push(HypermediaPath::NonResource(vec![segment]));
    }

    fn push_terminal(&mut self, resource_type: &ResourceType) -> HypermediaPathMode {
        let (segment, mode) = match &self.previous {
            None if resource_type.is_singleton() => (
                HypermediaPath::Singleton {
                    path_segment: resource_type.path_segment().to_string(),
                },
                HypermediaPathMode::IgnoreApiId,
            ),
            None => (
                HypermediaPath::ResourceCollection {
                    path_segment: resource_type.path_segment().to_string(),
                },
                HypermediaPathMode::IncludeApiId,
            ),
            Some(previous) => match previous.cardinality {
                RelationshipCardinality::ToOne => (
                    HypermediaPath::ToOneResource {
                        rel_path_segment: previous.api_rel_path_segment.clone(),
                    },
                    HypermediaPathMode::IgnoreApiId,
                ),
                RelationshipCardinality::ToMany => (
                    HypermediaPath::ToManyResourceCollection {
                        rel_path_segment: previous.api_rel_path_segment.clone(),
                    },
                    HypermediaPathMode::IncludeApiId,
                ),
            },
        };
        self.path.push(segment);
        mode
    }
}

/// Builds the [`ResourcePathContext`] of one resource.
///
/// Keeps two accumulators. The self accumulator records every traversal
/// step; the canonical accumulator restarts whenever a relationship with
/// [`CanonicalPathMode::DropPreviousPathSegments`] is traversed.
#[derive(Default)]
pub struct ResourcePathContextBuilder {
    self_path: PathAccumulator,
    canonical_path: PathAccumulator,
    actions: Vec<PathAction>,
}

impl fmt::Debug for ResourcePathContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePathContextBuilder")
            .field("self_path", &self.self_path)
            .field("canonical_path", &self.canonical_path)
            .field("actions", &self.actions.len())
            .finish()
    }
}

impl ResourcePathContextBuilder {
    /// Creates a builder for a resource reached without traversal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder that has already walked `steps`.
    pub fn from_steps(steps: &[PathStep], include: bool) -> Self {
        let mut builder = Self::new();
        for step in steps {
            builder.add_path(
                &step.resource_type,
                step.api_id.as_deref(),
                &step.rel,
                include,
            );
        }
        builder
    }

    /// Records traversal from a resource over one of its relationships.
    ///
    /// Does nothing when `include` is false.
    pub fn add_path(
        &mut self,
        resource_type: &ResourceType,
        api_id: Option<&str>,
        rel: &RelationshipInfo,
        include: bool,
    ) {
        if !include {
            return;
        }

        self.self_path.push_source(resource_type, api_id, rel);
        match rel.canonical_path_mode {
            CanonicalPathMode::Accumulate => {
                self.canonical_path.push_source(resource_type, api_id, rel)
            }
            CanonicalPathMode::DropPreviousPathSegments => self.canonical_path.reset(),
        }
    }

    /// Appends a literal segment, merging into a trailing literal component.
    pub fn add_literal_path(&mut self, segment: impl Into<String>) {
        let segment = segment.into();
        self.self_path.push_literal(segment.clone());
        self.canonical_path.push_literal(segment);
    }

    /// Registers an action replayed when the context is built.
    pub fn add_path_action(&mut self, action: impl FnOnce(&mut Self) + Send + 'static) {
        self.actions.push(Box::new(action));
    }

    /// Replays deferred actions and terminates both paths at the resource.
    pub fn build(mut self, resource_type: &ResourceType, api_id: Option<String>) -> ResourcePathContext {
        for action in std::mem::take(&mut self.actions) {
            action(&mut self);
        }

        let self_mode = self.self_path.push_terminal(resource_type);
        let canonical_mode = self.canonical_path.push_terminal(resource_type);
        ResourcePathContext {
            api_id,
            self_path: self.self_path.path,
            self_mode,
            canonical_path: self.canonical_path.path,
            canonical_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Article;
    struct Person;
    struct Comment;
    struct Blog;

    fn articles() -> ResourceType {
        ResourceType::builder::<Article>("articles")
            .relationship(RelationshipInfo::to_one("author", "people").drop_previous_path_segments())
            .relationship(RelationshipInfo::to_many("comments", "comments"))
            .build()
    }

    fn people() -> ResourceType {
        ResourceType::builder::<Person>("people").build()
    }

    fn comments() -> ResourceType {
        ResourceType::builder::<Comment>("comments").build()
    }

    fn blog() -> ResourceType {
        ResourceType::builder::<Blog>("blog")
            .singleton()
            .relationship(RelationshipInfo::to_many("articles", "articles"))
            .build()
    }

    fn rel(resource_type: &ResourceType, name: &str) -> RelationshipInfo {
        resource_type.relationship(name).unwrap().clone()
    }

    #[test]
    fn test_top_level_collection_includes_api_id() {
        let context = ResourcePathContextBuilder::new().build(&articles(), Some("1".to_string()));
        assert_eq!(context.self_mode, HypermediaPathMode::IncludeApiId);
        assert_eq!(context.self_segments(), vec!["articles", "1"]);
        assert_eq!(context.canonical_segments(), vec!["articles", "1"]);
    }

    #[test]
    fn test_singleton_ignores_api_id() {
        let context = ResourcePathContextBuilder::new().build(&blog(), None);
        assert_eq!(context.self_mode, HypermediaPathMode::IgnoreApiId);
        assert_eq!(context.self_segments(), vec!["blog"]);
    }

    #[test]
    fn test_to_one_traversal_ignores_api_id() {
        let articles = articles();
        let mut builder = ResourcePathContextBuilder::new();
        builder.add_path(&articles, Some("1"), &rel(&articles, "author"), true);
        let context = builder.build(&people(), Some("9".to_string()));

        assert_eq!(context.self_mode, HypermediaPathMode::IgnoreApiId);
        assert_eq!(context.self_segments(), vec!["articles", "1", "author"]);
        assert_eq!(context.canonical_mode, HypermediaPathMode::IncludeApiId);
        assert_eq!(context.canonical_segments(), vec!["people", "9"]);
    }

    #[test]
    fn test_to_many_traversal_includes_api_id_and_accumulates() {
        let articles = articles();
        let mut builder = ResourcePathContextBuilder::new();
        builder.add_path(&articles, Some("1"), &rel(&articles, "comments"), true);
        let context = builder.build(&comments(), Some("5".to_string()));

        assert_eq!(context.self_mode, HypermediaPathMode::IncludeApiId);
        assert_eq!(context.self_segments(), vec!["articles", "1", "comments", "5"]);
        assert_eq!(context.canonical_segments(), vec!["articles", "1", "comments", "5"]);
    }

    #[test]
    fn test_chained_traversal_from_singleton() {
        let blog = blog();
        let articles = articles();
        let steps = vec![
            PathStep {
                resource_type: Arc::new(self::blog()),
                api_id: None,
                rel: rel(&blog, "articles"),
            },
            PathStep {
                resource_type: Arc::new(self::articles()),
                api_id: Some("1".to_string()),
                rel: rel(&articles, "author"),
            },
        ];
        let context = ResourcePathContextBuilder::from_steps(&steps, true)
            .build(&people(), Some("9".to_string()));

        assert_eq!(context.self_segments(), vec!["blog", "articles", "1", "author"]);
        assert_eq!(context.canonical_segments(), vec!["people", "9"]);
    }

    #[test]
    fn test_include_flag_false_is_noop() {
        let articles = articles();
        let mut builder = ResourcePathContextBuilder::new();
        builder.add_path(&articles, Some("1"), &rel(&articles, "comments"), false);
        let context = builder.build(&comments(), Some("5".to_string()));
        assert_eq!(context.self_segments(), vec!["comments", "5"]);
    }

    #[test]
    fn test_literal_segments_coalesce_and_replay_before_terminal() {
        let mut builder = ResourcePathContextBuilder::new();
        builder.add_path_action(|b| b.add_literal_path("archive"));
        builder.add_path_action(|b| b.add_literal_path("2024"));
        let context = builder.build(&articles(), Some("1".to_string()));

        assert_eq!(
            context.self_path[0],
            HypermediaPath::NonResource(vec!["archive".to_string(), "2024".to_string()])
        );
        assert_eq!(context.self_segments(), vec!["archive", "2024", "articles", "1"]);
    }
}
