//! Hypermedia path segments.

use crate::api::keywords;

/// One logical component of a hypermedia path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HypermediaPath {
    /// A top-level collection, e.g. `articles`.
    ResourceCollection {
        /// Collection path segment.
        path_segment: String,
    },
    /// A top-level resource, e.g. `articles/1`.
    Resource {
        /// Collection path segment.
        path_segment: String,
        /// Api id.
        api_id: String,
    },
    /// A singleton resource, e.g. `blog`.
    Singleton {
        /// Singleton path segment.
        path_segment: String,
    },
    /// A resource reached through a to-one relationship, e.g. `author`.
    ToOneResource {
        /// Relationship path segment.
        rel_path_segment: String,
    },
    /// Resources reached through a to-many relationship, e.g. `comments`.
    ToManyResourceCollection {
        /// Relationship path segment.
        rel_path_segment: String,
    },
    /// One resource reached through a to-many relationship, e.g. `comments/5`.
    ToManyResource {
        /// Relationship path segment.
        rel_path_segment: String,
        /// Api id.
        api_id: String,
    },
    /// Literal segments that do not address a resource.
    NonResource(Vec<String>),
}

impl HypermediaPath {
    /// Appends the URL segments of this component.
    pub fn push_segments(&self, out: &mut Vec<String>) {
        match self {
            HypermediaPath::ResourceCollection { path_segment }
            | HypermediaPath::Singleton { path_segment } => out.push(path_segment.clone()),
            HypermediaPath::Resource {
                path_segment,
                api_id,
            } => {
                out.push(path_segment.clone());
                out.push(api_id.clone());
            }
            HypermediaPath::ToOneResource { rel_path_segment }
            | HypermediaPath::ToManyResourceCollection { rel_path_segment } => {
                out.push(rel_path_segment.clone())
            }
            HypermediaPath::ToManyResource {
                rel_path_segment,
                api_id,
            } => {
                out.push(rel_path_segment.clone());
                out.push(api_id.clone());
            }
            HypermediaPath::NonResource(segments) => out.extend(segments.iter().cloned()),
        }
    }
}

/// Whether the resource's api id is appended after its base path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HypermediaPathMode {
    /// The base path addresses a collection; append the id.
    IncludeApiId,
    /// The base path addresses the resource itself.
    IgnoreApiId,
}

/// The self and canonical base paths of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePathContext {
    /// Api id of the resource.
    pub api_id: Option<String>,
    /// Base path of the self URL.
    pub self_path: Vec<HypermediaPath>,
    /// Path mode of the self URL.
    pub self_mode: HypermediaPathMode,
    /// Base path of the canonical URL.
    pub canonical_path: Vec<HypermediaPath>,
    /// Path mode of the canonical URL.
    pub canonical_mode: HypermediaPathMode,
}

impl ResourcePathContext {
    /// URL segments addressing the resource through its traversal.
    pub fn self_segments(&self) -> Vec<String> {
        self.segments(&self.self_path, self.self_mode)
    }

    /// URL segments addressing the resource canonically.
    pub fn canonical_segments(&self) -> Vec<String> {
        self.segments(&self.canonical_path, self.canonical_mode)
    }

    /// URL segments of a relationship endpoint: `…/relationships/{rel}`.
    pub fn relationship_segments(&self, rel_path_segment: &str) -> Vec<String> {
        let mut segments = self.self_segments();
        segments.push(keywords::RELATIONSHIPS.to_string());
        segments.push(rel_path_segment.to_string());
        segments
    }

    /// URL segments of a related endpoint: `…/{rel}`.
    pub fn related_segments(&self, rel_path_segment: &str) -> Vec<String> {
        let mut segments = self.self_segments();
        segments.push(rel_path_segment.to_string());
        segments
    }

    fn segments(&self, path: &[HypermediaPath], mode: HypermediaPathMode) -> Vec<String> {
        let mut segments = Vec::new();
        for component in path {
            component.push_segments(&mut segments);
        }
        if let (HypermediaPathMode::IncludeApiId, Some(api_id)) = (mode, &self.api_id) {
            segments.push(api_id.clone());
        }
        segments
    }
}
