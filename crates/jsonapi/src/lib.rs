//! # helios-jsonapi - JSON:API Document Builder
//!
//! This crate builds [JSON:API](https://jsonapi.org/format/1.0/) documents
//! from plain Rust domain objects. Callers describe a document through
//! chained fluent builders; the crate deduplicates resources, merges
//! relationship linkage from several sources, generates hypermedia links
//! from the position of each resource in the API's URL hierarchy, applies
//! sparse fieldsets, and hands back a [`Document`](api::Document) ready for
//! any serde encoder.
//!
//! ## Features
//!
//! - **Fluent builders**: one chain per document, `?` at every step
//! - **Deduplication**: a resource presented several times is emitted once
//!   and its attributes are mapped once
//! - **Included linkage**: declaring an included resource also fills in the
//!   relationship of the resource it hangs off
//! - **Hypermedia**: `self`, `related` and `canonical` links generated from
//!   the request URL and the relationship chain a resource was reached by
//! - **Sparse fieldsets**: `fields[type]` restricts attributes and prunes
//!   relationships
//! - **Deterministic output**: included resources are sorted by type, then id
//!
//! ## Pipeline
//!
//! ```text
//! DocumentBuilder ──► DomTree (read-write nodes)
//!                          │  write_document()
//!                          ▼
//!          resolve hypermedia ─► prune sparse fieldsets ─► compact
//!                          │
//!                          ▼
//!          sort included ─► document links ─► DocumentWriter ─► Document
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Finalized JSON:API values (documents, resources, links)
//! - [`builder`] - Fluent document builders
//! - [`config`] - Build configuration (request URL, sparse fieldsets, version)
//! - [`context`] - Per-build resource registry and linkage map
//! - [`dom`] - Document tree of read-write and read-only nodes
//! - [`error`] - Error types
//! - [`hypermedia`] - Path contexts and link generation
//! - [`linkage`] - Linkage records and the merge rule
//! - [`query`] - Query parameter parsing
//! - [`service_model`] - Resource type metadata
//! - [`writer`] - Document writing

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod builder;
pub mod config;
pub mod context;
pub mod dom;
pub mod error;
pub mod hypermedia;
pub mod linkage;
pub mod query;
mod resolve;
pub mod service_model;
pub mod writer;

// Re-export commonly used types
pub use builder::DocumentBuilder;
pub use config::DocumentConfig;
pub use error::{
    BuildResult, BuildUsageError, DocumentBuildError, InternalError, LinkageConflictError,
    ServiceModelError,
};

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_jsonapi={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
