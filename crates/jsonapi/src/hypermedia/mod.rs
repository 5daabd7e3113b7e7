//! Hypermedia: path contexts and link generation.
//!
//! Every resource gets a [`ResourcePathContext`] when its builder ends,
//! computed by [`ResourcePathContextBuilder`] from the relationship chain it
//! was reached through. The document itself has a [`DocumentPathContext`]
//! derived from the request URL. A [`HypermediaAssembler`] turns both into
//! concrete links and relationships during resolution.

mod assembler;
mod document_path;
mod path;
mod path_builder;

pub use assembler::{
    DefaultHypermediaAssembler, HypermediaAssembler, LinkContext, RelationshipContext,
};
pub use document_path::DocumentPathContext;
pub use path::{HypermediaPath, HypermediaPathMode, ResourcePathContext};
pub use path_builder::{PathStep, ResourcePathContextBuilder};
