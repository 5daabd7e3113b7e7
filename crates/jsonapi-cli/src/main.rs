//! jsonapi-doc
//!
//! Renders JSON:API documents for a small blog data set, driven by a
//! request URL: `include` selects included resources and `fields[type]`
//! selects sparse fieldsets.
//!
//! ```text
//! jsonapi-doc --request-url 'http://example.com/articles/1?include=author,comments' --pretty
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use helios_jsonapi::api::{Document, ResourceIdentifier};
use helios_jsonapi::builder::{BuilderScope, ResourceBuilder};
use helios_jsonapi::hypermedia::DocumentPathContext;
use helios_jsonapi::query::QueryParameters;
use helios_jsonapi::service_model::{RelationshipInfo, ResourceType, ServiceModel};
use helios_jsonapi::{BuildResult, DocumentBuilder, DocumentConfig, init_logging};
use serde::Deserialize;
use tracing::{debug, info};

const DEFAULT_REQUEST_URL: &str = "http://example.com/articles";

const SAMPLE_BLOG: &str = r#"{
  "people": [
    { "id": 2, "first_name": "Steve", "last_name": "Klabnik", "twitter": null },
    { "id": 9, "first_name": "Dan", "last_name": "Gebhardt", "twitter": "dgeb" }
  ],
  "articles": [
    { "id": 1, "title": "JSON:API paints my bikeshed!", "author": 9, "comments": [5, 12] },
    { "id": 2, "title": "Rails is Omakase", "author": 2, "comments": [] }
  ],
  "comments": [
    { "id": 5, "body": "First!", "author": 2 },
    { "id": 12, "body": "I like XML better", "author": 9 }
  ]
}"#;

#[derive(Debug, Parser)]
#[command(name = "jsonapi-doc")]
#[command(about = "Renders JSON:API documents for a sample blog")]
struct Cli {
    #[command(flatten)]
    document: DocumentConfig,

    /// JSON file with `people`, `articles` and `comments`; a built-in
    /// sample is used when absent.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Pretty-print the document.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct Person {
    id: u64,
    first_name: String,
    last_name: String,
    twitter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Article {
    id: u64,
    title: String,
    author: u64,
    comments: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct Comment {
    id: u64,
    body: String,
    author: u64,
}

#[derive(Debug, Deserialize)]
struct Blog {
    people: Vec<Person>,
    articles: Vec<Article>,
    comments: Vec<Comment>,
}

impl Blog {
    fn load(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Cannot open data file {}", path.display()))?;
                serde_json::from_reader(file)
                    .with_context(|| format!("Cannot parse data file {}", path.display()))
            }
            None => Ok(serde_json::from_str(SAMPLE_BLOG)?),
        }
    }

    fn person(&self, id: u64) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    fn comments_of(&self, article: &Article) -> Vec<Comment> {
        article
            .comments
            .iter()
            .filter_map(|id| self.comments.iter().find(|c| c.id == *id).cloned())
            .collect()
    }
}

fn service_model() -> ServiceModel {
    ServiceModel::builder()
        .resource_type(
            ResourceType::builder::<Article>("articles")
                .id(|a| a.id.to_string())
                .attribute("title", |a| a.title.clone())
                .relationship(
                    RelationshipInfo::to_one("author", "people").drop_previous_path_segments(),
                )
                .relationship(RelationshipInfo::to_many("comments", "comments"))
                .build(),
        )
        .resource_type(
            ResourceType::builder::<Person>("people")
                .id(|p| p.id.to_string())
                .attribute("first-name", |p| p.first_name.clone())
                .attribute("last-name", |p| p.last_name.clone())
                .attribute("twitter", |p| p.twitter.clone())
                .build(),
        )
        .resource_type(
            ResourceType::builder::<Comment>("comments")
                .id(|c| c.id.to_string())
                .attribute("body", |c| c.body.clone())
                .relationship(
                    RelationshipInfo::to_one("author", "people").drop_previous_path_segments(),
                )
                .build(),
        )
        .build()
}

/// Adds the self link and relationship links every rendered article gets.
fn describe_articles<P: BuilderScope>(
    articles: ResourceBuilder<P, Article>,
) -> BuildResult<ResourceBuilder<P, Article>> {
    Ok(articles
        .links()?
        .add_self_link()?
        .links_end()
        .relationships()?
        .relationship("author")?
        .links()?
        .add_self_link()?
        .add_related_link()?
        .links_end()
        .relationship_end()
        .relationship("comments")?
        .links()?
        .add_self_link()?
        .add_related_link()?
        .links_end()
        .relationship_end()
        .relationships_end())
}

fn render(config: &DocumentConfig, blog: &Blog) -> anyhow::Result<Document> {
    let model = Arc::new(service_model());
    let request_url = config
        .parsed_request_url()?
        .context("A request URL is required")?;
    let query = QueryParameters::from_url(&request_url);

    let document_path =
        DocumentPathContext::new(&model, Some(&request_url), config.parsed_base_url()?.as_ref());
    if document_path.is_relationships_request() {
        return render_relationship(model, config, blog, &document_path);
    }
    if document_path.primary_api_type() != Some("articles") {
        anyhow::bail!("Only article endpoints are rendered, got {}", request_url);
    }
    let primary_id = document_path
        .primary_api_id()
        .map(|id| id.parse::<u64>())
        .transpose()
        .with_context(|| format!("Invalid article id in {}", request_url))?;

    let articles: Vec<Article> = match primary_id {
        Some(id) => blog.articles.iter().filter(|a| a.id == id).cloned().collect(),
        None => blog.articles.clone(),
    };
    debug!(articles = articles.len(), ?primary_id, "Selected primary data");

    let document = DocumentBuilder::new(model, config)?
        .links()?
        .add_self_link()?
        .links_end();
    let mut document = match (primary_id, articles.first()) {
        (Some(_), Some(article)) => {
            describe_articles(document.resource(article.clone())?)?.resource_end()?
        }
        (Some(_), None) => document.null_resource()?,
        (None, _) => {
            describe_articles(document.resource_collection(articles.clone())?)?.resource_end()?
        }
    };

    if !articles.is_empty() && !query.include_paths().is_empty() {
        let mut included = document.included()?;
        if query.is_included("author") {
            let pairs = articles
                .iter()
                .filter_map(|a| blog.person(a.author).map(|p| (a, p.clone())));
            included = included
                .to_one_each("author", pairs)?
                .links()?
                .add_self_link()?
                .links_end()
                .resource_end()?;
        }
        if query.is_included("comments") {
            for article in &articles {
                let comments = blog.comments_of(article);
                included = included
                    .to_many(article, "comments", comments.clone())?
                    .links()?
                    .add_self_link()?
                    .add_canonical_link()?
                    .links_end()
                    .resource_end()?;
                if query.is_included("comments.author") {
                    for comment in &comments {
                        if let Some(person) = blog.person(comment.author) {
                            included = included
                                .to_one(comment, "author", person.clone())?
                                .resource_end()?;
                        }
                    }
                }
            }
        }
        document = included.included_end();
    }

    Ok(document.write_document()?)
}

/// Renders the linkage of an article relationship, as requested by
/// `/articles/{id}/relationships/{rel}`.
fn render_relationship(
    model: Arc<ServiceModel>,
    config: &DocumentConfig,
    blog: &Blog,
    document_path: &DocumentPathContext,
) -> anyhow::Result<Document> {
    let step = match document_path.steps() {
        [step] if step.resource_type.api_type() == "articles" => step,
        _ => anyhow::bail!("Only article relationship endpoints are rendered"),
    };
    let id = step
        .api_id
        .as_deref()
        .context("Missing article id")?
        .parse::<u64>()
        .context("Invalid article id")?;
    let article = blog
        .articles
        .iter()
        .find(|a| a.id == id)
        .with_context(|| format!("Article {} not found", id))?;
    debug!(article = id, rel = step.rel.rel.as_str(), "Rendering relationship linkage");

    let document = DocumentBuilder::new(model, config)?
        .links()?
        .add_self_link()?
        .links_end();
    let document = match step.rel.rel.as_str() {
        "author" => document
            .resource_identifier(ResourceIdentifier::new("people", article.author.to_string()))?
            .resource_identifier_end(),
        "comments" => document
            .resource_identifier_collection(
                article
                    .comments
                    .iter()
                    .map(|id| ResourceIdentifier::new("comments", id.to_string())),
            )?
            .resource_identifier_end(),
        other => anyhow::bail!("Unknown article relationship '{}'", other),
    };
    Ok(document.write_document()?)
}

fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    init_logging(&cli.document.log_level);

    if cli.document.request_url.is_none() {
        cli.document.request_url = Some(DEFAULT_REQUEST_URL.to_string());
    }
    if let Err(errors) = cli.document.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let blog = Blog::load(cli.data.as_ref())?;
    info!(
        request_url = cli.document.request_url.as_deref(),
        people = blog.people.len(),
        articles = blog.articles.len(),
        comments = blog.comments.len(),
        "Rendering document"
    );

    let document = render(&cli.document, &blog)?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{}", json);
    Ok(())
}
