//! Blog fixtures: articles with an author and comments, people, and a
//! singleton blog.

use std::sync::Arc;

use helios_jsonapi::DocumentConfig;
use helios_jsonapi::api::ResourceIdentifier;
use helios_jsonapi::service_model::{RelationshipInfo, ResourceType, ServiceModel};

#[derive(Debug, Clone)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: u64,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Blog {
    pub name: String,
}

/// Creates the blog service model.
///
/// `articles.author` and `comments.author` restart the canonical path at
/// the person; `articles.comments` and `blog.articles` accumulate it.
pub fn model() -> Arc<ServiceModel> {
    Arc::new(
        ServiceModel::builder()
            .resource_type(
                ResourceType::builder::<Article>("articles")
                    .id(|a| a.id.to_string())
                    .attribute("title", |a| a.title.clone())
                    .attribute("body", |a| a.body.clone())
                    .relationship(
                        RelationshipInfo::to_one("author", "people").drop_previous_path_segments(),
                    )
                    .relationship(RelationshipInfo::to_many("comments", "comments"))
                    .build(),
            )
            .resource_type(
                ResourceType::builder::<Person>("people")
                    .id(|p| p.id.to_string())
                    .attribute("name", |p| p.name.clone())
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
            .resource_type(
                ResourceType::builder::<Blog>("blogs")
                    .id(|_| "main".to_string())
                    .path_segment("blog")
                    .singleton()
                    .attribute("name", |b| b.name.clone())
                    .relationship(RelationshipInfo::to_many("articles", "articles"))
                    .build(),
            )
            .build(),
    )
}

pub fn article(id: u64) -> Article {
    Article {
        id,
        title: format!("Article {}", id),
        body: "The shortest article. Ever.".to_string(),
    }
}

pub fn person(id: u64, name: &str) -> Person {
    Person {
        id,
        name: name.to_string(),
    }
}

pub fn comment(id: u64) -> Comment {
    Comment {
        id,
        body: format!("Comment {}", id),
    }
}

pub fn blog() -> Blog {
    Blog {
        name: "Helios".to_string(),
    }
}

pub fn identifier(api_type: &str, api_id: &str) -> ResourceIdentifier {
    ResourceIdentifier::new(api_type, api_id)
}

/// Configuration for a request URL with default settings.
pub fn request(url: &str) -> DocumentConfig {
    DocumentConfig::for_request(url)
}

/// Configuration generating links under `http://example.com` without a
/// request URL.
pub fn testing() -> DocumentConfig {
    DocumentConfig::for_testing()
}
