//! Document building configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JSONAPI_REQUEST_URL` | (none) | Current request URL |
//! | `JSONAPI_BASE_URL` | (none) | Base URL for generated links |
//! | `JSONAPI_SPARSE_FIELDSETS` | true | Honour `fields[type]` parameters |
//! | `JSONAPI_NESTED_PATHS` | true | Address included resources below the resource they were reached from |
//! | `JSONAPI_VERSION` | (none) | Emit `jsonapi.version` |
//! | `JSONAPI_LOG_LEVEL` | info | Log level |
//!
//! # Example
//!
//! ```rust
//! use helios_jsonapi::DocumentConfig;
//!
//! let config = DocumentConfig {
//!     request_url: Some("http://example.com/articles?include=author".to_string()),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::Parser;
use url::Url;

use crate::api::JsonApiVersion;
use crate::error::BuildResult;

const SUPPORTED_VERSIONS: &[&str] = &["1.0", "1.1"];

/// Configuration of one document build.
#[derive(Debug, Clone, Parser)]
#[command(name = "jsonapi-doc")]
#[command(about = "JSON:API document builder")]
pub struct DocumentConfig {
    /// Current request URL; drives the document self link, path context and
    /// query parameters.
    #[arg(long, env = "JSONAPI_REQUEST_URL")]
    pub request_url: Option<String>,

    /// Base URL for generated links when it differs from the request origin.
    #[arg(long, env = "JSONAPI_BASE_URL")]
    pub base_url: Option<String>,

    /// Apply sparse fieldsets from `fields[type]` query parameters.
    #[arg(long, env = "JSONAPI_SPARSE_FIELDSETS", default_value = "true", action = clap::ArgAction::Set)]
    pub sparse_fieldsets: bool,

    /// Address included resources below the resource they were reached from.
    #[arg(long, env = "JSONAPI_NESTED_PATHS", default_value = "true", action = clap::ArgAction::Set)]
    pub nested_paths: bool,

    /// JSON:API version to advertise in the `jsonapi` member.
    #[arg(long = "jsonapi-version", env = "JSONAPI_VERSION")]
    pub version: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "JSONAPI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            request_url: None,
            base_url: None,
            sparse_fieldsets: true,
            nested_paths: true,
            version: None,
            log_level: "info".to_string(),
        }
    }
}

impl DocumentConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["jsonapi-doc"]).unwrap_or_default()
    }

    /// Creates a configuration for a request URL with every other setting
    /// at its default.
    pub fn for_request(request_url: impl Into<String>) -> Self {
        Self {
            request_url: Some(request_url.into()),
            ..Default::default()
        }
    }

    /// Parses the request URL.
    pub fn parsed_request_url(&self) -> BuildResult<Option<Url>> {
        Ok(self.request_url.as_deref().map(Url::parse).transpose()?)
    }

    /// Parses the base URL.
    pub fn parsed_base_url(&self) -> BuildResult<Option<Url>> {
        Ok(self.base_url.as_deref().map(Url::parse).transpose()?)
    }

    /// Returns the `jsonapi` member to emit, if a version is configured.
    pub fn jsonapi_version(&self) -> Option<JsonApiVersion> {
        self.version.as_deref().map(JsonApiVersion::new)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(request_url) = &self.request_url
            && let Err(e) = Url::parse(request_url)
        {
            errors.push(format!("Invalid request URL '{}': {}", request_url, e));
        }

        if let Some(base_url) = &self.base_url {
            match Url::parse(base_url) {
                Ok(url) if url.cannot_be_a_base() => {
                    errors.push(format!("Base URL '{}' cannot carry path segments", base_url));
                }
                Ok(_) => {}
                Err(e) => errors.push(format!("Invalid base URL '{}': {}", base_url, e)),
            }
        }

        if let Some(version) = &self.version
            && !SUPPORTED_VERSIONS.contains(&version.as_str())
        {
            errors.push(format!(
                "Unsupported JSON:API version '{}', expected one of {}",
                version,
                SUPPORTED_VERSIONS.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Links are generated under `http://example.com` and no version member
    /// is emitted.
    pub fn for_testing() -> Self {
        Self {
            request_url: None,
            base_url: Some("http://example.com".to_string()),
            sparse_fieldsets: true,
            nested_paths: true,
            version: None,
            log_level: "debug".to_string(),
        }
    }
}
