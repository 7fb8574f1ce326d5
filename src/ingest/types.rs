// src/ingest/types.rs
use async_trait::async_trait;

use crate::error::{FetchError, ValidationError};

/// Raw field values as a fetcher pulled them out of a provider payload.
/// [`ArticleDraft::build`] is the only way to obtain a [`NormalizedArticle`],
/// so a record missing a required field can never enter a batch.
#[derive(Debug, Clone, Default)]
pub struct ArticleDraft {
    pub title: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub image_url: Option<String>,
}

impl ArticleDraft {
    pub fn build(self) -> Result<NormalizedArticle, ValidationError> {
        Ok(NormalizedArticle {
            title: required(self.title, "title")?,
            source: required(self.source, "source")?,
            url: required(self.url, "url")?,
            content: none_if_blank(self.content),
            category: none_if_blank(self.category),
            authors: self.authors,
            description: none_if_blank(self.description),
            published_at: none_if_blank(self.published_at),
            image_url: none_if_blank(self.image_url),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// One article in the common shape, validated at construction and read-only
/// afterwards. Lives only for the duration of one fetch/persist cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedArticle {
    title: String,
    source: String,
    url: String,
    content: Option<String>,
    category: Option<String>,
    authors: Vec<String>,
    description: Option<String>,
    published_at: Option<String>,
    image_url: Option<String>,
}

impl NormalizedArticle {
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw provider display name, not yet resolved against the allow-list.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Canonical URL; the natural key for upserts.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Provider-native timestamp string; parsed by the persistence layer.
    pub fn published_at(&self) -> Option<&str> {
        self.published_at.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// Validated, ordered output of one fetch call plus the final-page flag.
#[derive(Debug, Clone, Default)]
pub struct ArticleBatch {
    articles: Vec<NormalizedArticle>,
    last_page: bool,
}

impl ArticleBatch {
    pub fn new(articles: Vec<NormalizedArticle>, last_page: bool) -> Self {
        Self {
            articles,
            last_page,
        }
    }

    pub fn is_last_page(&self) -> bool {
        self.last_page
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedArticle> {
        self.articles.iter()
    }

    /// Concatenate another batch of the same type. The receiver's final-page
    /// flag is kept; the argument is consumed so two batches never alias.
    pub fn merge(mut self, other: ArticleBatch) -> ArticleBatch {
        self.articles.extend(other.articles);
        self
    }
}

/// One upstream API. Page-to-offset translation, source scoping and
/// final-page detection are each implementation's own business; callers only
/// see 1-indexed pages and a batch with a flag.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, page: u32) -> Result<ArticleBatch, FetchError>;

    /// Lineage label for logs, e.g. `newsapi[2]` for the second scope chunk.
    fn name(&self) -> String;
}
