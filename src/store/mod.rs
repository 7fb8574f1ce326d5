// src/store/mod.rs
// Persistence seam of the pipeline. The aggregation job talks to the
// `ArticleStore` trait; `PgStore` is the production implementation and tests
// substitute an in-memory one.

pub mod postgres;

pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::types::NormalizedArticle;

/// A source matched through the alias gate: the persisted source row id plus
/// its category name, used as the fallback label when a record carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub source_id: i64,
    pub category_name: Option<String>,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Look up the allow-list by alias slug. `None` means the publisher is
    /// not trusted and the record must be skipped.
    async fn resolve_alias(&self, alias_slug: &str) -> Result<Option<ResolvedSource>>;

    /// Persist one record atomically: find-or-create the category, upsert
    /// the article by URL, find-or-create each author scoped to the source,
    /// and sync the article's author set to exactly `article.authors()`.
    async fn persist_article(
        &self,
        article: &NormalizedArticle,
        source: &ResolvedSource,
        category_label: Option<&str>,
    ) -> Result<()>;
}
