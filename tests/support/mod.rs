// tests/support/mod.rs
// Shared doubles for the integration suite: a scripted fetcher and an
// in-memory store that mirrors the relational upsert semantics.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use newswire_aggregator::error::FetchError;
use newswire_aggregator::ingest::types::{
    ArticleBatch, ArticleDraft, ArticleFetcher, NormalizedArticle,
};
use newswire_aggregator::store::{ArticleStore, ResolvedSource};

pub fn article(
    title: &str,
    source: &str,
    url: &str,
    category: Option<&str>,
    authors: &[&str],
) -> NormalizedArticle {
    ArticleDraft {
        title: Some(title.to_string()),
        source: Some(source.to_string()),
        url: Some(url.to_string()),
        category: category.map(str::to_string),
        authors: authors.iter().map(|a| a.to_string()).collect(),
        ..Default::default()
    }
    .build()
    .unwrap()
}

pub fn batch(articles: Vec<NormalizedArticle>, last_page: bool) -> ArticleBatch {
    ArticleBatch::new(articles, last_page)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArticle {
    pub url: String,
    pub title: String,
    pub source_id: i64,
    pub category: Option<String>,
    pub authors: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    aliases: HashMap<String, ResolvedSource>,
    persisted: Mutex<Vec<PersistedArticle>>,
    fail_persists: AtomicU32,
}

impl MemoryStore {
    pub fn with_alias(mut self, slug: &str, source_id: i64, category: Option<&str>) -> Self {
        self.aliases.insert(
            slug.to_string(),
            ResolvedSource {
                source_id,
                category_name: category.map(str::to_string),
            },
        );
        self
    }

    /// Make the next `n` persist calls fail.
    pub fn fail_next_persists(self, n: u32) -> Self {
        self.fail_persists.store(n, Ordering::SeqCst);
        self
    }

    pub fn articles(&self) -> Vec<PersistedArticle> {
        self.persisted.lock().clone()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn resolve_alias(&self, alias_slug: &str) -> anyhow::Result<Option<ResolvedSource>> {
        Ok(self.aliases.get(alias_slug).cloned())
    }

    async fn persist_article(
        &self,
        article: &NormalizedArticle,
        source: &ResolvedSource,
        category_label: Option<&str>,
    ) -> anyhow::Result<()> {
        if self.fail_persists.load(Ordering::SeqCst) > 0 {
            self.fail_persists.fetch_sub(1, Ordering::SeqCst);
            anyhow::bail!("simulated persistence failure");
        }
        let record = PersistedArticle {
            url: article.url().to_string(),
            title: article.title().to_string(),
            source_id: source.source_id,
            category: category_label.map(str::to_string),
            authors: article.authors().to_vec(),
        };
        let mut persisted = self.persisted.lock();
        // Upsert-by-url, author sync included: the new record replaces the
        // old one wholesale, matching the relational store.
        if let Some(existing) = persisted.iter_mut().find(|p| p.url == record.url) {
            *existing = record;
        } else {
            persisted.push(record);
        }
        Ok(())
    }
}

/// Replays a fixed sequence of fetch results, one per call, regardless of
/// the requested page. Records the pages it was asked for.
pub struct ScriptedFetcher {
    label: String,
    pages: Mutex<VecDeque<Result<ArticleBatch, FetchError>>>,
    requested: Mutex<Vec<u32>>,
}

impl ScriptedFetcher {
    pub fn new(label: &str, pages: Vec<Result<ArticleBatch, FetchError>>) -> Self {
        Self {
            label: label.to_string(),
            pages: Mutex::new(pages.into()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl ArticleFetcher for ScriptedFetcher {
    async fn fetch(&self, page: u32) -> Result<ArticleBatch, FetchError> {
        self.requested.lock().push(page);
        self.pages
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ArticleBatch::new(Vec::new(), true)))
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}
