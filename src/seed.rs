// src/seed.rs
// Provision the curated source allow-list from a JSON catalog. This is the
// out-of-band step that decides which publishers the pipeline will admit;
// the aggregation job itself only ever reads these tables.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::store::PgStore;
use crate::text::slugify;

#[derive(Debug, Deserialize)]
pub struct SourceCatalog {
    pub sources: Vec<SeedSource>,
}

#[derive(Debug, Deserialize)]
pub struct SeedSource {
    /// Provider-stable identifier, used as the source slug.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub category: String,
    /// Alternate display names the publisher appears under in feeds.
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub sources: usize,
    pub aliases: usize,
}

pub fn load_catalog(path: &Path) -> Result<SourceCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading source catalog from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing source catalog from {}", path.display()))
}

/// Apply the catalog idempotently: categories and sources are upserted by
/// slug, aliases are only ever added. Safe to re-run on every deploy.
pub async fn apply(store: &PgStore, catalog: &SourceCatalog) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut category_ids: HashMap<String, i64> = HashMap::new();

    for source in &catalog.sources {
        let category_slug = slugify(&source.category);
        let category_id = match category_ids.get(&category_slug) {
            Some(id) => *id,
            None => {
                let id = store.upsert_category(&source.category).await?;
                category_ids.insert(category_slug, id);
                report.categories += 1;
                id
            }
        };

        let source_id = store
            .upsert_source(
                &source.id,
                &source.name,
                source.description.as_deref(),
                source.url.as_deref(),
                category_id,
            )
            .await?;
        report.sources += 1;

        // The canonical display name gates itself, plus every listed alias.
        if store.ensure_alias(&slugify(&source.name), source_id).await? {
            report.aliases += 1;
        }
        for alias in &source.aliases {
            if store.ensure_alias(&slugify(alias), source_id).await? {
                report.aliases += 1;
            }
        }
    }

    info!(
        categories = report.categories,
        sources = report.sources,
        aliases = report.aliases,
        "source catalog applied"
    );
    Ok(report)
}
