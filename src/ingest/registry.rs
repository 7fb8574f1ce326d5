// src/ingest/registry.rs
// Closed enumeration of configured upstream sources. Expansion into ready
// fetcher instances is the unit of dispatch: every fetcher returned here
// starts its own lineage at page 1.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::config::{ApiKeys, AppConfig};
use crate::ingest::fetchers::guardian::GuardianFetcher;
use crate::ingest::fetchers::newsapi::{NewsApiFetcher, MAX_SOURCES_PER_REQUEST};
use crate::ingest::fetchers::nytimes::NyTimesFetcher;
use crate::ingest::types::ArticleFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Newsapi,
    Nytimes,
    Guardian,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Newsapi,
        SourceKind::Nytimes,
        SourceKind::Guardian,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Newsapi => "newsapi",
            SourceKind::Nytimes => "nytimes",
            SourceKind::Guardian => "guardian",
        }
    }
}

/// Expand the requested source kinds into ready fetcher instances.
///
/// Kinds that scope requests to provider source ids are sharded into one
/// fetcher per chunk, bounded by the provider's per-request ceiling; the
/// rest yield exactly one fetcher each.
pub fn build_fetchers(
    kinds: &[SourceKind],
    config: &AppConfig,
    keys: &ApiKeys,
    client: &reqwest::Client,
) -> Result<Vec<Arc<dyn ArticleFetcher>>> {
    let mut fetchers: Vec<Arc<dyn ArticleFetcher>> = Vec::new();

    for kind in kinds {
        match kind {
            SourceKind::Newsapi => {
                let api_key = keys
                    .newsapi
                    .clone()
                    .context("NEWSAPI_KEY is not set but the newsapi source was requested")?;
                if config.newsapi.source_ids.is_empty() {
                    fetchers.push(Arc::new(NewsApiFetcher::new(
                        client.clone(),
                        &config.newsapi,
                        api_key,
                        Vec::new(),
                        "newsapi".to_string(),
                    )));
                } else {
                    for (index, chunk) in config
                        .newsapi
                        .source_ids
                        .chunks(MAX_SOURCES_PER_REQUEST)
                        .enumerate()
                    {
                        fetchers.push(Arc::new(NewsApiFetcher::new(
                            client.clone(),
                            &config.newsapi,
                            api_key.clone(),
                            chunk.to_vec(),
                            format!("newsapi[{}]", index + 1),
                        )));
                    }
                }
            }
            SourceKind::Nytimes => {
                let api_key = keys
                    .nytimes
                    .clone()
                    .context("NYT_API_KEY is not set but the nytimes source was requested")?;
                fetchers.push(Arc::new(NyTimesFetcher::new(
                    client.clone(),
                    &config.nytimes,
                    api_key,
                )));
            }
            SourceKind::Guardian => {
                let api_key = keys
                    .guardian
                    .clone()
                    .context("GUARDIAN_API_KEY is not set but the guardian source was requested")?;
                fetchers.push(Arc::new(GuardianFetcher::new(
                    client.clone(),
                    &config.guardian,
                    api_key,
                )));
            }
        }
    }

    Ok(fetchers)
}
