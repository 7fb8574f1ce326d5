// src/ingest/aggregate.rs
// One aggregation job invocation: fetch a single page, run every record
// through the alias gate, persist each in its own transaction, and decide
// whether the lineage continues.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics::counter;
use tracing::{info, warn};

use crate::ingest::types::ArticleFetcher;
use crate::store::ArticleStore;
use crate::text::slugify;

/// Durable unit of work: which fetcher, which page. All other state lives in
/// the database, so a retried or duplicated job is harmless.
#[derive(Clone)]
pub struct AggregateJob {
    pub fetcher: Arc<dyn ArticleFetcher>,
    pub page: u32,
}

impl AggregateJob {
    pub fn first(fetcher: Arc<dyn ArticleFetcher>) -> Self {
        Self { fetcher, page: 1 }
    }

    fn successor(&self, page: u32) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            page,
        }
    }

    /// Build the follow-up job for a report, if the lineage continues.
    pub fn next_from(&self, report: &PageReport) -> Option<AggregateJob> {
        report.next_page.map(|page| self.successor(page))
    }
}

/// Result of one successful invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub stored: u64,
    pub skipped: u64,
    /// Page to enqueue next; `None` ends the lineage.
    pub next_page: Option<u32>,
    pub saturated: bool,
}

impl PageReport {
    fn saturated() -> Self {
        Self {
            saturated: true,
            ..Default::default()
        }
    }
}

/// Run one `(fetcher, page)` transition.
///
/// Saturation ends the lineage quietly; an empty batch ends it without a
/// successor; fetch and persistence failures bubble up for the queue's
/// retry policy. A record whose publisher fails the alias gate is skipped
/// without aborting its siblings.
pub async fn run_job(job: &AggregateJob, store: &dyn ArticleStore) -> Result<PageReport> {
    let source = job.fetcher.name();

    let batch = match job.fetcher.fetch(job.page).await {
        Ok(batch) => batch,
        Err(err) if err.is_saturated() => {
            info!(source, page = job.page, "upstream saturated, lineage ends");
            counter!("aggregate_saturated_total").increment(1);
            return Ok(PageReport::saturated());
        }
        Err(err) => {
            counter!("aggregate_fetch_errors_total").increment(1);
            return Err(err).with_context(|| format!("fetching {source} page {}", job.page));
        }
    };

    counter!("aggregate_pages_total").increment(1);

    if batch.is_empty() {
        info!(source, page = job.page, "empty page, lineage ends");
        return Ok(PageReport::default());
    }

    let mut report = PageReport::default();
    for article in batch.iter() {
        let alias_slug = slugify(article.source());
        let resolved = store
            .resolve_alias(&alias_slug)
            .await
            .with_context(|| format!("resolving source alias {alias_slug}"))?;

        let Some(resolved) = resolved else {
            warn!(
                source = article.source(),
                url = article.url(),
                "source not in the allow-list, skipping article"
            );
            counter!("aggregate_unknown_source_total").increment(1);
            report.skipped += 1;
            continue;
        };

        let category_label = article.category().or(resolved.category_name.as_deref());

        store
            .persist_article(article, &resolved, category_label)
            .await
            .with_context(|| format!("persisting article {}", article.url()))?;
        report.stored += 1;
    }

    counter!("aggregate_articles_total").increment(report.stored);

    if !batch.is_last_page() {
        report.next_page = Some(job.page + 1);
    }
    Ok(report)
}
