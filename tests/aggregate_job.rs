// tests/aggregate_job.rs
// One invocation of the aggregation job: alias gating, category fallback,
// idempotent persistence and the successor decision.

mod support;

use std::sync::Arc;

use newswire_aggregator::error::FetchError;
use newswire_aggregator::ingest::aggregate::{run_job, AggregateJob};
use support::{article, batch, MemoryStore, ScriptedFetcher};

fn job(fetcher: ScriptedFetcher, page: u32) -> AggregateJob {
    AggregateJob {
        fetcher: Arc::new(fetcher),
        page,
    }
}

#[tokio::test]
async fn persists_records_and_schedules_the_next_page() {
    let store = MemoryStore::default().with_alias("bbc-news", 7, Some("General"));
    let fetcher = ScriptedFetcher::new(
        "newsapi",
        vec![Ok(batch(
            vec![article(
                "A Headline",
                "BBC News",
                "https://example.com/a",
                Some("Technology"),
                &["Jane Smith"],
            )],
            false,
        ))],
    );

    let report = run_job(&job(fetcher, 1), &store).await.unwrap();

    assert_eq!(report.stored, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.next_page, Some(2));

    let persisted = store.articles();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].source_id, 7);
    assert_eq!(persisted[0].category.as_deref(), Some("Technology"));
    assert_eq!(persisted[0].authors, vec!["Jane Smith".to_string()]);
}

#[tokio::test]
async fn final_page_has_no_successor() {
    let store = MemoryStore::default().with_alias("bbc-news", 7, None);
    let fetcher = ScriptedFetcher::new(
        "newsapi",
        vec![Ok(batch(
            vec![article("T", "BBC News", "https://example.com/a", None, &[])],
            true,
        ))],
    );

    let report = run_job(&job(fetcher, 3), &store).await.unwrap();
    assert_eq!(report.next_page, None);
    assert_eq!(report.stored, 1);
}

#[tokio::test]
async fn category_falls_back_to_the_source_category() {
    let store = MemoryStore::default().with_alias("bbc-news", 7, Some("General"));
    let fetcher = ScriptedFetcher::new(
        "newsapi",
        vec![Ok(batch(
            vec![article("T", "BBC News", "https://example.com/a", None, &[])],
            true,
        ))],
    );

    run_job(&job(fetcher, 1), &store).await.unwrap();
    assert_eq!(store.articles()[0].category.as_deref(), Some("General"));
}

#[tokio::test]
async fn saturation_ends_the_lineage_quietly() {
    let store = MemoryStore::default();
    let fetcher = ScriptedFetcher::new("newsapi", vec![Err(FetchError::Saturated)]);

    let report = run_job(&job(fetcher, 9), &store).await.unwrap();
    assert!(report.saturated);
    assert_eq!(report.next_page, None);
    assert!(store.articles().is_empty());
}

#[tokio::test]
async fn empty_batch_ends_the_lineage() {
    let store = MemoryStore::default();
    let fetcher = ScriptedFetcher::new("newsapi", vec![Ok(batch(Vec::new(), false))]);

    let report = run_job(&job(fetcher, 1), &store).await.unwrap();
    assert_eq!(report.next_page, None);
    assert_eq!(report.stored, 0);
}

#[tokio::test]
async fn unknown_source_is_skipped_without_aborting_siblings() {
    let store = MemoryStore::default().with_alias("bbc-news", 7, None);
    let fetcher = ScriptedFetcher::new(
        "newsapi",
        vec![Ok(batch(
            vec![
                article("A", "Daily Unknown", "https://example.com/a", None, &[]),
                article("B", "BBC News", "https://example.com/b", None, &[]),
            ],
            false,
        ))],
    );

    let report = run_job(&job(fetcher, 1), &store).await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.stored, 1);
    // The batch continued past the rejected record, and the lineage goes on.
    assert_eq!(report.next_page, Some(2));

    let persisted = store.articles();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].url, "https://example.com/b");
}

#[tokio::test]
async fn reprocessing_the_same_url_replaces_fields_and_authors() {
    let store = MemoryStore::default().with_alias("bbc-news", 7, None);

    let first = ScriptedFetcher::new(
        "newsapi",
        vec![Ok(batch(
            vec![article(
                "Old Title",
                "BBC News",
                "https://example.com/a",
                None,
                &["Jane Smith", "Bob Lee"],
            )],
            true,
        ))],
    );
    run_job(&job(first, 1), &store).await.unwrap();

    let second = ScriptedFetcher::new(
        "newsapi",
        vec![Ok(batch(
            vec![article(
                "New Title",
                "BBC News",
                "https://example.com/a",
                None,
                &["Jane Smith"],
            )],
            true,
        ))],
    );
    run_job(&job(second, 1), &store).await.unwrap();

    let persisted = store.articles();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].title, "New Title");
    // Sync, not union: the detached author is gone.
    assert_eq!(persisted[0].authors, vec!["Jane Smith".to_string()]);
}

#[tokio::test]
async fn fetch_failures_propagate_for_the_retry_policy() {
    let store = MemoryStore::default();
    let fetcher = ScriptedFetcher::new(
        "newsapi",
        vec![Err(FetchError::Upstream("boom".to_string()))],
    );

    let err = run_job(&job(fetcher, 1), &store).await.unwrap_err();
    assert!(format!("{err:#}").contains("boom"));
}

#[tokio::test]
async fn persistence_failures_propagate_for_the_retry_policy() {
    let store = MemoryStore::default()
        .with_alias("bbc-news", 7, None)
        .fail_next_persists(1);
    let fetcher = ScriptedFetcher::new(
        "newsapi",
        vec![Ok(batch(
            vec![article("T", "BBC News", "https://example.com/a", None, &[])],
            true,
        ))],
    );

    let err = run_job(&job(fetcher, 1), &store).await.unwrap_err();
    assert!(format!("{err:#}").contains("simulated persistence failure"));
}
