// src/ingest/fetchers/newsapi.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::NewsApiConfig;
use crate::error::FetchError;
use crate::ingest::types::{ArticleBatch, ArticleDraft, ArticleFetcher};

pub const PER_PAGE: u64 = 100;

/// Upstream cap on comma-joined source ids per request.
pub const MAX_SOURCES_PER_REQUEST: usize = 20;

/// Error code the provider uses when a key/plan has paged past its cap.
const MAXIMUM_RESULTS_REACHED: &str = "maximumResultsReached";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default, rename = "totalResults")]
    total_results: u64,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    source: Option<NewsApiSourceRef>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSourceRef {
    #[serde(default)]
    name: Option<String>,
}

/// Generic news aggregation API. Articles carry their own outlet display
/// name, so one fetcher covers many publishers; the scope chunk (at most
/// [`MAX_SOURCES_PER_REQUEST`] provider ids) is fixed at construction and
/// each chunk runs as its own lineage.
pub struct NewsApiFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: String,
    scope: Vec<String>,
    label: String,
}

impl NewsApiFetcher {
    pub fn new(
        client: reqwest::Client,
        config: &NewsApiConfig,
        api_key: String,
        scope: Vec<String>,
        label: String,
    ) -> Self {
        debug_assert!(scope.len() <= MAX_SOURCES_PER_REQUEST);
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            language: config.language.clone(),
            scope,
            label,
        }
    }
}

/// Map one response payload into a batch. Saturation is reported via the
/// provider's error code on a failed response, not by an empty page.
pub fn parse_page(body: &str, status: StatusCode, page: u32) -> Result<ArticleBatch, FetchError> {
    let t0 = std::time::Instant::now();
    let data: NewsApiResponse = serde_json::from_str(body)?;

    if !status.is_success() {
        if data.code.as_deref() == Some(MAXIMUM_RESULTS_REACHED) {
            return Err(FetchError::Saturated);
        }
        return Err(FetchError::Upstream(format!(
            "news api request failed: {}",
            data.message.unwrap_or_else(|| status.to_string())
        )));
    }

    let mut articles = Vec::with_capacity(data.articles.len());
    for raw in data.articles {
        let source = raw.source.and_then(|s| s.name);
        let mut authors = crate::authors::parse(raw.author.as_deref());
        if authors.is_empty() {
            // Byline-less articles are attributed to the outlet's staff.
            if let Some(outlet) = source.as_deref() {
                authors = vec![format!("{outlet} staff")];
            }
        }
        let article = ArticleDraft {
            title: raw.title,
            source,
            url: raw.url,
            content: raw.content,
            category: None,
            authors,
            description: raw.description,
            published_at: raw.published_at,
            image_url: raw.url_to_image,
        }
        .build()?;
        articles.push(article);
    }

    // Best effort: the result set can shift between requests, so the page
    // count is whatever this response claims.
    let total_pages = data.total_results.div_ceil(PER_PAGE);
    let last_page = u64::from(page) == total_pages;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("aggregate_parse_ms").record(ms);
    counter!("aggregate_fetched_total").increment(articles.len() as u64);

    Ok(ArticleBatch::new(articles, last_page))
}

#[async_trait]
impl ArticleFetcher for NewsApiFetcher {
    async fn fetch(&self, page: u32) -> Result<ArticleBatch, FetchError> {
        let page_param = page.to_string();
        let page_size = PER_PAGE.to_string();
        let joined_scope = self.scope.join(",");
        let mut params: Vec<(&str, &str)> = vec![
            ("apiKey", self.api_key.as_str()),
            ("language", self.language.as_str()),
            ("page", page_param.as_str()),
            ("pageSize", page_size.as_str()),
        ];
        if !self.scope.is_empty() {
            params.push(("sources", joined_scope.as_str()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        parse_page(&body, status, page)
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}
