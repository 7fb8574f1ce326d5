// src/ingest/fetchers/nytimes.rs
use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics::{counter, histogram};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::NyTimesConfig;
use crate::error::FetchError;
use crate::ingest::types::{ArticleBatch, ArticleDraft, ArticleFetcher};

pub const SOURCE: &str = "The New York Times";

/// The article search endpoint pages in fixed windows of 10 documents.
pub const ARTICLES_PER_PAGE: u64 = 10;

#[derive(Debug, Deserialize)]
struct NyTimesResponse {
    response: NyTimesBody,
}

#[derive(Debug, Default, Deserialize)]
struct NyTimesBody {
    #[serde(default)]
    docs: Vec<NyTimesDoc>,
    #[serde(default)]
    meta: NyTimesMeta,
}

#[derive(Debug, Default, Deserialize)]
struct NyTimesMeta {
    #[serde(default)]
    hits: u64,
    #[serde(default)]
    offset: u64,
}

#[derive(Debug, Deserialize)]
struct NyTimesDoc {
    headline: Option<NyTimesHeadline>,
    #[serde(rename = "abstract")]
    summary: Option<String>,
    web_url: Option<String>,
    pub_date: Option<String>,
    lead_paragraph: Option<String>,
    section_name: Option<String>,
    multimedia: Option<NyTimesMultimedia>,
    byline: Option<NyTimesByline>,
}

#[derive(Debug, Deserialize)]
struct NyTimesHeadline {
    main: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NyTimesMultimedia {
    default: Option<NyTimesImage>,
}

#[derive(Debug, Deserialize)]
struct NyTimesImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NyTimesByline {
    original: Option<String>,
}

/// Long-form outlet API. The provider pages from offset 0, so the caller's
/// 1-indexed page is translated down by one; the lookback window bounds the
/// query to recent publications.
pub struct NyTimesFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    days_to_fetch: i64,
}

impl NyTimesFetcher {
    pub fn new(client: reqwest::Client, config: &NyTimesConfig, api_key: String) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            days_to_fetch: config.days_to_fetch,
        }
    }
}

/// 1-indexed caller page to the provider's zero-indexed page parameter.
pub fn provider_page(page: u32) -> u32 {
    page.saturating_sub(1)
}

pub fn parse_page(body: &str, status: StatusCode) -> Result<ArticleBatch, FetchError> {
    let t0 = std::time::Instant::now();

    if !status.is_success() {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/fault/faultstring")
                    .or_else(|| v.pointer("/message"))
                    .and_then(|m| m.as_str().map(String::from))
            })
            .unwrap_or_else(|| status.to_string());
        return Err(FetchError::Upstream(format!(
            "nytimes api request failed: {detail}"
        )));
    }

    let data: NyTimesResponse = serde_json::from_str(body)?;

    let mut articles = Vec::with_capacity(data.response.docs.len());
    for doc in data.response.docs {
        let byline = doc.byline.and_then(|b| b.original);
        let mut authors = crate::authors::parse(byline.as_deref());
        if authors.is_empty() {
            authors = vec![format!("{SOURCE} staff")];
        }
        let article = ArticleDraft {
            title: doc.headline.and_then(|h| h.main),
            source: Some(SOURCE.to_string()),
            url: doc.web_url,
            content: doc.lead_paragraph,
            category: doc.section_name,
            authors,
            description: doc.summary,
            published_at: doc.pub_date,
            image_url: doc.multimedia.and_then(|m| m.default).and_then(|d| d.url),
        }
        .build()?;
        articles.push(article);
    }

    let meta = data.response.meta;
    let last_page = meta.offset + ARTICLES_PER_PAGE >= meta.hits;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("aggregate_parse_ms").record(ms);
    counter!("aggregate_fetched_total").increment(articles.len() as u64);

    Ok(ArticleBatch::new(articles, last_page))
}

#[async_trait]
impl ArticleFetcher for NyTimesFetcher {
    async fn fetch(&self, page: u32) -> Result<ArticleBatch, FetchError> {
        let begin_date = (Utc::now() - Duration::days(self.days_to_fetch))
            .format("%Y%m%d")
            .to_string();
        let page_param = provider_page(page).to_string();
        let params: Vec<(&str, &str)> = vec![
            ("api-key", self.api_key.as_str()),
            ("page", page_param.as_str()),
            ("sort", "newest"),
            ("begin_date", begin_date.as_str()),
        ];

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        parse_page(&body, status)
    }

    fn name(&self) -> String {
        "nytimes".to_string()
    }
}
