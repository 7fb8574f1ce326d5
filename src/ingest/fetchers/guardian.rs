// src/ingest/fetchers/guardian.rs
use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics::{counter, histogram};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::GuardianConfig;
use crate::error::FetchError;
use crate::ingest::types::{ArticleBatch, ArticleDraft, ArticleFetcher};
use crate::text::{limit, strip_tags};

pub const SOURCE: &str = "The Guardian";
pub const PER_PAGE: u32 = 100;

const DESCRIPTION_LIMIT: usize = 250;

#[derive(Debug, Deserialize)]
struct GuardianEnvelope {
    response: GuardianResponse,
}

#[derive(Debug, Default, Deserialize)]
struct GuardianResponse {
    #[serde(default, rename = "currentPage")]
    current_page: u64,
    #[serde(default)]
    pages: u64,
    #[serde(default)]
    results: Vec<GuardianResult>,
}

#[derive(Debug, Deserialize)]
struct GuardianResult {
    #[serde(rename = "webTitle")]
    web_title: Option<String>,
    #[serde(rename = "webUrl")]
    web_url: Option<String>,
    #[serde(rename = "webPublicationDate")]
    web_publication_date: Option<String>,
    #[serde(rename = "sectionName")]
    section_name: Option<String>,
    #[serde(default)]
    fields: Option<GuardianFields>,
    #[serde(default)]
    tags: Vec<GuardianTag>,
}

#[derive(Debug, Default, Deserialize)]
struct GuardianFields {
    #[serde(rename = "bodyText")]
    body_text: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuardianTag {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(rename = "webTitle")]
    web_title: Option<String>,
}

/// Archive search API: native 1-indexed pagination, date-range bounded,
/// contributor tags embedded per result.
pub struct GuardianFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    days_to_fetch: i64,
}

impl GuardianFetcher {
    pub fn new(client: reqwest::Client, config: &GuardianConfig, api_key: String) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            days_to_fetch: config.days_to_fetch,
        }
    }
}

pub fn parse_page(body: &str, status: StatusCode) -> Result<ArticleBatch, FetchError> {
    let t0 = std::time::Instant::now();

    if !status.is_success() {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/response/message")
                    .or_else(|| v.pointer("/message"))
                    .and_then(|m| m.as_str().map(String::from))
            })
            .unwrap_or_else(|| status.to_string());
        return Err(FetchError::Upstream(format!(
            "guardian api request failed: {detail}"
        )));
    }

    let data: GuardianEnvelope = serde_json::from_str(body)?;
    let response = data.response;

    let mut articles = Vec::with_capacity(response.results.len());
    for raw in response.results {
        let contributor = raw
            .tags
            .iter()
            .find(|t| t.kind == "contributor")
            .and_then(|t| t.web_title.clone());
        let author = contributor.unwrap_or_else(|| format!("{SOURCE} staff"));

        let fields = raw.fields.unwrap_or_default();
        let description = fields
            .body_text
            .as_deref()
            .map(|body| limit(&strip_tags(body), DESCRIPTION_LIMIT));

        let article = ArticleDraft {
            title: raw.web_title,
            source: Some(SOURCE.to_string()),
            url: raw.web_url,
            content: fields.body_text,
            category: raw.section_name,
            authors: vec![author],
            description,
            published_at: raw.web_publication_date,
            image_url: fields.thumbnail,
        }
        .build()?;
        articles.push(article);
    }

    let last_page = response.current_page == response.pages;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("aggregate_parse_ms").record(ms);
    counter!("aggregate_fetched_total").increment(articles.len() as u64);

    Ok(ArticleBatch::new(articles, last_page))
}

#[async_trait]
impl ArticleFetcher for GuardianFetcher {
    async fn fetch(&self, page: u32) -> Result<ArticleBatch, FetchError> {
        let now = Utc::now();
        let from_date = (now - Duration::days(self.days_to_fetch))
            .format("%Y-%m-%d")
            .to_string();
        let to_date = now.format("%Y-%m-%d").to_string();
        let page_param = page.to_string();
        let page_size = PER_PAGE.to_string();
        let params: Vec<(&str, &str)> = vec![
            ("api-key", self.api_key.as_str()),
            ("from-date", from_date.as_str()),
            ("to-date", to_date.as_str()),
            ("page", page_param.as_str()),
            ("page-size", page_size.as_str()),
            ("order-by", "newest"),
            ("show-fields", "bodyText,thumbnail"),
            ("show-tags", "contributor"),
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
        "guardian".to_string()
    }
}
