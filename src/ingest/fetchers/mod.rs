// src/ingest/fetchers/mod.rs
// One module per upstream API. Each fetcher keeps its HTTP call thin and
// funnels the payload through a pure `parse_page` function so fixture
// payloads can be exercised without a network.

pub mod guardian;
pub mod newsapi;
pub mod nytimes;
