//! Web-search capability: query-in, ranked-link-list-out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use crate::types::SearchHit;

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// Capability surface the search stage consumes. `max_results` of zero is a
/// valid request and yields an empty list.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn text_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// DuckDuckGo HTML-endpoint backend.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn random_user_agent() -> &'static str {
        USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoSearch {
    async fn text_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[("q", query)])
            .header(reqwest::header::USER_AGENT, Self::random_user_agent())
            .send()
            .await
            .context("search request failed")?
            .error_for_status()
            .context("search request rejected")?;

        let body = response.text().await.context("search response unreadable")?;
        Ok(parse_search_results(&body, max_results))
    }
}

/// Parse the result blocks out of a DuckDuckGo HTML response.
fn parse_search_results(body: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(body);

    let Ok(result_selector) = Selector::parse("div.result") else {
        return Vec::new();
    };
    let Ok(link_selector) = Selector::parse("a.result__a") else {
        return Vec::new();
    };
    let Ok(snippet_selector) = Selector::parse(".result__snippet") else {
        return Vec::new();
    };

    let mut hits = Vec::new();
    for result in document.select(&result_selector) {
        if hits.len() >= max_results {
            break;
        }
        let Some(link) = result.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href").and_then(resolve_result_url) else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        let snippet = result
            .select(&snippet_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            href,
            snippet,
        });
    }

    hits
}

/// The endpoint wraps destinations in a `/l/?uddg=` redirect; unwrap it.
fn resolve_result_url(href: &str) -> Option<String> {
    let absolute = if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    if parsed.path().starts_with("/l/") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
    } else {
        Some(absolute)
    }
}
