//! Document-fetch capability: raw byte downloads plus HTML-to-text
//! extraction for article pages.

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

use crate::types::ArticleContent;

/// Paragraphs shorter than this many words are treated as boilerplate.
const MIN_PARAGRAPH_WORDS: usize = 10;
/// Extraction keeps at most this many qualifying paragraphs.
const MAX_PARAGRAPHS: usize = 20;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// Transport-level failures of the byte-download path.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0} for {1}")]
    Status(reqwest::StatusCode, String),
}

/// Capability surface the pipeline needs for document retrieval.
/// `get_bytes` raises on transport errors; `html_extract` never does - a
/// failed fetch yields empty content with the error marker set.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
    async fn html_extract(&self, url: &str) -> ArticleContent;
}

/// reqwest-backed fetcher with per-request timeouts and rotating user agents.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
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
impl DocumentFetcher for HttpFetcher {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::random_user_agent())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status, url.to_string()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn html_extract(&self, url: &str) -> ArticleContent {
        println!("🌐 Fetching content from URL: {}", url);

        let response = match self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::random_user_agent())
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(e) => {
                eprintln!("⚠️ Error fetching article from {}: {}", url, e);
                return ArticleContent::failed(url, e);
            }
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                eprintln!("⚠️ Error reading article body from {}: {}", url, e);
                return ArticleContent::failed(url, e);
            }
        };

        let (title, content) = extract_page_text(&body);
        let content_length = content.len();

        ArticleContent {
            title,
            url: url.to_string(),
            content,
            content_length,
            error: None,
        }
    }
}

/// Pull the page title and the content-bearing paragraphs out of raw HTML.
/// Paragraphs are taken from content-marked regions when any exist, falling
/// back to every paragraph on the page; short paragraphs are dropped and the
/// result is capped at the first qualifying twenty.
fn extract_page_text(body: &str) -> (String, String) {
    let document = Html::parse_document(body);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    let content_selector = Selector::parse(
        "article p, main p, [class*=\"content\"] p, [class*=\"article\"] p, [class*=\"entry\"] p, [class*=\"post\"] p",
    );
    let fallback_selector = Selector::parse("p");

    let mut paragraphs = Vec::new();
    if let Ok(sel) = content_selector {
        collect_paragraphs(&document, &sel, &mut paragraphs);
    }
    if paragraphs.is_empty()
        && let Ok(sel) = fallback_selector
    {
        collect_paragraphs(&document, &sel, &mut paragraphs);
    }

    (title, paragraphs.join("\n\n"))
}

fn collect_paragraphs(document: &Html, selector: &Selector, out: &mut Vec<String>) {
    for element in document.select(selector) {
        if out.len() >= MAX_PARAGRAPHS {
            break;
        }
        let text = element.text().collect::<String>().trim().to_string();
        if !text.is_empty() && text.split_whitespace().count() > MIN_PARAGRAPH_WORDS {
            out.push(text);
        }
    }
}
