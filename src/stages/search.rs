use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use url::Url;

use crate::pipeline::{PipelineContext, PipelineState, Stage, StageUpdate, StateKey};
use crate::types::{ArticleRecord, ResearchPlan, SearchHit};

/// Searches the trusted domain for each planned query, collects deduplicated
/// article records, and fetches the rendered page text for each of them.
/// Per-query failures are logged and skipped; this stage only fails if the
/// state machinery itself does.
pub struct SearchStage;

#[async_trait]
impl Stage for SearchStage {
    fn name(&self) -> &'static str {
        "searching"
    }

    async fn run(&self, context: &PipelineContext, state: &PipelineState) -> Result<StageUpdate> {
        let topic: String = state.get_or_default(StateKey::TOPIC);
        let plan: ResearchPlan = state
            .get(StateKey::PLAN)
            .unwrap_or_else(|| ResearchPlan::fallback(&topic));

        let articles = search_articles(context, &plan).await;
        println!("🔍 Search completed. Found {} unique articles", articles.len());

        // Fetch the rendered text of each article page.
        let mut article_contents = Vec::with_capacity(articles.len());
        for (i, article) in articles.iter().enumerate() {
            println!(
                "📄 Fetching content for article {}/{}: {}",
                i + 1,
                articles.len(),
                article.title
            );
            let content = context.fetcher.html_extract(&article.url).await;
            article_contents.push(content);
        }

        let mut update = StageUpdate::new();
        update.set(StateKey::ARTICLES, articles)?;
        update.set(StateKey::ARTICLE_CONTENTS, article_contents)?;
        Ok(update)
    }
}

async fn search_articles(context: &PipelineContext, plan: &ResearchPlan) -> Vec<ArticleRecord> {
    let search_config = &context.config.search;
    let queries = &plan.search_queries;
    if queries.is_empty() {
        return Vec::new();
    }

    // Distribute the overall budget across queries. Integer division means a
    // query list longer than the budget yields a zero share, which the
    // backend answers with an empty list; tolerated, not an error.
    let per_query = search_config.max_results / queries.len();
    if per_query == 0 {
        println!(
            "⚠️ Result budget {} is below the query count {}; queries will return no results",
            search_config.max_results,
            queries.len()
        );
    }

    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut results = Vec::new();

    for query in queries {
        println!("🔍 Executing search query: {}", query);
        let scoped_query = format!("site:{} {}", search_config.domain, query);

        match context.search.text_search(&scoped_query, per_query).await {
            Ok(hits) => {
                for hit in hits {
                    if !is_trusted_host(&hit.href, &search_config.domain) {
                        continue;
                    }
                    if hit.href.is_empty() || !seen_urls.insert(hit.href.clone()) {
                        continue;
                    }
                    let record = to_record(&hit, query, &search_config.domain);
                    println!("   Found article: {}", record.title);
                    results.push(record);
                }
            }
            Err(e) => {
                eprintln!("⚠️ Error searching for query '{}': {}", query, e);
            }
        }

        // Be nice to the search engine.
        tokio::time::sleep(Duration::from_millis(search_config.query_pause_ms)).await;
    }

    results
}

fn to_record(hit: &SearchHit, query: &str, source: &str) -> ArticleRecord {
    ArticleRecord {
        title: hit.title.clone(),
        url: hit.href.clone(),
        snippet: hit.snippet.clone(),
        source: source.to_string(),
        query: query.to_string(),
        pdf_url: derive_pdf_url(&hit.href),
        ..Default::default()
    }
}

/// Host-suffix validation against the trusted domain.
pub fn is_trusted_host(raw_url: &str, domain: &str) -> bool {
    Url::parse(raw_url)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .is_some_and(|host| host == domain || host.ends_with(&format!(".{domain}")))
}

/// Canonical document-fetch URL for an arXiv hit: abstract pages rewrite to
/// their PDF view, PDF URLs pass through (gaining a `.pdf` suffix when
/// absent), and anything else gets a URL synthesized from the numeric
/// identifier when one is present.
pub fn derive_pdf_url(url: &str) -> Option<String> {
    if url.contains("/abs/") {
        return Some(format!("{}.pdf", url.replace("/abs/", "/pdf/")));
    }
    if url.contains("/pdf/") {
        return Some(if url.ends_with(".pdf") {
            url.to_string()
        } else {
            format!("{url}.pdf")
        });
    }
    let re = Regex::new(r"(\d+\.\d+)").ok()?;
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| format!("https://arxiv.org/pdf/{}.pdf", id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_host_accepts_domain_and_subdomains() {
        assert!(is_trusted_host("https://arxiv.org/abs/2401.00001", "arxiv.org"));
        assert!(is_trusted_host("http://export.arxiv.org/abs/2401.00001", "arxiv.org"));
    }

    #[test]
    fn test_trusted_host_rejects_lookalikes() {
        assert!(!is_trusted_host("https://notarxiv.org/abs/2401.00001", "arxiv.org"));
        assert!(!is_trusted_host("https://arxiv.org.evil.com/abs/1", "arxiv.org"));
        assert!(!is_trusted_host("not a url", "arxiv.org"));
    }

    #[test]
    fn test_pdf_url_from_abstract_page() {
        assert_eq!(
            derive_pdf_url("https://arxiv.org/abs/2401.00001").unwrap(),
            "https://arxiv.org/pdf/2401.00001.pdf"
        );
    }

    #[test]
    fn test_pdf_url_passthrough() {
        assert_eq!(
            derive_pdf_url("https://arxiv.org/pdf/2401.00001.pdf").unwrap(),
            "https://arxiv.org/pdf/2401.00001.pdf"
        );
        assert_eq!(
            derive_pdf_url("https://arxiv.org/pdf/2401.00001").unwrap(),
            "https://arxiv.org/pdf/2401.00001.pdf"
        );
    }

    #[test]
    fn test_pdf_url_synthesized_from_identifier() {
        assert_eq!(
            derive_pdf_url("https://arxiv.org/html/2401.00001v2").unwrap(),
            "https://arxiv.org/pdf/2401.00001.pdf"
        );
    }

    #[test]
    fn test_pdf_url_absent_without_identifier() {
        assert!(derive_pdf_url("https://arxiv.org/list/cs.LG/recent").is_none());
    }
}
