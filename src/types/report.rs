use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ArticleRecord;

/// Per-article line of the summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummaryEntry {
    pub title: String,
    pub source: String,
    pub has_abstract: bool,
}

/// Derived, read-only run statistics produced by the transformation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub topic: String,
    pub total_articles: usize,
    pub articles_with_abstracts: usize,
    /// Source name -> record count. BTreeMap keeps the rendering stable.
    pub sources: BTreeMap<String, usize>,
    pub articles: Vec<ArticleSummaryEntry>,
}

impl SummaryReport {
    pub fn from_records(topic: &str, records: &[ArticleRecord]) -> Self {
        let mut sources = BTreeMap::new();
        let mut articles = Vec::with_capacity(records.len());
        let mut with_abstracts = 0;

        for record in records {
            *sources.entry(record.source.clone()).or_insert(0) += 1;
            let has_abstract = record
                .abstract_text
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty());
            if has_abstract {
                with_abstracts += 1;
            }
            articles.push(ArticleSummaryEntry {
                title: record.title.clone(),
                source: record.source.clone(),
                has_abstract,
            });
        }

        Self {
            topic: topic.to_string(),
            total_articles: records.len(),
            articles_with_abstracts: with_abstracts,
            sources,
            articles,
        }
    }
}
