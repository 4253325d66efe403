use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;

use crate::pipeline::{PipelineContext, PipelineState, Stage, StageUpdate, StateKey};
use crate::types::{AbstractResult, ArticleRecord, SummaryReport};

/// Columns of the final enriched CSV, in order.
pub const FINAL_CSV_COLUMNS: [&str; 5] =
    ["title", "authors", "link", "abstract", "local_pdf_path"];

/// Merges generated abstracts back onto the article records, fills the
/// remaining gaps from the knowledge base, writes the final CSV and computes
/// the summary report.
pub struct TransformationStage;

#[async_trait]
impl Stage for TransformationStage {
    fn name(&self) -> &'static str {
        "transformation"
    }

    async fn run(&self, context: &PipelineContext, state: &PipelineState) -> Result<StageUpdate> {
        let mut articles: Vec<ArticleRecord> = state.get_or_default(StateKey::ARTICLES);
        let abstracts: Vec<AbstractResult> = state.get_or_default(StateKey::ABSTRACTS);
        let url_to_filepath: HashMap<String, String> =
            state.get_or_default(StateKey::URL_TO_FILEPATH);
        let topic: String = state.get_or_default(StateKey::TOPIC);

        merge_abstracts(&mut articles, &abstracts, &url_to_filepath);

        // Any record still missing a field after the merge is answered from
        // the indexed knowledge base, one field at a time. A failed lookup
        // leaves the field unset and is attached to the record's error.
        for article in articles.iter_mut() {
            if article.abstract_text.as_deref().is_none_or(str::is_empty) {
                match context.knowledge_base.retrieve_abstract().await {
                    Ok(value) if !value.is_empty() => article.abstract_text = Some(value),
                    Ok(_) => {}
                    Err(e) => record_lookup_error(article, "abstract", &e),
                }
            }
            if article.authors.as_deref().is_none_or(str::is_empty) {
                match context.knowledge_base.retrieve_authors().await {
                    Ok(value) if !value.is_empty() => article.authors = Some(value),
                    Ok(_) => {}
                    Err(e) => record_lookup_error(article, "authors", &e),
                }
            }
            if article.link.as_deref().is_none_or(str::is_empty) {
                match context.knowledge_base.retrieve_link().await {
                    Ok(value) if !value.is_empty() => article.link = Some(value),
                    Ok(_) => {}
                    Err(e) => record_lookup_error(article, "link", &e),
                }
            }
        }

        let data_dir = &context.config.data_dir;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {:?}", data_dir))?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let final_csv_path = write_final_csv(data_dir, &articles, &topic, &timestamp)?;
        println!("🔄 Detailed CSV saved to: {}", final_csv_path);

        let report = SummaryReport::from_records(&topic, &articles);

        let mut update = StageUpdate::new();
        update.set(StateKey::ARTICLES, articles)?;
        update.set(StateKey::FINAL_CSV_PATH, final_csv_path)?;
        update.set(StateKey::REPORT, report)?;
        Ok(update)
    }
}

/// Log a failed knowledge-base lookup and attach it to the record. The
/// first recorded error wins; later failures on the same record are only
/// logged.
fn record_lookup_error(article: &mut ArticleRecord, field: &str, e: &anyhow::Error) {
    eprintln!(
        "⚠️ Error retrieving '{}' for '{}': {:#}",
        field, article.title, e
    );
    article
        .error
        .get_or_insert_with(|| format!("Error retrieving {}: {:#}", field, e));
}

/// Attach each abstract to its record, keyed by the article's local text
/// file path rather than by position. Error-flagged results carry their
/// error onto the record; the record itself is never dropped.
fn merge_abstracts(
    articles: &mut [ArticleRecord],
    abstracts: &[AbstractResult],
    url_to_filepath: &HashMap<String, String>,
) {
    let by_path: HashMap<&str, &AbstractResult> = abstracts
        .iter()
        .map(|a| (a.file_path.as_str(), a))
        .collect();

    for article in articles.iter_mut() {
        let Some(filepath) = url_to_filepath.get(&article.url) else {
            continue;
        };
        let Some(result) = by_path.get(filepath.as_str()) else {
            continue;
        };
        article.abstract_text = Some(result.abstract_text.clone());
        if let Some(error) = &result.error {
            article.error = Some(error.clone());
        }
    }
}

/// Serialize the enriched record set to the final CSV, blank-filling any
/// missing column.
pub fn write_final_csv(
    data_dir: &Path,
    articles: &[ArticleRecord],
    topic: &str,
    timestamp: &str,
) -> Result<String> {
    let sanitized_topic = topic.replace(' ', "_").to_lowercase();
    let csv_path = data_dir.join(format!("final_{}_{}.csv", sanitized_topic, timestamp));

    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("failed to create CSV file {:?}", csv_path))?;
    writer.write_record(FINAL_CSV_COLUMNS)?;
    for article in articles {
        writer.write_record([
            article.title.as_str(),
            article.authors.as_deref().unwrap_or(""),
            article.link.as_deref().unwrap_or(""),
            article.abstract_text.as_deref().unwrap_or(""),
            article.local_path.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;

    Ok(csv_path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(title: &str, url: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            url: url.to_string(),
            source: "arxiv.org".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_abstracts_by_path() {
        let mut articles = vec![record("One", "https://a/1"), record("Two", "https://a/2")];
        let url_to_filepath = HashMap::from([
            ("https://a/1".to_string(), "/tmp/one.txt".to_string()),
            ("https://a/2".to_string(), "/tmp/two.txt".to_string()),
        ]);
        let abstracts = vec![
            AbstractResult {
                file_path: "/tmp/two.txt".to_string(),
                title: "Two".to_string(),
                abstract_text: "second abstract".to_string(),
                error: None,
            },
            AbstractResult::failed("/tmp/one.txt", "model exploded"),
        ];

        merge_abstracts(&mut articles, &abstracts, &url_to_filepath);

        assert_eq!(articles[1].abstract_text.as_deref(), Some("second abstract"));
        assert!(articles[1].error.is_none());
        assert_eq!(articles[0].error.as_deref(), Some("model exploded"));
        // The failed record survives with its error recorded.
        assert_eq!(articles.len(), 2);
    }

    #[test]
    fn test_merge_tolerates_unknown_paths() {
        let mut articles = vec![record("One", "https://a/1")];
        let abstracts = vec![AbstractResult {
            file_path: "/tmp/unrelated.txt".to_string(),
            title: String::new(),
            abstract_text: "x".to_string(),
            error: None,
        }];
        merge_abstracts(&mut articles, &abstracts, &HashMap::new());
        assert!(articles[0].abstract_text.is_none());
    }

    #[test]
    fn test_final_csv_blank_fills_missing_columns() {
        let temp_dir = TempDir::new().unwrap();
        let mut enriched = record("Full", "https://a/1");
        enriched.authors = Some("Ada Lovelace".to_string());
        enriched.link = Some("https://a/1".to_string());
        enriched.abstract_text = Some("an abstract".to_string());
        let articles = vec![enriched, record("Bare", "https://a/2")];

        let path =
            write_final_csv(temp_dir.path(), &articles, "topic", "20260101_000000").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "title,authors,link,abstract,local_pdf_path"
        );
        assert_eq!(lines.next().unwrap(), "Full,Ada Lovelace,https://a/1,an abstract,");
        assert_eq!(lines.next().unwrap(), "Bare,,,,");
    }

    #[test]
    fn test_summary_report_counts() {
        let mut one = record("One", "https://a/1");
        one.abstract_text = Some("abstract".to_string());
        let two = record("Two", "https://a/2");
        let report = SummaryReport::from_records("topic", &[one, two]);

        assert_eq!(report.total_articles, 2);
        assert_eq!(report.articles_with_abstracts, 1);
        assert_eq!(report.sources.get("arxiv.org"), Some(&2));
        assert!(report.articles[0].has_abstract);
        assert!(!report.articles[1].has_abstract);
    }
}
