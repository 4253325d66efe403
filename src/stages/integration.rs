use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;

use crate::pipeline::{PipelineContext, PipelineState, Stage, StageUpdate, StateKey};
use crate::types::{ArticleContent, ArticleRecord};
use crate::utils::text::sanitize_filename;

/// Columns of the collected-articles CSV, in order.
pub const CSV_COLUMNS: [&str; 7] = [
    "title",
    "url",
    "source",
    "query",
    "snippet",
    "pdf_url",
    "local_pdf_path",
];

const TITLE_FRAGMENT_LEN: usize = 30;

/// Materializes the discovered set as persistent artifacts: article text
/// files, downloaded PDFs, and the collected-articles CSV. Per-item download
/// failures are logged and leave the affected field unset.
pub struct IntegrationStage;

#[async_trait]
impl Stage for IntegrationStage {
    fn name(&self) -> &'static str {
        "integration"
    }

    async fn run(&self, context: &PipelineContext, state: &PipelineState) -> Result<StageUpdate> {
        let mut articles: Vec<ArticleRecord> = state.get_or_default(StateKey::ARTICLES);
        let contents: Vec<ArticleContent> = state.get_or_default(StateKey::ARTICLE_CONTENTS);

        let data_dir = &context.config.data_dir;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {:?}", data_dir))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        // Persist each fetched article text with the 2-line header the
        // summarization stage expects.
        let url_to_filepath = write_article_files(data_dir, &articles, &contents, &timestamp)?;
        println!("💾 Saved {} article text files", url_to_filepath.len());

        // Download PDFs; a failed download leaves local_path unset.
        for article in articles.iter_mut() {
            let Some(pdf_url) = article.pdf_url.clone() else {
                continue;
            };
            match context.fetcher.get_bytes(&pdf_url).await {
                Ok(bytes) => {
                    let filename = format!(
                        "{}_{}.pdf",
                        sanitize_filename(&article.title, TITLE_FRAGMENT_LEN),
                        timestamp
                    );
                    let path = data_dir.join(filename);
                    match std::fs::write(&path, bytes) {
                        Ok(()) => article.local_path = Some(path.to_string_lossy().into_owned()),
                        Err(e) => eprintln!("⚠️ Error saving PDF for '{}': {}", article.title, e),
                    }
                }
                Err(e) => eprintln!("⚠️ Error downloading PDF {}: {}", pdf_url, e),
            }
        }

        let topic: String = state.get_or_default(StateKey::TOPIC);
        let csv_path = write_articles_csv(data_dir, &articles, &topic, &timestamp)?;
        println!("💾 Articles saved to: {}", csv_path);

        let mut update = StageUpdate::new();
        update.set(StateKey::ARTICLES, articles)?;
        update.set(StateKey::CSV_PATH, csv_path)?;
        update.set(StateKey::URL_TO_FILEPATH, url_to_filepath)?;
        Ok(update)
    }
}

/// Write one `Title:`/`URL:` headed text file per non-empty article content,
/// returning the url -> filepath mapping.
fn write_article_files(
    data_dir: &Path,
    articles: &[ArticleRecord],
    contents: &[ArticleContent],
    timestamp: &str,
) -> Result<HashMap<String, String>> {
    let mut url_to_filepath = HashMap::new();

    for (i, content) in contents.iter().enumerate() {
        if content.content_length == 0 {
            continue;
        }

        let title = articles
            .get(i)
            .map(|a| a.title.as_str())
            .unwrap_or(content.title.as_str());
        let filename = format!(
            "article_{}_{}_{}.txt",
            i,
            timestamp,
            sanitize_filename(title, TITLE_FRAGMENT_LEN)
        );
        let filepath = data_dir.join(filename);

        let body = format!(
            "Title: {}\nURL: {}\n\n{}",
            content.title, content.url, content.content
        );
        std::fs::write(&filepath, body)
            .with_context(|| format!("failed to write article file {:?}", filepath))?;

        url_to_filepath.insert(
            content.url.clone(),
            filepath.to_string_lossy().into_owned(),
        );
    }

    Ok(url_to_filepath)
}

/// Serialize the full record set to the collected-articles CSV.
pub fn write_articles_csv(
    data_dir: &Path,
    articles: &[ArticleRecord],
    topic: &str,
    timestamp: &str,
) -> Result<String> {
    let sanitized_topic = topic.replace(' ', "_").to_lowercase();
    let csv_path = data_dir.join(format!("{}_{}.csv", sanitized_topic, timestamp));

    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("failed to create CSV file {:?}", csv_path))?;
    writer.write_record(CSV_COLUMNS)?;
    for article in articles {
        writer.write_record([
            article.title.as_str(),
            article.url.as_str(),
            article.source.as_str(),
            article.query.as_str(),
            article.snippet.as_str(),
            article.pdf_url.as_deref().unwrap_or(""),
            article.local_path.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;

    Ok(csv_path.to_string_lossy().into_owned())
}
