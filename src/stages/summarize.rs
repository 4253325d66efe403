use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::llm::LanguageModel;
use crate::pipeline::{PipelineContext, PipelineState, Stage, StageUpdate, StateKey};
use crate::retrieval::{KnowledgeBase, content_id};
use crate::types::{AbstractResult, ArticleRecord};
use crate::utils::text::truncate_with_marker;
use crate::utils::threads::do_parallel_with_limit;

const SYSTEM_PROMPT: &str =
    "You are an academic writing assistant. You produce concise, self-contained abstracts.";

/// Body text below these thresholds counts as insufficient for a useful
/// abstract and triggers the PDF fallback extraction when one is available.
const MIN_BODY_WORDS: usize = 100;
const MIN_PARAGRAPH_BREAKS: usize = 2;

/// Lines of the article-file header (`Title:`, `URL:`, blank).
const HEADER_LINES: usize = 3;

/// Generates an abstract for every article text file via a bounded worker
/// fan-out. Each task isolates its own failure into an error-flagged result;
/// the output always has exactly one entry per input path.
pub struct SummarizationStage;

#[async_trait]
impl Stage for SummarizationStage {
    fn name(&self) -> &'static str {
        "abstracting"
    }

    async fn run(&self, context: &PipelineContext, state: &PipelineState) -> Result<StageUpdate> {
        let url_to_filepath: HashMap<String, String> =
            state.get_or_default(StateKey::URL_TO_FILEPATH);
        let articles: Vec<ArticleRecord> = state.get_or_default(StateKey::ARTICLES);

        // Map each text file back to the record's PDF source, if known.
        let pdf_by_path: HashMap<String, String> = articles
            .iter()
            .filter_map(|a| {
                let path = url_to_filepath.get(&a.url)?;
                let pdf_url = a.pdf_url.clone()?;
                Some((path.clone(), pdf_url))
            })
            .collect();

        let max_parallels = context.config.llm.max_parallels;
        println!(
            "📝 Generating abstracts for {} articles (up to {} in parallel)",
            url_to_filepath.len(),
            max_parallels
        );

        let tasks: Vec<_> = url_to_filepath
            .values()
            .map(|filepath| {
                let filepath = filepath.clone();
                let pdf_url = pdf_by_path.get(&filepath).cloned();
                let language_model = context.language_model.clone();
                let knowledge_base = context.knowledge_base.clone();
                let max_content_length = context.config.llm.max_content_length;
                let max_words = context.config.llm.abstract_max_words;
                async move {
                    match process_article_file(
                        &filepath,
                        pdf_url.as_deref(),
                        language_model,
                        knowledge_base,
                        max_content_length,
                        max_words,
                    )
                    .await
                    {
                        Ok(result) => {
                            println!("✅ Abstract generated for: {}", filepath);
                            result
                        }
                        Err(e) => {
                            eprintln!("⚠️ Error processing {}: {}", filepath, e);
                            AbstractResult::failed(&filepath, e)
                        }
                    }
                }
            })
            .collect();

        let abstracts = do_parallel_with_limit(tasks, max_parallels).await;
        println!("📝 Completed abstract generation for {} articles", abstracts.len());

        let mut update = StageUpdate::new();
        update.set(StateKey::ABSTRACTS, abstracts)?;
        Ok(update)
    }
}

/// Process one article file: read it, split off the header, fall back to PDF
/// extraction when the local text is too thin, truncate to the character
/// budget and request the abstract.
async fn process_article_file(
    filepath: &str,
    pdf_url: Option<&str>,
    language_model: Arc<dyn LanguageModel>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    max_content_length: usize,
    max_words: usize,
) -> Result<AbstractResult> {
    let content = tokio::fs::read_to_string(filepath).await?;

    let title = content
        .lines()
        .find(|line| line.starts_with("Title:"))
        .map(|line| line.trim_start_matches("Title:").trim().to_string())
        .unwrap_or_default();

    let mut body: String = content
        .lines()
        .skip(HEADER_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    if is_insufficient(&body)
        && let Some(pdf_url) = pdf_url
    {
        println!("🔎 Local text too thin, extracting from PDF: {}", pdf_url);
        match knowledge_base
            .extract_pdf(pdf_url, &content_id(pdf_url))
            .await
        {
            Ok(richer) => body = richer,
            Err(e) => eprintln!("⚠️ PDF fallback failed for {}: {}", pdf_url, e),
        }
    }

    let body = truncate_with_marker(&body, max_content_length);
    let prompt = build_prompt(&title, &body, max_words);
    let abstract_text = language_model.invoke(SYSTEM_PROMPT, &prompt).await?;

    Ok(AbstractResult {
        file_path: filepath.to_string(),
        title,
        abstract_text: abstract_text.trim().to_string(),
        error: None,
    })
}

/// Heuristic for locally available text that is not worth summarizing as-is.
fn is_insufficient(body: &str) -> bool {
    body.split_whitespace().count() < MIN_BODY_WORDS
        || body.matches("\n\n").count() < MIN_PARAGRAPH_BREAKS
}

fn build_prompt(title: &str, content: &str, max_words: usize) -> String {
    format!(
        r#"Article Title: {title}

Article Content:
{content}

Please provide a concise academic abstract of the above article content in no more than {max_words} words.
Focus on the main findings, methodology, and implications.
The abstract should be informative and self-contained, allowing readers to quickly understand
the key points of the article without reading the full text.

Abstract:"#
    )
}
