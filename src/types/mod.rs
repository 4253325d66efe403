pub mod article;
pub mod plan;
pub mod report;

pub use article::{AbstractResult, ArticleContent, ArticleRecord, SearchHit};
pub use plan::ResearchPlan;
pub use report::{ArticleSummaryEntry, SummaryReport};
