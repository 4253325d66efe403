//! Stage units of the research pipeline. Each stage reads a subset of the
//! shared state, performs its work through the capability adapters, and
//! returns a partial-state update for the driver to merge.

pub mod integration;
pub mod planning;
pub mod search;
pub mod summarize;
pub mod transform;
pub mod writing;

pub use integration::IntegrationStage;
pub use planning::PlanningStage;
pub use search::SearchStage;
pub use summarize::SummarizationStage;
pub use transform::TransformationStage;
pub use writing::WritingStage;
