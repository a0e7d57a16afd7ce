pub mod bibliography;
pub mod search;
pub mod summarize;

pub use bibliography::BibliographyTool;
pub use search::SearchTool;
pub use summarize::SummarizeTool;
