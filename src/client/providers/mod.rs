pub mod arxiv;
pub mod traits;

pub use arxiv::ArxivProvider;
pub use traits::{ProviderError, ProviderResult, SearchContext, SearchQuery, SortBy, SourceProvider};
