pub mod cache;
pub mod previews;
pub mod queries;

pub use cache::QueryCache;
pub use previews::PreviewStore;
pub use queries::Queries;
