//! Fetching product pages for link ingestion.

pub mod http;
pub mod in_memory;
pub mod r#trait;

pub use http::HttpLinkFetcher;
pub use in_memory::InMemoryLinkFetcher;
pub use r#trait::{FetchError, LinkFetcher};
