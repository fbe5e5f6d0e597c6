//! REST transport: the HTTP page fetcher and `Link` header parsing.

pub mod fetcher;
pub mod link;

pub use fetcher::HttpPageFetcher;
pub use link::parse_link_headers;
