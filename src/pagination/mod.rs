//! Paginated retrieval of remote result sets.
//!
//! A [`PaginatedResult`] is an immutable window onto one [`Page`]. Pages
//! come from a [`PageFetcher`], which also supplies each page's
//! [`RelativeLinks`]. [`PageRequest`] is the REST descriptor shared by the
//! HTTP fetcher and the in-memory stats store.

pub mod cursor;
pub mod fetcher;
pub mod page;
pub mod request;

pub use cursor::PaginatedResult;
pub use fetcher::PageFetcher;
pub use page::{Page, Relation, RelativeLinks};
pub use request::{PageRequest, Param};
