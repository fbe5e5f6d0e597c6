//! Page fetch capability consumed by [`PaginatedResult`](super::PaginatedResult).

use std::fmt;

use async_trait::async_trait;

use super::Page;
use crate::error::FetchError;

/// Produces pages from opaque descriptors.
///
/// Implementations own transport, authentication and decoding. A fetcher
/// returns the page together with the links to its related pages; the
/// cursor treats both as a black box and performs exactly one
/// `fetch_page` call per navigation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Item type of the paginated resource.
    type Item: Send + Sync;

    /// Descriptor identifying one page (e.g. a request specification).
    type Descriptor: Clone + fmt::Debug + Send + Sync;

    /// Fetches the page described by `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport or decoding failure. Errors are
    /// not retried by the caller.
    async fn fetch_page(
        &self,
        descriptor: &Self::Descriptor,
    ) -> Result<Page<Self::Item, Self::Descriptor>, FetchError>;
}
