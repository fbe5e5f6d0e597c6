//! Immutable cursor over a paginated result set.
//!
//! [`PaginatedResult`] wraps one fetched page and the fetcher that produced
//! it. Navigation never mutates a cursor: `next`, `first` and `current`
//! each perform one fetch and return a new cursor, so an older cursor keeps
//! seeing its own page.

use std::fmt;
use std::sync::Arc;

use futures_util::Stream;
use futures_util::stream;

use super::{Page, PageFetcher, Relation, RelativeLinks};
use crate::error::{ClientError, Result};

/// One page of results plus the means to reach related pages.
///
/// Cloning is cheap: the page and the fetcher are shared. Concurrent calls
/// to [`next`](Self::next) on the same value are independent and each
/// issue their own fetch.
pub struct PaginatedResult<F: PageFetcher + ?Sized> {
    fetcher: Arc<F>,
    page: Arc<Page<F::Item, F::Descriptor>>,
}

impl<F: PageFetcher + ?Sized> PaginatedResult<F> {
    /// Fetches the page described by `descriptor` and wraps it.
    ///
    /// Query constructors use this to produce the initial cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Fetch`] if the fetcher fails.
    pub async fn fetch(fetcher: Arc<F>, descriptor: &F::Descriptor) -> Result<Self> {
        tracing::debug!(?descriptor, "fetching initial page");
        let page = fetcher.fetch_page(descriptor).await?;
        Ok(Self::from_page(fetcher, page))
    }

    /// Wraps an already fetched page.
    #[must_use]
    pub fn from_page(fetcher: Arc<F>, page: Page<F::Item, F::Descriptor>) -> Self {
        Self {
            fetcher,
            page: Arc::new(page),
        }
    }

    /// Returns the current page's items in order.
    #[must_use]
    pub fn items(&self) -> &[F::Item] {
        self.page.items()
    }

    /// Returns the current page's relative links.
    #[must_use]
    pub fn links(&self) -> &RelativeLinks<F::Descriptor> {
        self.page.links()
    }

    /// Returns `true` if the current page links to a following page.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.links().contains(Relation::Next)
    }

    /// Returns `true` if the current page links to the head of the result set.
    #[must_use]
    pub fn has_first(&self) -> bool {
        self.links().contains(Relation::First)
    }

    /// Returns `true` if there is no following page.
    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Fetches the following page.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoSuchPage`] without fetching if there is no
    /// `next` link, or [`ClientError::Fetch`] if the fetcher fails.
    pub async fn next(&self) -> Result<Self> {
        self.follow(Relation::Next).await
    }

    /// Fetches the head of the result set in the original query's direction.
    ///
    /// Every page carries its own `first` link, so this works from any
    /// cursor reached through `next`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoSuchPage`] if there is no `first` link, or
    /// [`ClientError::Fetch`] if the fetcher fails.
    pub async fn first(&self) -> Result<Self> {
        self.follow(Relation::First).await
    }

    /// Fetches the current page again.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoSuchPage`] if there is no `current` link, or
    /// [`ClientError::Fetch`] if the fetcher fails.
    pub async fn current(&self) -> Result<Self> {
        self.follow(Relation::Current).await
    }

    async fn follow(&self, relation: Relation) -> Result<Self> {
        let Some(descriptor) = self.page.links().get(relation) else {
            return Err(ClientError::NoSuchPage { relation });
        };
        tracing::debug!(%relation, ?descriptor, "fetching page");
        let page = self.fetcher.fetch_page(descriptor).await?;
        Ok(Self {
            fetcher: Arc::clone(&self.fetcher),
            page: Arc::new(page),
        })
    }

    /// Turns the cursor into a stream of cursors, starting with this one and
    /// following `next` links until the last page.
    ///
    /// Pages are fetched lazily, one per poll past the current one. A fetch
    /// error is yielded once and ends the stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Self>> {
        enum Step<C> {
            Start(C),
            After(C),
            Done,
        }

        stream::unfold(Step::Start(self), |step| async move {
            match step {
                Step::Start(cursor) => Some((Ok(cursor.clone()), Step::After(cursor))),
                Step::After(cursor) if cursor.has_next() => match cursor.next().await {
                    Ok(following) => Some((Ok(following.clone()), Step::After(following))),
                    Err(err) => Some((Err(err), Step::Done)),
                },
                Step::After(_) | Step::Done => None,
            }
        })
    }
}

impl<F> PaginatedResult<F>
where
    F: PageFetcher + ?Sized,
    F::Item: Clone,
{
    /// Consumes the cursor, returning the current page's items.
    ///
    /// Items are cloned only if the page is still shared with another cursor.
    #[must_use]
    pub fn into_items(self) -> Vec<F::Item> {
        Arc::try_unwrap(self.page)
            .map_or_else(|shared| shared.items().to_vec(), Page::into_items)
    }
}

impl<F: PageFetcher + ?Sized> Clone for PaginatedResult<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            page: Arc::clone(&self.page),
        }
    }
}

impl<F: PageFetcher + ?Sized> fmt::Debug for PaginatedResult<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedResult")
            .field("items", &self.page.items().len())
            .field("links", self.page.links())
            .finish_non_exhaustive()
    }
}
