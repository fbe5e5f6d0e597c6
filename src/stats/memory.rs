//! In-process statistics backend.
//!
//! [`MemoryStatsStore`] holds minute-level records and answers `/stats`
//! page requests the way the remote endpoint does: inclusive bounds,
//! roll-up to the requested unit, ordering by direction and page size
//! limits. Continuation uses an opaque `cursor` parameter naming the first
//! interval of the following page, so every link keeps the original query
//! parameters and `first` is simply the request without a cursor.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Direction, Granularity, Interval, STATS_PATH, Stats, StatsQuery};
use crate::error::{ClientError, FetchError, Result};
use crate::pagination::{Page, PageFetcher, PageRequest, Relation, RelativeLinks};

/// Parameter carrying the continuation point between pages.
pub const CURSOR_PARAM: &str = "cursor";

/// Minute-granularity statistics held in memory.
///
/// Records inserted for the same minute are merged.
#[derive(Debug, Default)]
pub struct MemoryStatsStore {
    minutes: RwLock<BTreeMap<DateTime<Utc>, Stats>>,
}

impl MemoryStatsStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a minute-level record, filling in its aggregate counters.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidIntervalId`] if the record's interval
    /// id is not a minute identifier.
    pub async fn insert(&self, stats: Stats) -> Result<()> {
        let minute = Granularity::Minute.parse_interval_id(&stats.interval_id)?;
        let mut record = stats.with_totals();
        record.unit = Granularity::Minute;
        let mut minutes = self.minutes.write().await;
        match minutes.get_mut(&minute) {
            Some(existing) => existing.merge(&record),
            None => {
                minutes.insert(minute, record);
            }
        }
        Ok(())
    }

    /// Adds several minute-level records.
    ///
    /// # Errors
    ///
    /// Stops at the first record with an invalid interval id.
    pub async fn insert_all(&self, records: impl IntoIterator<Item = Stats>) -> Result<()> {
        for record in records {
            self.insert(record).await?;
        }
        Ok(())
    }

    /// Returns the number of distinct minutes stored.
    pub async fn len(&self) -> usize {
        self.minutes.read().await.len()
    }

    /// Returns `true` if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.minutes.read().await.is_empty()
    }

    /// Rolls the records inside the query bounds up to the query's unit,
    /// keyed by interval start in ascending order.
    async fn rolled_up(&self, query: &StatsQuery) -> Result<BTreeMap<DateTime<Utc>, Stats>> {
        let lower = match &query.start {
            Some(id) => Interval::parse(id)?.start,
            None => DateTime::<Utc>::MIN_UTC,
        };
        let upper = match &query.end {
            Some(id) => Some(Interval::parse(id)?.end()),
            None => None,
        };

        let minutes = self.minutes.read().await;
        let mut buckets: BTreeMap<DateTime<Utc>, Stats> = BTreeMap::new();
        for (minute, record) in minutes.range(lower..) {
            if upper.is_some_and(|upper| *minute >= upper) {
                break;
            }
            let bucket = query.unit.truncate(*minute);
            buckets
                .entry(bucket)
                .or_insert_with(|| Stats::new(query.unit.interval_id(bucket), query.unit))
                .merge(record);
        }
        Ok(buckets)
    }
}

fn bad_request(err: &ClientError) -> FetchError {
    FetchError::Status {
        status: err.status_code(),
        message: err.to_string(),
    }
}

#[async_trait]
impl PageFetcher for MemoryStatsStore {
    type Item = Stats;
    type Descriptor = PageRequest;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Stats, PageRequest>, FetchError> {
        if request.path() != STATS_PATH {
            return Err(FetchError::Status {
                status: 404,
                message: format!("no resource at {}", request.path()),
            });
        }
        let query = StatsQuery::from_params(request.params()).map_err(|e| bad_request(&e))?;
        let cursor = query
            .extra
            .iter()
            .find(|p| p.key == CURSOR_PARAM)
            .map(|p| query.unit.parse_interval_id(&p.value))
            .transpose()
            .map_err(|e| bad_request(&e))?;

        let buckets = self.rolled_up(&query).await.map_err(|e| bad_request(&e))?;
        let ordered: Box<dyn Iterator<Item = (DateTime<Utc>, Stats)> + Send> =
            match query.direction {
                Direction::Forwards => Box::new(
                    buckets
                        .into_iter()
                        .filter(move |(start, _)| cursor.is_none_or(|c| *start >= c)),
                ),
                Direction::Backwards => Box::new(
                    buckets
                        .into_iter()
                        .rev()
                        .filter(move |(start, _)| cursor.is_none_or(|c| *start <= c)),
                ),
            };

        let limit = usize::try_from(query.effective_limit()).unwrap_or(usize::MAX);
        let mut items = Vec::new();
        let mut following = None;
        for (start, record) in ordered {
            if items.len() == limit {
                following = Some(start);
                break;
            }
            items.push(record);
        }

        let mut links = RelativeLinks::new()
            .with(Relation::First, request.clone().without_param(CURSOR_PARAM))
            .with(Relation::Current, request.clone());
        if let Some(start) = following {
            links.set(
                Relation::Next,
                request
                    .clone()
                    .set_param(CURSOR_PARAM, query.unit.interval_id(start)),
            );
        }

        tracing::debug!(
            %request,
            items = items.len(),
            has_next = following.is_some(),
            "served stats page"
        );
        Ok(Page::new(items, links))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    use crate::stats::MessageCount;

    fn minute(id: &str, count: u64) -> Stats {
        let mut stats = Stats::new(id, Granularity::Minute);
        stats.inbound.realtime.messages = MessageCount::new(count, count * 100);
        stats
    }

    async fn store() -> MemoryStatsStore {
        let store = MemoryStatsStore::new();
        let inserted = store
            .insert_all([
                minute("2024-03-07:14:05", 50),
                minute("2024-03-07:14:06", 60),
                minute("2024-03-07:14:07", 70),
            ])
            .await;
        assert!(inserted.is_ok());
        store
    }

    fn counts(page: &Page<Stats, PageRequest>) -> Vec<u64> {
        page.items()
            .iter()
            .map(|s| s.inbound.all.all.count)
            .collect()
    }

    #[tokio::test]
    async fn insert_merges_same_minute() {
        let store = MemoryStatsStore::new();
        assert!(store.insert(minute("2024-03-07:14:05", 5)).await.is_ok());
        assert!(store.insert(minute("2024-03-07:14:05", 7)).await.is_ok());
        assert_eq!(store.len().await, 1);
        assert!(store.insert(minute("2024-03-07", 1)).await.is_err());
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let store = store().await;
        let result = store.fetch_page(&PageRequest::new("/channels")).await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn invalid_params_are_bad_request() {
        let store = store().await;
        let request = PageRequest::new(STATS_PATH).set_param("limit", "zero");
        let result = store.fetch_page(&request).await;
        assert!(matches!(result, Err(FetchError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn backwards_default_returns_newest_first() {
        let store = store().await;
        let Ok(page) = store.fetch_page(&PageRequest::new(STATS_PATH)).await else {
            panic!("fetch failed");
        };
        assert_eq!(counts(&page), vec![70, 60, 50]);
        assert!(!page.links().contains(Relation::Next));
    }

    #[tokio::test]
    async fn next_link_carries_cursor_and_first_drops_it() {
        let store = store().await;
        let request = StatsQuery::new()
            .direction(Direction::Forwards)
            .limit(2)
            .to_request();
        let Ok(page) = store.fetch_page(&request).await else {
            panic!("fetch failed");
        };
        assert_eq!(counts(&page), vec![50, 60]);
        let Some(next) = page.links().get(Relation::Next) else {
            panic!("expected next link");
        };
        assert_eq!(next.param(CURSOR_PARAM), Some("2024-03-07:14:07"));
        assert_eq!(page.links().get(Relation::First), Some(&request));
    }

    #[tokio::test]
    async fn start_bound_of_coarser_granularity_covers_whole_interval() {
        let store = store().await;
        let request = StatsQuery::new()
            .start("2024-03-07:14")
            .end("2024-03-07:14")
            .to_request();
        let Ok(page) = store.fetch_page(&request).await else {
            panic!("fetch failed");
        };
        assert_eq!(page.items().len(), 3);
    }
}
