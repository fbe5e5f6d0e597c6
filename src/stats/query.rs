//! Statistics query construction.
//!
//! [`StatsQuery`] turns the recognized query parameters into the initial
//! [`PageRequest`] for the `/stats` resource, and [`stats`] fetches the
//! first page. Every later page is reached through the links the fetcher
//! returns, so the direction chosen here carries through the whole chain.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Granularity, Interval, Stats};
use crate::error::{ClientError, Result};
use crate::pagination::{PageFetcher, PageRequest, PaginatedResult, Param};

/// Path of the statistics resource.
pub const STATS_PATH: &str = "/stats";

/// Page size used when a query sets no limit.
pub const DEFAULT_LIMIT: u32 = 100;

/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 1000;

/// Ordering of a paginated query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Oldest first.
    Forwards,
    /// Newest first.
    #[default]
    Backwards,
}

impl Direction {
    /// Returns the query parameter value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Forwards => "forwards",
            Self::Backwards => "backwards",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "forwards" => Ok(Self::Forwards),
            "backwards" => Ok(Self::Backwards),
            other => Err(ClientError::invalid_param(
                "direction",
                format!("expected forwards or backwards, got `{other}`"),
            )),
        }
    }
}

/// Parameters of a statistics query.
///
/// `start` and `end` are inclusive interval identifiers of any granularity.
/// Parameters other than the recognized ones are forwarded unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsQuery {
    /// Result ordering.
    pub direction: Direction,
    /// Inclusive lower bound.
    pub start: Option<String>,
    /// Inclusive upper bound.
    pub end: Option<String>,
    /// Maximum records per page; server default when unset.
    pub limit: Option<u32>,
    /// Aggregation granularity.
    pub unit: Granularity,
    /// Unrecognized parameters, passed through in order.
    pub extra: Vec<Param>,
}

impl StatsQuery {
    /// Creates a query with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the direction.
    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the inclusive lower bound.
    #[must_use]
    pub fn start(mut self, interval_id: impl Into<String>) -> Self {
        self.start = Some(interval_id.into());
        self
    }

    /// Sets the inclusive upper bound.
    #[must_use]
    pub fn end(mut self, interval_id: impl Into<String>) -> Self {
        self.end = Some(interval_id.into());
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the aggregation granularity.
    #[must_use]
    pub const fn unit(mut self, unit: Granularity) -> Self {
        self.unit = unit;
        self
    }

    /// Builds a query from raw parameters.
    ///
    /// Recognized keys are `direction`, `start`, `end`, `limit` and `unit`;
    /// when a key repeats, the last value wins. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParam`] or
    /// [`ClientError::InvalidIntervalId`] for malformed values.
    pub fn from_params(params: &[Param]) -> Result<Self> {
        let mut query = Self::new();
        for param in params {
            match param.key.as_str() {
                "direction" => query.direction = param.value.parse()?,
                "start" => query.start = Some(param.value.clone()),
                "end" => query.end = Some(param.value.clone()),
                "limit" => {
                    let limit = param.value.parse::<u32>().map_err(|_| {
                        ClientError::invalid_param("limit", "must be a positive integer")
                    })?;
                    query.limit = Some(limit);
                }
                "unit" => query.unit = param.value.parse()?,
                _ => query.extra.push(param.clone()),
            }
        }
        query.validate()?;
        Ok(query)
    }

    /// Checks limit range and bound ordering.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParam`] if the limit is outside
    /// `1..=MAX_LIMIT` or `start` is after `end`, and
    /// [`ClientError::InvalidIntervalId`] if a bound does not parse.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.limit
            && !(1..=MAX_LIMIT).contains(&limit)
        {
            return Err(ClientError::invalid_param(
                "limit",
                format!("must be between 1 and {MAX_LIMIT}"),
            ));
        }
        let start = self.start.as_deref().map(Interval::parse).transpose()?;
        let end = self.end.as_deref().map(Interval::parse).transpose()?;
        if let (Some(start), Some(end)) = (start, end)
            && start.start >= end.end()
        {
            return Err(ClientError::invalid_param("start", "must not be after end"));
        }
        Ok(())
    }

    /// Returns the page size the server will apply.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Returns the query as ordered parameters.
    #[must_use]
    pub fn to_params(&self) -> Vec<Param> {
        let mut params = vec![Param::new("direction", self.direction.as_str())];
        if let Some(start) = &self.start {
            params.push(Param::new("start", start.as_str()));
        }
        if let Some(end) = &self.end {
            params.push(Param::new("end", end.as_str()));
        }
        if let Some(limit) = self.limit {
            params.push(Param::new("limit", limit.to_string()));
        }
        params.push(Param::new("unit", self.unit.as_str()));
        params.extend(self.extra.iter().cloned());
        params
    }

    /// Returns the request for the first page.
    #[must_use]
    pub fn to_request(&self) -> PageRequest {
        PageRequest::with_params(STATS_PATH, self.to_params())
    }
}

/// Runs a statistics query, returning the first page.
///
/// # Errors
///
/// Returns a validation error before any fetch, or
/// [`ClientError::Fetch`] if the first page cannot be retrieved.
pub async fn stats<F>(fetcher: Arc<F>, query: &StatsQuery) -> Result<PaginatedResult<F>>
where
    F: PageFetcher<Item = Stats, Descriptor = PageRequest> + ?Sized,
{
    query.validate()?;
    let request = query.to_request();
    tracing::debug!(%request, "querying stats");
    PaginatedResult::fetch(fetcher, &request).await
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<Param> {
        pairs.iter().map(|(k, v)| Param::new(*k, *v)).collect()
    }

    #[test]
    fn defaults_are_backwards_by_minute() {
        let query = StatsQuery::new();
        assert_eq!(query.direction, Direction::Backwards);
        assert_eq!(query.unit, Granularity::Minute);
        assert_eq!(query.effective_limit(), DEFAULT_LIMIT);
        assert_eq!(
            query.to_request().to_string(),
            "/stats?direction=backwards&unit=minute"
        );
    }

    #[test]
    fn from_params_reads_recognized_keys() {
        let Ok(query) = StatsQuery::from_params(&params(&[
            ("direction", "forwards"),
            ("start", "2024-03-07:14:05"),
            ("end", "2024-03-07:14:07"),
            ("limit", "1"),
            ("unit", "hour"),
            ("format", "json"),
        ])) else {
            panic!("valid params");
        };
        assert_eq!(query.direction, Direction::Forwards);
        assert_eq!(query.limit, Some(1));
        assert_eq!(query.unit, Granularity::Hour);
        assert_eq!(query.extra, params(&[("format", "json")]));
    }

    #[test]
    fn rejects_bad_values() {
        for bad in [
            params(&[("direction", "sideways")]),
            params(&[("limit", "0")]),
            params(&[("limit", "1001")]),
            params(&[("limit", "-3")]),
            params(&[("unit", "week")]),
            params(&[("start", "not-an-id")]),
            params(&[("start", "2024-03-08"), ("end", "2024-03-07")]),
        ] {
            assert!(StatsQuery::from_params(&bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn equal_bounds_are_inclusive() {
        let query = StatsQuery::new()
            .start("2024-03-07:14:05")
            .end("2024-03-07:14:05");
        assert!(query.validate().is_ok());
    }

    #[test]
    fn builder_round_trips_through_params() {
        let query = StatsQuery::new()
            .direction(Direction::Forwards)
            .start("2024-03")
            .end("2024-04")
            .limit(10)
            .unit(Granularity::Month);
        let Ok(parsed) = StatsQuery::from_params(&query.to_params()) else {
            panic!("round trip failed");
        };
        assert_eq!(parsed, query);
    }

    #[test]
    fn invalid_query_fails_before_fetching() {
        use crate::stats::MemoryStatsStore;

        let store = Arc::new(MemoryStatsStore::new());
        let query = StatsQuery::new().limit(0);
        let result = tokio_test::block_on(stats(store, &query));
        let Err(ClientError::InvalidParam { key, .. }) = result else {
            panic!("expected InvalidParam");
        };
        assert_eq!(key, "limit");
    }
}
