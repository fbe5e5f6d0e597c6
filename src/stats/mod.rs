//! Application statistics: records, interval identifiers, the query
//! constructor, and an in-process backend.

pub mod interval;
pub mod memory;
pub mod model;
pub mod query;

pub use interval::{Granularity, Interval};
pub use memory::{CURSOR_PARAM, MemoryStatsStore};
pub use model::{MessageCount, MessageTraffic, MessageTypes, Stats};
pub use query::{DEFAULT_LIMIT, Direction, MAX_LIMIT, STATS_PATH, StatsQuery, stats};
