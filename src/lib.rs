//! # realtime-sdk-core
//!
//! Client-side building blocks for a realtime messaging service: a typed
//! event emitter for state notifications and immutable cursors over
//! paginated REST results.
//!
//! ## Architecture
//!
//! ```text
//! Application code
//!     │
//!     ├── EventEmitter (events/)          connection / channel state
//!     │
//!     ├── stats() + StatsQuery (stats/)   initial query construction
//!     ├── PaginatedResult (pagination/)   next / first / current
//!     │       │
//!     │       └── PageFetcher
//!     │             ├── HttpPageFetcher (http/)
//!     │             └── MemoryStatsStore (stats/)
//!     │
//!     └── ClientConfig (config)
//! ```
//!
//! The emitter and the cursor are independent of each other and of any
//! particular event or resource type.

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod pagination;
pub mod stats;

pub use error::{ClientError, FetchError, Result};
