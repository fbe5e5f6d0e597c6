//! Application statistics records.
//!
//! A [`Stats`] record covers one interval and counts inbound and outbound
//! message traffic. Records at coarser granularities are produced by
//! merging finer ones.

use serde::{Deserialize, Serialize};

use super::Granularity;

/// Count and byte volume of a message category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCount {
    /// Number of messages.
    #[serde(default)]
    pub count: u64,
    /// Total payload size in bytes.
    #[serde(default)]
    pub data: u64,
}

impl MessageCount {
    /// Creates a count.
    #[must_use]
    pub const fn new(count: u64, data: u64) -> Self {
        Self { count, data }
    }

    /// Adds `other` into `self`.
    pub const fn merge(&mut self, other: &Self) {
        self.count = self.count.saturating_add(other.count);
        self.data = self.data.saturating_add(other.data);
    }

    /// Returns `true` if both counters are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.count == 0 && self.data == 0
    }
}

/// Message counts split by message type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTypes {
    /// All message types together.
    pub all: MessageCount,
    /// Ordinary messages.
    pub messages: MessageCount,
    /// Presence messages.
    pub presence: MessageCount,
}

impl MessageTypes {
    /// Adds `other` into `self`.
    pub const fn merge(&mut self, other: &Self) {
        self.all.merge(&other.all);
        self.messages.merge(&other.messages);
        self.presence.merge(&other.presence);
    }

    /// Fills an empty `all` with the sum of the per-type counts.
    ///
    /// A non-zero `all` is kept as reported, since it may cover types
    /// that are not broken out.
    pub const fn fill_totals(&mut self) {
        if self.all.is_zero() {
            let mut total = self.messages;
            total.merge(&self.presence);
            self.all = total;
        }
    }

    /// Returns `true` if every counter is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.all.is_zero() && self.messages.is_zero() && self.presence.is_zero()
    }
}

/// Message counts split by transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTraffic {
    /// All transports together.
    pub all: MessageTypes,
    /// Realtime connections.
    pub realtime: MessageTypes,
    /// REST requests.
    pub rest: MessageTypes,
}

impl MessageTraffic {
    /// Adds `other` into `self`.
    pub const fn merge(&mut self, other: &Self) {
        self.all.merge(&other.all);
        self.realtime.merge(&other.realtime);
        self.rest.merge(&other.rest);
    }

    /// Fills empty `all` aggregates from the per-transport counts.
    ///
    /// Aggregates that were reported non-zero are kept.
    pub const fn fill_totals(&mut self) {
        self.realtime.fill_totals();
        self.rest.fill_totals();
        if self.all.is_zero() {
            let mut total = self.realtime;
            total.merge(&self.rest);
            self.all = total;
        } else {
            self.all.fill_totals();
        }
    }
}

/// Statistics for one interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Interval identifier at [`unit`](Self::unit) granularity.
    pub interval_id: String,
    /// Granularity of this record.
    #[serde(default)]
    pub unit: Granularity,
    /// Traffic received by the service.
    #[serde(default)]
    pub inbound: MessageTraffic,
    /// Traffic delivered by the service.
    #[serde(default)]
    pub outbound: MessageTraffic,
}

impl Stats {
    /// Creates an empty record for `interval_id` at `unit` granularity.
    pub fn new(interval_id: impl Into<String>, unit: Granularity) -> Self {
        Self {
            interval_id: interval_id.into(),
            unit,
            inbound: MessageTraffic::default(),
            outbound: MessageTraffic::default(),
        }
    }

    /// Adds the traffic of `other` into `self`, keeping this record's interval.
    pub fn merge(&mut self, other: &Self) {
        self.inbound.merge(&other.inbound);
        self.outbound.merge(&other.outbound);
    }

    /// Fills every empty `all` aggregate from the detailed counts.
    #[must_use]
    pub fn with_totals(mut self) -> Self {
        self.inbound.fill_totals();
        self.outbound.fill_totals();
        self
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn realtime_messages(count: u64) -> Stats {
        let mut stats = Stats::new("2024-03-07:14:05", Granularity::Minute);
        stats.inbound.realtime.messages = MessageCount::new(count, count * 100);
        stats.with_totals()
    }

    #[test]
    fn totals_roll_up_to_all_all() {
        let stats = realtime_messages(50);
        assert_eq!(stats.inbound.all.all, MessageCount::new(50, 5000));
        assert_eq!(stats.inbound.realtime.all.count, 50);
        assert_eq!(stats.outbound.all.all.count, 0);
    }

    #[test]
    fn merge_sums_every_counter() {
        let mut total = Stats::new("2024-03-07:14", Granularity::Hour);
        for count in [50, 60, 70] {
            total.merge(&realtime_messages(count));
        }
        assert_eq!(total.inbound.all.all.count, 180);
        assert_eq!(total.inbound.all.all.data, 18_000);
        assert_eq!(total.interval_id, "2024-03-07:14");
    }

    #[test]
    fn reported_total_is_kept_when_types_are_partial() {
        let mut stats = Stats::new("2024-03-07:14:05", Granularity::Minute);
        stats.inbound.realtime.all = MessageCount::new(90, 9000);
        stats.inbound.realtime.messages = MessageCount::new(60, 6000);
        let stats = stats.with_totals();
        assert_eq!(stats.inbound.realtime.all, MessageCount::new(90, 9000));
        assert_eq!(stats.inbound.all.all, MessageCount::new(90, 9000));
        assert_eq!(stats.inbound.all.messages, MessageCount::new(60, 6000));
    }

    #[test]
    fn reported_traffic_total_fills_only_its_empty_parts() {
        let mut traffic = MessageTraffic::default();
        traffic.all.messages = MessageCount::new(5, 50);
        traffic.rest.presence = MessageCount::new(2, 20);
        traffic.fill_totals();
        assert_eq!(traffic.all.all, MessageCount::new(5, 50));
        assert_eq!(traffic.rest.all, MessageCount::new(2, 20));
    }

    #[test]
    fn decodes_partial_json() {
        let json = r#"{
            "intervalId": "2024-03-07:14:05",
            "inbound": {"realtime": {"messages": {"count": 60, "data": 6000}}}
        }"#;
        let Ok(stats) = serde_json::from_str::<Stats>(json) else {
            panic!("decode failed");
        };
        assert_eq!(stats.unit, Granularity::Minute);
        assert_eq!(stats.inbound.realtime.messages.count, 60);
        assert_eq!(stats.with_totals().inbound.all.all.count, 60);
    }
}
