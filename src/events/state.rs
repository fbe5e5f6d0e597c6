//! Connection and channel state notifications.
//!
//! Concrete specializations of [`EventEmitter`] used by the realtime layer:
//! the state enum is the event kind, a `*StateChange` record is the payload
//! and a listener trait receives it. Closures implement the listener traits
//! directly.

use std::convert::Infallible;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Applier, EventEmitter};

/// Error details attached to a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// Human-readable description.
    pub message: String,
    /// Service-specific error code.
    pub code: u32,
    /// HTTP-like status code.
    pub status_code: u16,
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {}, status {})", self.message, self.code, self.status_code)
    }
}

/// Lifecycle states of a realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Created, no connection attempt made yet.
    Initialized,
    /// Connection attempt in progress.
    Connecting,
    /// Connection established.
    Connected,
    /// Temporarily disconnected; will retry.
    Disconnected,
    /// Disconnected for an extended period; retries are spaced out.
    Suspended,
    /// Explicit close requested.
    Closing,
    /// Closed by request.
    Closed,
    /// Unrecoverable failure.
    Failed,
}

/// Lifecycle states of a realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    /// Created, not yet attached.
    Initialized,
    /// Attach requested.
    Attaching,
    /// Attached and receiving messages.
    Attached,
    /// Detach requested.
    Detaching,
    /// Detached.
    Detached,
    /// Unrecoverable failure.
    Failed,
}

/// Payload delivered to [`ConnectionStateListener`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStateChange {
    /// State before the transition.
    pub previous: ConnectionState,
    /// State after the transition; also the emitted event kind.
    pub current: ConnectionState,
    /// Delay before the next automatic retry, if one is scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_in: Option<Duration>,
    /// Reason for the transition, if it was caused by an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ErrorInfo>,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
}

impl ConnectionStateChange {
    /// Creates a change from `previous` to `current` timestamped now.
    #[must_use]
    pub fn new(previous: ConnectionState, current: ConnectionState) -> Self {
        Self {
            previous,
            current,
            retry_in: None,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    /// Attaches the error that caused the transition.
    #[must_use]
    pub fn with_reason(mut self, reason: ErrorInfo) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Attaches the scheduled retry delay.
    #[must_use]
    pub const fn with_retry_in(mut self, retry_in: Duration) -> Self {
        self.retry_in = Some(retry_in);
        self
    }
}

/// Payload delivered to [`ChannelStateListener`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStateChange {
    /// Channel name.
    pub channel: String,
    /// State before the transition.
    pub previous: ChannelState,
    /// State after the transition; also the emitted event kind.
    pub current: ChannelState,
    /// Reason for the transition, if it was caused by an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ErrorInfo>,
    /// Whether message continuity was preserved across the transition.
    pub resumed: bool,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
}

impl ChannelStateChange {
    /// Creates a change for `channel` from `previous` to `current`.
    #[must_use]
    pub fn new(channel: impl Into<String>, previous: ChannelState, current: ChannelState) -> Self {
        Self {
            channel: channel.into(),
            previous,
            current,
            reason: None,
            resumed: false,
            timestamp: Utc::now(),
        }
    }

    /// Attaches the error that caused the transition.
    #[must_use]
    pub fn with_reason(mut self, reason: ErrorInfo) -> Self {
        self.reason = Some(reason);
        self
    }
}

/// Receives connection state changes.
pub trait ConnectionStateListener: Send + Sync {
    /// Called once per matching transition.
    fn on_connection_state_changed(&self, change: &ConnectionStateChange);
}

impl<F> ConnectionStateListener for F
where
    F: Fn(&ConnectionStateChange) + Send + Sync,
{
    fn on_connection_state_changed(&self, change: &ConnectionStateChange) {
        self(change);
    }
}

/// Receives channel state changes.
pub trait ChannelStateListener: Send + Sync {
    /// Called once per matching transition.
    fn on_channel_state_changed(&self, change: &ChannelStateChange);
}

impl<F> ChannelStateListener for F
where
    F: Fn(&ChannelStateChange) + Send + Sync,
{
    fn on_channel_state_changed(&self, change: &ChannelStateChange) {
        self(change);
    }
}

/// Delivers [`ConnectionStateChange`]s to [`ConnectionStateListener`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionStateApplier;

impl Applier<ConnectionState, dyn ConnectionStateListener, ConnectionStateChange>
    for ConnectionStateApplier
{
    type Error = Infallible;

    fn apply(
        &self,
        listener: &dyn ConnectionStateListener,
        _kind: &ConnectionState,
        change: &ConnectionStateChange,
    ) -> Result<(), Infallible> {
        listener.on_connection_state_changed(change);
        Ok(())
    }
}

/// Delivers [`ChannelStateChange`]s to [`ChannelStateListener`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelStateApplier;

impl Applier<ChannelState, dyn ChannelStateListener, ChannelStateChange> for ChannelStateApplier {
    type Error = Infallible;

    fn apply(
        &self,
        listener: &dyn ChannelStateListener,
        _kind: &ChannelState,
        change: &ChannelStateChange,
    ) -> Result<(), Infallible> {
        listener.on_channel_state_changed(change);
        Ok(())
    }
}

/// Emitter for connection state notifications.
pub type ConnectionStateEmitter = EventEmitter<
    ConnectionState,
    dyn ConnectionStateListener,
    ConnectionStateChange,
    ConnectionStateApplier,
>;

/// Emitter for channel state notifications.
pub type ChannelStateEmitter =
    EventEmitter<ChannelState, dyn ChannelStateListener, ChannelStateChange, ChannelStateApplier>;

impl ConnectionStateEmitter {
    /// Emits `change` under its `current` state.
    pub fn emit_change(&self, change: &ConnectionStateChange) {
        tracing::debug!(
            previous = ?change.previous,
            current = ?change.current,
            "connection state changed"
        );
        let Ok(()) = self.emit(&change.current, change);
    }
}

impl ChannelStateEmitter {
    /// Emits `change` under its `current` state.
    pub fn emit_change(&self, change: &ChannelStateChange) {
        tracing::debug!(
            channel = %change.channel,
            previous = ?change.previous,
            current = ?change.current,
            "channel state changed"
        );
        let Ok(()) = self.emit(&change.current, change);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;

    #[test]
    fn connection_listener_receives_transition() {
        let emitter = ConnectionStateEmitter::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        emitter.on_event(
            ConnectionState::Connected,
            Arc::new(move |change: &ConnectionStateChange| {
                sink.lock().push((change.previous, change.current));
            }),
        );

        emitter.emit_change(&ConnectionStateChange::new(
            ConnectionState::Initialized,
            ConnectionState::Connecting,
        ));
        emitter.emit_change(&ConnectionStateChange::new(
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ));

        assert_eq!(
            *seen.lock(),
            vec![(ConnectionState::Connecting, ConnectionState::Connected)]
        );
    }

    #[test]
    fn once_waits_for_failure_reason() {
        let emitter = ConnectionStateEmitter::default();
        let reason = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&reason);
        emitter.once(
            ConnectionState::Failed,
            Arc::new(move |change: &ConnectionStateChange| {
                *sink.lock() = change.reason.clone();
            }),
        );

        let info = ErrorInfo {
            message: "token expired".to_string(),
            code: 40142,
            status_code: 401,
        };
        emitter.emit_change(
            &ConnectionStateChange::new(ConnectionState::Connected, ConnectionState::Failed)
                .with_reason(info.clone()),
        );
        assert_eq!(*reason.lock(), Some(info));
        assert_eq!(emitter.event_listener_count(&ConnectionState::Failed), 0);
    }

    #[test]
    fn channel_global_listener_sees_every_state() {
        let emitter = ChannelStateEmitter::default();
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&states);
        emitter.on(Arc::new(move |change: &ChannelStateChange| {
            sink.lock().push(change.current);
        }));

        for (previous, current) in [
            (ChannelState::Initialized, ChannelState::Attaching),
            (ChannelState::Attaching, ChannelState::Attached),
            (ChannelState::Attached, ChannelState::Detaching),
        ] {
            emitter.emit_change(&ChannelStateChange::new("orders", previous, current));
        }

        assert_eq!(
            *states.lock(),
            vec![
                ChannelState::Attaching,
                ChannelState::Attached,
                ChannelState::Detaching
            ]
        );
    }

    #[test]
    fn state_change_serializes_camel_case() {
        let change = ConnectionStateChange::new(
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
        )
        .with_retry_in(Duration::from_secs(15));
        let Ok(json) = serde_json::to_value(&change) else {
            panic!("serialization failed");
        };
        assert_eq!(
            json.get("previous").and_then(|v| v.as_str()),
            Some("disconnected")
        );
        assert_eq!(
            json.get("current").and_then(|v| v.as_str()),
            Some("connecting")
        );
        assert!(json.get("retryIn").is_some());
        assert!(json.get("reason").is_none());
    }
}
