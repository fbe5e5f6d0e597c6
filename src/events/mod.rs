//! Typed event dispatch.
//!
//! This module contains the generic [`EventEmitter`], the [`Applier`] seam
//! that binds it to a concrete listener interface, registration handles,
//! and the connection/channel state specializations used by the realtime
//! layer.

pub mod emitter;
pub mod listener_id;
pub mod state;

pub use emitter::{Applier, Callback, CallbackApplier, CallbackEmitter, EventEmitter};
pub use listener_id::ListenerId;
pub use state::{
    ChannelState, ChannelStateApplier, ChannelStateChange, ChannelStateEmitter,
    ChannelStateListener, ConnectionState, ConnectionStateApplier, ConnectionStateChange,
    ConnectionStateEmitter, ConnectionStateListener, ErrorInfo,
};
