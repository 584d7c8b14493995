//! Client event fan-out
//!
//! The client publishes lifecycle and wire-traffic notifications on a
//! single broadcast channel. Delivery is best-effort: a slow or dropped
//! subscriber lags or misses events but can never block or fail the
//! correlation engine.

/// Notification published by the client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A connection to the controller was established.
    Connected,
    /// The connection was closed or lost. Fired exactly once per
    /// connected-to-disconnected transition.
    Disconnected,
    /// A complete line arrived from the controller, correlated or not.
    LineReceived(String),
    /// A command was written to the wire, with its exact encoded text
    /// (terminator included).
    CommandSent { command: String, text: String },
}

/// Capacity of the broadcast channel behind [`ClientEvent`] delivery.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 256;
