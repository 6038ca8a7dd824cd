use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are immutable facts about a committed change. They are never used
/// to decide anything after the fact; the aggregate that emitted them already
/// holds the resulting state.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "outbound.order.shipped").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32 {
        1
    }

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
