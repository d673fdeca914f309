use chrono::{DateTime, Utc};

/// Behaviour shared by every domain event.
///
/// An event is a recorded fact: it never changes after emission, and aggregate
/// state is rebuilt by applying events in emission order.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable dotted name, `<crate>.<aggregate>.<action>`
    /// (e.g. `"quotes.quote.line_added"`).
    fn event_type(&self) -> &'static str;

    /// Schema version of this event type. Starts at 1; bump it when the
    /// serialized shape changes meaning.
    fn version(&self) -> u32 {
        1
    }

    /// Business time: when the change happened, not when it was stored.
    fn occurred_at(&self) -> DateTime<Utc>;
}
