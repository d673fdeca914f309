//! Deterministic replay and execution for aggregates.
//!
//! State is a fold over events. These helpers keep the decide/apply split
//! visible at call sites and make no storage assumptions.

use presupro_core::Aggregate;

/// Applies events to an aggregate, in order.
pub fn replay<A: Aggregate>(aggregate: &mut A, events: &[A::Event]) {
    for event in events {
        aggregate.apply(event);
    }
}

/// Executes one command: decide, then fold the emitted events back into state.
///
/// Returns the events unchanged so callers can persist or forward them. A
/// rejected command leaves the aggregate untouched.
pub fn execute<A: Aggregate>(
    aggregate: &mut A,
    command: &A::Command,
) -> Result<Vec<A::Event>, A::Error> {
    let events = aggregate.handle(command)?;
    replay(aggregate, &events);
    Ok(events)
}
