//! Quote numbering.
//!
//! Numbers are assigned from the authoritative remote maximum at creation
//! time, with a user-configurable offset so a tradesperson migrating from
//! paper can continue an existing sequence. Two devices racing offline can
//! both pick the same highest number; the duplicate (or gap after reconcile)
//! is accepted rather than detected.

/// Next number in the account's sequence: one past the larger of the highest
/// number already issued and the configured offset.
pub fn next_quote_number(highest_existing: u32, offset: u32) -> u32 {
    highest_existing.max(offset).saturating_add(1)
}
