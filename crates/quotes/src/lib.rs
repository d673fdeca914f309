//! Quotes domain module (event-sourced).
//!
//! This crate contains the quoting business rules, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage): the quote
//! aggregate with its status lifecycle, fixed-point totals, and sequential
//! numbering.

pub mod numbering;
pub mod quote;
pub mod status;
pub mod totals;

pub use numbering::next_quote_number;
pub use quote::{
    AddLine, AdvanceStatus, CreateQuote, DiscountChanged, LineAdded, LineRemoved, Quote,
    QuoteCommand, QuoteCreated, QuoteEvent, QuoteId, QuoteRejected, RejectQuote, RemoveLine,
    SetDiscount, SetTax, StatusAdvanced, TaxChanged,
};
pub use status::QuoteStatus;
pub use totals::{compute_totals, QuoteLine, Totals};
