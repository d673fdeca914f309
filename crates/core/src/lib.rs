//! `presupro-core` — shared domain primitives.
//!
//! Identifiers, fixed-point money, the aggregate traits and the error type the
//! domain crates build on. No IO anywhere in this crate.

pub mod aggregate;
pub mod currency;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use currency::{Currency, SymbolPosition, CURRENCIES};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, UserId};
pub use money::{Money, Percent, Quantity};
pub use value_object::ValueObject;
