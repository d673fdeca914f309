//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Two value objects
/// with the same attribute values are equal; identity plays no part.
///
/// - `Money::from_minor_units(100)` is a value object.
/// - `Client { id: ClientId(...), .. }` is not (it has identity).
///
/// To "modify" a value object, construct a new one. The required bounds keep
/// value objects cheap to copy, comparable, and debuggable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
