//! Fixed-point monetary arithmetic.
//!
//! Amounts are stored in the smallest currency unit (e.g. cents), percentage
//! rates in basis points, and quantities in thousandths. All intermediate
//! products go through `i128` so a line total cannot silently wrap.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Scale of [`Quantity`]: thousandths of a unit.
const QUANTITY_SCALE: i128 = 1_000;

/// Scale of [`Percent`]: basis points (hundredths of a percent).
const PERCENT_SCALE: i128 = 10_000;

/// Monetary amount in the smallest currency unit (e.g., cents).
///
/// The currency itself lives on the owning profile; amounts are plain scalars.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor_units(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::invariant("money amount overflow"))
    }

    pub fn checked_sub(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::invariant("money amount overflow"))
    }

    /// Multiply by a quantity, rounding the result to the nearest minor unit.
    ///
    /// Ties round away from zero.
    pub fn times(self, quantity: Quantity) -> DomainResult<Money> {
        let product = (self.0 as i128)
            .checked_mul(quantity.0 as i128)
            .ok_or_else(|| DomainError::invariant("money amount overflow"))?;
        to_money(div_round_half_up(product, QUANTITY_SCALE))
    }

    /// Take a percentage of this amount, rounding to the nearest minor unit.
    ///
    /// Ties round away from zero.
    pub fn percent_of(self, rate: Percent) -> DomainResult<Money> {
        let product = (self.0 as i128)
            .checked_mul(rate.0 as i128)
            .ok_or_else(|| DomainError::invariant("money amount overflow"))?;
        to_money(div_round_half_up(product, PERCENT_SCALE))
    }
}

impl ValueObject for Money {}

/// Quantity in thousandths of a unit (`1500` is 1.5 units).
///
/// Thousandths cover the half-unit steps used for labor hours while keeping
/// the arithmetic exact.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);
    pub const ONE: Quantity = Quantity(1_000);

    pub const fn from_thousandths(thousandths: i64) -> Self {
        Self(thousandths)
    }

    pub const fn from_whole(units: i64) -> Self {
        Self(units * 1_000)
    }

    pub const fn thousandths(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl ValueObject for Quantity {}

/// Percentage rate in basis points (`1050` is 10.5%).
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Percent(u32);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    /// 100%, the upper bound for discount rates.
    pub const ONE_HUNDRED: Percent = Percent(10_000);

    pub const fn from_basis_points(basis_points: u32) -> Self {
        Self(basis_points)
    }

    pub const fn from_whole(percent: u32) -> Self {
        Self(percent * 100)
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }
}

impl ValueObject for Percent {}

/// Divide rounding half away from zero. `denom` must be a positive scale constant.
fn div_round_half_up(numer: i128, denom: i128) -> i128 {
    debug_assert!(denom > 0);
    if numer >= 0 {
        (numer + denom / 2) / denom
    } else {
        -((-numer + denom / 2) / denom)
    }
}

fn to_money(minor: i128) -> DomainResult<Money> {
    i64::try_from(minor)
        .map(Money)
        .map_err(|_| DomainError::invariant("money amount overflow"))
}
