//! Derived monetary fields for a quote.
//!
//! Totals are never stored independently: they are recomputed from the line
//! items and the adjustment percentages whenever either changes.
//!
//! ```text
//! subtotal        = Σ quantity × unit_price
//! discount_amount = subtotal × discount_percent / 100
//! taxable         = subtotal − discount_amount
//! tax_amount      = taxable × tax_percent / 100
//! total           = taxable + tax_amount
//! ```
//!
//! `total == subtotal − discount_amount + tax_amount` holds exactly because
//! `total` is constructed from the already-rounded intermediate values.

use serde::{Deserialize, Serialize};

use presupro_catalog::ItemCategory;
use presupro_core::{DomainResult, Money, Percent, Quantity, ValueObject};

/// A single quote line. `line_no` orders lines and survives removals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub line_no: u32,
    pub name: String,
    pub category: ItemCategory,
    pub quantity: Quantity,
    pub unit: String,
    /// Price per unit in the smallest currency unit (e.g., cents).
    pub unit_price: Money,
}

impl QuoteLine {
    /// `quantity × unit_price`, rounded to the nearest minor unit.
    pub fn total(&self) -> DomainResult<Money> {
        self.unit_price.times(self.quantity)
    }
}

/// The derived monetary fields of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub taxable: Money,
    pub tax_amount: Money,
    pub total: Money,
}

impl Totals {
    pub const ZERO: Totals = Totals {
        subtotal: Money::ZERO,
        discount_amount: Money::ZERO,
        taxable: Money::ZERO,
        tax_amount: Money::ZERO,
        total: Money::ZERO,
    };
}

impl ValueObject for Totals {}

/// Recompute all derived fields from scratch.
pub fn compute_totals(
    lines: &[QuoteLine],
    discount_percent: Percent,
    tax_percent: Percent,
) -> DomainResult<Totals> {
    let mut subtotal = Money::ZERO;
    for line in lines {
        subtotal = subtotal.checked_add(line.total()?)?;
    }

    let discount_amount = subtotal.percent_of(discount_percent)?;
    let taxable = subtotal.checked_sub(discount_amount)?;
    let tax_amount = taxable.percent_of(tax_percent)?;
    let total = taxable.checked_add(tax_amount)?;

    Ok(Totals {
        subtotal,
        discount_amount,
        taxable,
        tax_amount,
        total,
    })
}
