// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Conversions between major-unit amounts and the 32-bit minor units stored on
//! the wire.
//!
//! The conversion multiplies by 100 and truncates toward zero, so `10.999`
//! becomes `1099`. Binary floating point error is kept as is: `0.29 * 100` is
//! just below 29 and is stored as `28`. Receipts compare equal after a round
//! trip only at minor-unit granularity.

/// Minor units per major unit.
pub const MINOR_UNITS: f64 = 100.0;

/// Converts `amount` to truncated minor units.
///
/// Returns `None` for negative, non-finite or too large amounts.
pub fn to_minor_units(amount: f64) -> Option<u32> {
    let scaled = (amount * MINOR_UNITS).trunc();
    if !scaled.is_finite() || scaled < 0.0 || scaled > f64::from(u32::MAX) {
        return None;
    }
    Some(scaled as u32)
}

pub fn from_minor_units(minor: u32) -> f64 {
    f64::from(minor) / MINOR_UNITS
}

/// Whether two amounts fall on the same minor unit.
pub fn same_minor_units(a: f64, b: f64) -> bool {
    match (to_minor_units(a), to_minor_units(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
