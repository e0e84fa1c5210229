// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::{money, TaxRate};

/// One line of a receipt.
///
/// The total price is always `quantity × unit_price` and is recomputed
/// whenever the quantity changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    category_id: u16,
    quantity: u16,
    unit_price: f64,
    total_price: f64,
    tax_rate: TaxRate,
}

impl LineItem {
    pub fn new(category_id: u16, quantity: u16, unit_price: f64, tax_rate: TaxRate) -> Self {
        LineItem {
            category_id,
            quantity,
            unit_price,
            total_price: unit_price * f64::from(quantity),
            tax_rate,
        }
    }

    /// Rebuilds a line exactly as it was encoded, keeping the stored total.
    pub(crate) fn from_encoded(
        category_id: u16,
        quantity: u16,
        unit_price: f64,
        total_price: f64,
        tax_rate: TaxRate,
    ) -> Self {
        LineItem {
            category_id,
            quantity,
            unit_price,
            total_price,
            tax_rate,
        }
    }

    pub fn category_id(&self) -> u16 {
        self.category_id
    }

    pub fn quantity(&self) -> u16 {
        self.quantity
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Whether a new entry for `category_id` at `unit_price` collapses into
    /// this line. Prices are compared in minor units.
    pub fn merges_with(&self, category_id: u16, unit_price: f64) -> bool {
        self.category_id == category_id && money::same_minor_units(self.unit_price, unit_price)
    }

    /// Adds `extra` to the quantity and recomputes the total.
    ///
    /// Returns the new quantity, or `None` (leaving the line untouched) if it
    /// would not fit the 16-bit quantity field.
    pub fn add_quantity(&mut self, extra: u16) -> Option<u16> {
        let quantity = self.quantity.checked_add(extra)?;
        self.quantity = quantity;
        self.total_price = self.unit_price * f64::from(quantity);
        Some(quantity)
    }
}
