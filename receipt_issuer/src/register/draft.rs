// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use receipt_format::{LineItem, TaxRate};

use crate::{Error, Result};

/// The receipt being rung up, before it is stamped and frozen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptDraft {
    items: Vec<LineItem>,
    payment_method: Option<String>,
}

impl ReceiptDraft {
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(LineItem::total_price).sum()
    }

    /// Adds a line, or bumps the quantity of the line with the same category
    /// and unit price. A new price for a known category starts a new line.
    pub(crate) fn add_item(
        &mut self,
        category_id: u16,
        quantity: u16,
        unit_price: f64,
        tax_rate: TaxRate,
    ) -> Result<&LineItem> {
        if let Some(index) = self
            .items
            .iter()
            .position(|item| item.merges_with(category_id, unit_price))
        {
            self.items[index]
                .add_quantity(quantity)
                .ok_or(Error::QuantityOverflow)?;
            return Ok(&self.items[index]);
        }

        let index = self.items.len();
        self.items
            .push(LineItem::new(category_id, quantity, unit_price, tax_rate));
        Ok(&self.items[index])
    }

    pub(crate) fn set_payment_method(&mut self, method: String) {
        self.payment_method = Some(method);
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::EmptyReceipt);
        }
        if !matches!(self.payment_method.as_deref(), Some(method) if !method.trim().is_empty()) {
            return Err(Error::MissingPaymentMethod);
        }
        let total = self.total();
        if total.is_nan() || total <= 0.0 {
            return Err(Error::NonPositiveTotal(total));
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Vec<LineItem>, String) {
        (self.items, self.payment_method.unwrap_or_default())
    }
}
