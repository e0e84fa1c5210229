// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{LineItem, TaxBreakdown};

/// Identifiers and store details stamped on a receipt when it is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptMetadata {
    pub report_number: String,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub registration_id: String,
    pub store_name: String,
    pub store_address: String,
    pub serial: String,
}

/// A finalized purchase receipt.
///
/// The total amount and the tax breakdown are derived from the line items
/// when the receipt is built and cannot be set on their own. A `Receipt` has
/// no mutating methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    report_number: String,
    transaction_id: String,
    timestamp: DateTime<Utc>,
    registration_id: String,
    store_name: String,
    store_address: String,
    items: Vec<LineItem>,
    tax_breakdown: TaxBreakdown,
    total_amount: f64,
    payment_method: String,
    serial: String,
}

impl Receipt {
    pub fn finalize(
        metadata: ReceiptMetadata,
        items: Vec<LineItem>,
        payment_method: impl Into<String>,
    ) -> Self {
        let total_amount = items.iter().map(LineItem::total_price).sum();
        let tax_breakdown = TaxBreakdown::from_items(&items);
        Self::from_parts(metadata, items, tax_breakdown, total_amount, payment_method.into())
    }

    /// Used by the decoder, which reads the derived amounts from the wire.
    pub(crate) fn from_parts(
        metadata: ReceiptMetadata,
        items: Vec<LineItem>,
        tax_breakdown: TaxBreakdown,
        total_amount: f64,
        payment_method: String,
    ) -> Self {
        let ReceiptMetadata {
            report_number,
            transaction_id,
            timestamp,
            registration_id,
            store_name,
            store_address,
            serial,
        } = metadata;
        Receipt {
            report_number,
            transaction_id,
            timestamp,
            registration_id,
            store_name,
            store_address,
            items,
            tax_breakdown,
            total_amount,
            payment_method,
            serial,
        }
    }

    pub fn report_number(&self) -> &str {
        &self.report_number
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn registration_id(&self) -> &str {
        &self.registration_id
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn store_address(&self) -> &str {
        &self.store_address
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn tax_breakdown(&self) -> &TaxBreakdown {
        &self.tax_breakdown
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::TaxRate;

    fn metadata() -> ReceiptMetadata {
        ReceiptMetadata {
            report_number: "Z0001".into(),
            transaction_id: "TX202501150001".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap(),
            registration_id: "1234567890".into(),
            store_name: "Corner Shop".into(),
            store_address: "1 Main Street".into(),
            serial: "F0001".into(),
        }
    }

    #[test]
    fn finalize_derives_totals() {
        let receipt = Receipt::finalize(
            metadata(),
            vec![
                LineItem::new(1, 2, 10.50, TaxRate::Standard),
                LineItem::new(2, 1, 15.00, TaxRate::Reduced),
            ],
            "CARD",
        );

        assert_eq!(receipt.total_amount(), 36.0);
        assert_eq!(receipt.items().len(), 2);
        assert!((receipt.tax_breakdown().standard.tax_amount - 3.5).abs() < 1e-9);
        assert_eq!(receipt.payment_method(), "CARD");
        assert_eq!(receipt.serial(), "F0001");
    }

    #[test]
    fn receipt_serializes_for_display() {
        let receipt = Receipt::finalize(
            metadata(),
            vec![LineItem::new(1, 1, 2.0, TaxRate::Standard)],
            "CASH",
        );
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["transaction_id"], "TX202501150001");
        assert_eq!(json["items"][0]["tax_rate"], 20);
        assert_eq!(json["total_amount"], 2.0);
    }
}
