// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Canonical binary encoding of a [`Receipt`], format version 1.
//!
//! All integers are big-endian. Strings are a `u32` byte length followed by
//! UTF-8. Amounts are `u32` minor units (see [`crate::money`]).
//!
//! | bytes | field |
//! |---|---|
//! | 2 | magic `0x5452` (`"TR"`) |
//! | 1 | format version `0x01` |
//! | 1 | reserved, `0x00` |
//! | 8 | timestamp, Unix seconds |
//! | 4 | report number |
//! | 4 | transaction sequence |
//! | 4 | registration id |
//! | 4+n | store name |
//! | 4+n | store address |
//! | 4 | total amount |
//! | 4+n | payment method |
//! | 4 | serial number |
//! | 2 | item count |
//! | 13 × count | category `u16`, quantity `u16`, unit price, total price, tax rate `u8` |
//! | 20 | 10% base, 10% tax, 20% base, 20% tax, total tax |
//!
//! Encoding is deterministic: the same receipt always yields the same bytes,
//! which is what makes the hash of the encoding signable.

use chrono::DateTime;

use crate::{
    fields, money, CorruptReceipt, EncodeError, Field, LineItem, Receipt, ReceiptMetadata,
    TaxBreakdown, TaxDetail, TaxRate,
};

pub const MAGIC: u16 = 0x5452;
pub const FORMAT_VERSION: u8 = 0x01;
pub const ITEM_LEN: usize = 13;
pub const TAX_BREAKDOWN_LEN: usize = 20;
pub const MAX_ITEMS: usize = u16::MAX as usize;

/// Fixed-size part of an encoding with no items and empty strings.
const FIXED_LEN: usize = 4 + 8 + 4 * 3 + 4 + 4 + 4 + 4 + 4 + 2 + TAX_BREAKDOWN_LEN;

pub fn encode(receipt: &Receipt) -> Result<Vec<u8>, EncodeError> {
    let report_number = fields::parse_report_number(receipt.report_number())?;
    let transaction_sequence =
        fields::parse_transaction_id(receipt.transaction_id(), receipt.timestamp())?;
    let registration_id = fields::parse_registration_id(receipt.registration_id())?;
    let serial = fields::parse_serial(receipt.serial())?;
    let timestamp = u64::try_from(receipt.timestamp().timestamp())
        .map_err(|_| EncodeError::TimestampBeforeEpoch(*receipt.timestamp()))?;
    let item_count = u16::try_from(receipt.items().len()).map_err(|_| EncodeError::TooManyItems {
        count: receipt.items().len(),
        max: MAX_ITEMS,
    })?;

    let mut writer = Writer::with_capacity(
        FIXED_LEN
            + receipt.store_name().len()
            + receipt.store_address().len()
            + receipt.payment_method().len()
            + receipt.items().len() * ITEM_LEN,
    );

    writer.u16(MAGIC);
    writer.u8(FORMAT_VERSION);
    writer.u8(0);
    writer.u64(timestamp);
    writer.u32(report_number);
    writer.u32(transaction_sequence);
    writer.u32(registration_id);
    writer.string(Field::StoreName, receipt.store_name())?;
    writer.string(Field::StoreAddress, receipt.store_address())?;
    writer.amount(Field::TotalAmount, receipt.total_amount())?;
    writer.string(Field::PaymentMethod, receipt.payment_method())?;
    writer.u32(serial);
    writer.u16(item_count);

    for item in receipt.items() {
        writer.u16(item.category_id());
        writer.u16(item.quantity());
        writer.amount(Field::UnitPrice, item.unit_price())?;
        writer.amount(Field::TotalPrice, item.total_price())?;
        writer.u8(item.tax_rate().percent());
    }

    let tax = receipt.tax_breakdown();
    for detail in [tax.detail(TaxRate::Reduced), tax.detail(TaxRate::Standard)] {
        writer.amount(Field::TaxableAmount, detail.taxable_amount)?;
        writer.amount(Field::TaxAmount, detail.tax_amount)?;
    }
    writer.amount(Field::TotalTax, tax.total_tax)?;

    Ok(writer.into_inner())
}

pub fn decode(bytes: &[u8]) -> Result<Receipt, CorruptReceipt> {
    let mut reader = Reader::new(bytes);

    let magic = reader.u16(Field::Magic)?;
    if magic != MAGIC {
        return Err(CorruptReceipt::BadMagic { found: magic });
    }
    let version = reader.u8(Field::Version)?;
    if version != FORMAT_VERSION {
        return Err(CorruptReceipt::UnsupportedVersion(version));
    }
    let reserved = reader.u8(Field::Reserved)?;
    if reserved != 0 {
        return Err(CorruptReceipt::ReservedByteSet(reserved));
    }

    let seconds = reader.u64(Field::Timestamp)?;
    let timestamp = i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or(CorruptReceipt::TimestampOutOfRange(seconds))?;
    let report_number = reader.u32(Field::ReportNumber)?;
    let transaction_sequence = reader.u32(Field::TransactionId)?;
    let registration_id = reader.u32(Field::RegistrationId)?;
    let store_name = reader.string(Field::StoreName)?;
    let store_address = reader.string(Field::StoreAddress)?;
    let total_amount = reader.amount(Field::TotalAmount)?;
    let payment_method = reader.string(Field::PaymentMethod)?;
    let serial = reader.u32(Field::Serial)?;

    let declared = reader.u16(Field::ItemCount)?;
    let expected = usize::from(declared) * ITEM_LEN + TAX_BREAKDOWN_LEN;
    if reader.remaining() != expected {
        return Err(CorruptReceipt::ItemCountMismatch {
            declared,
            expected,
            actual: reader.remaining(),
        });
    }

    let mut items = Vec::with_capacity(usize::from(declared));
    for index in 0..usize::from(declared) {
        let category_id = reader.u16(Field::CategoryId)?;
        let quantity = reader.u16(Field::Quantity)?;
        let unit_price = reader.amount(Field::UnitPrice)?;
        let total_price = reader.amount(Field::TotalPrice)?;
        let value = reader.u8(Field::TaxRate)?;
        let tax_rate = TaxRate::try_from(value)
            .map_err(|_| CorruptReceipt::UnknownTaxRate { index, value })?;
        items.push(LineItem::from_encoded(
            category_id,
            quantity,
            unit_price,
            total_price,
            tax_rate,
        ));
    }

    let reduced = TaxDetail {
        taxable_amount: reader.amount(Field::TaxableAmount)?,
        tax_amount: reader.amount(Field::TaxAmount)?,
    };
    let standard = TaxDetail {
        taxable_amount: reader.amount(Field::TaxableAmount)?,
        tax_amount: reader.amount(Field::TaxAmount)?,
    };
    let tax_breakdown = TaxBreakdown {
        reduced,
        standard,
        total_tax: reader.amount(Field::TotalTax)?,
    };

    let metadata = ReceiptMetadata {
        report_number: fields::format_report_number(report_number),
        transaction_id: fields::format_transaction_id(&timestamp, transaction_sequence),
        timestamp,
        registration_id: fields::format_registration_id(registration_id),
        store_name,
        store_address,
        serial: fields::format_serial(serial),
    };
    Ok(Receipt::from_parts(
        metadata,
        items,
        tax_breakdown,
        total_amount,
        payment_method,
    ))
}

struct Writer(Vec<u8>);

impl Writer {
    fn with_capacity(capacity: usize) -> Self {
        Writer(Vec::with_capacity(capacity))
    }

    fn u8(&mut self, value: u8) {
        self.0.push(value);
    }

    fn u16(&mut self, value: u16) {
        self.0.extend_from_slice(&value.to_be_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.0.extend_from_slice(&value.to_be_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.0.extend_from_slice(&value.to_be_bytes());
    }

    fn string(&mut self, field: Field, value: &str) -> Result<(), EncodeError> {
        let len = u32::try_from(value.len()).map_err(|_| EncodeError::StringTooLong {
            field,
            len: value.len(),
        })?;
        self.u32(len);
        self.0.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn amount(&mut self, field: Field, amount: f64) -> Result<(), EncodeError> {
        let minor = money::to_minor_units(amount)
            .ok_or(EncodeError::AmountOutOfRange { field, amount })?;
        self.u32(minor);
        Ok(())
    }

    fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes }
    }

    fn remaining(&self) -> usize {
        self.bytes.len()
    }

    fn array<const N: usize>(&mut self, field: Field) -> Result<[u8; N], CorruptReceipt> {
        let (head, rest) = self
            .bytes
            .split_first_chunk::<N>()
            .ok_or(CorruptReceipt::Truncated { field })?;
        self.bytes = rest;
        Ok(*head)
    }

    fn take(&mut self, len: usize, field: Field) -> Result<&'a [u8], CorruptReceipt> {
        let (head, rest) = self
            .bytes
            .split_at_checked(len)
            .ok_or(CorruptReceipt::Truncated { field })?;
        self.bytes = rest;
        Ok(head)
    }

    fn u8(&mut self, field: Field) -> Result<u8, CorruptReceipt> {
        Ok(u8::from_be_bytes(self.array(field)?))
    }

    fn u16(&mut self, field: Field) -> Result<u16, CorruptReceipt> {
        Ok(u16::from_be_bytes(self.array(field)?))
    }

    fn u32(&mut self, field: Field) -> Result<u32, CorruptReceipt> {
        Ok(u32::from_be_bytes(self.array(field)?))
    }

    fn u64(&mut self, field: Field) -> Result<u64, CorruptReceipt> {
        Ok(u64::from_be_bytes(self.array(field)?))
    }

    fn amount(&mut self, field: Field) -> Result<f64, CorruptReceipt> {
        Ok(money::from_minor_units(self.u32(field)?))
    }

    fn string(&mut self, field: Field) -> Result<String, CorruptReceipt> {
        let len = usize::try_from(self.u32(field)?)
            .map_err(|_| CorruptReceipt::Truncated { field })?;
        let raw = self.take(len, field)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| CorruptReceipt::InvalidUtf8 { field })
    }
}
