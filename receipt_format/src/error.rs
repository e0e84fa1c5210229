// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Receipt fields, as named in codec errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Magic,
    Version,
    Reserved,
    Timestamp,
    ReportNumber,
    TransactionId,
    RegistrationId,
    StoreName,
    StoreAddress,
    TotalAmount,
    PaymentMethod,
    Serial,
    ItemCount,
    CategoryId,
    Quantity,
    UnitPrice,
    TotalPrice,
    TaxRate,
    TaxableAmount,
    TaxAmount,
    TotalTax,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("{field} does not match its expected pattern: {value:?}")]
    InvalidPattern { field: Field, value: String },
    #[error("transaction id {transaction_id:?} is not dated {expected}, the receipt's UTC date")]
    TransactionDateMismatch {
        transaction_id: String,
        expected: String,
    },
    #[error("{field} is too long to encode ({len} bytes)")]
    StringTooLong { field: Field, len: usize },
    #[error("{field} amount {amount} cannot be stored as 32-bit minor units")]
    AmountOutOfRange { field: Field, amount: f64 },
    #[error("receipt has {count} items, at most {max} can be encoded")]
    TooManyItems { count: usize, max: usize },
    #[error("timestamp {0} is before the Unix epoch")]
    TimestampBeforeEpoch(DateTime<Utc>),
}

/// Reasons a byte sequence is rejected by [`crate::codec::decode`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptReceipt {
    #[error("bad magic number 0x{found:04x}")]
    BadMagic { found: u16 },
    #[error("unsupported receipt version {0}")]
    UnsupportedVersion(u8),
    #[error("reserved byte must be zero, found 0x{0:02x}")]
    ReservedByteSet(u8),
    #[error("receipt truncated while reading {field}")]
    Truncated { field: Field },
    #[error("{declared} items need {expected} trailing bytes, found {actual}")]
    ItemCountMismatch {
        declared: u16,
        expected: usize,
        actual: usize,
    },
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: Field },
    #[error("item {index} has an unsupported tax rate: {value}")]
    UnknownTaxRate { index: usize, value: u8 },
    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(u64),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unsupported tax rate {0}%, expected 10 or 20")]
pub struct UnknownTaxRate(pub u8);
