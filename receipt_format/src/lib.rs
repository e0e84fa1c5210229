// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Receipt format
//!
//! Data model of a purchase receipt and its canonical binary form.
//!
//! A finalized [`Receipt`] is turned into bytes with [`codec::encode`]. Those
//! bytes are what gets hashed ([`receipt_hash`]) and signed by the signing
//! authority, and [`signed::assemble`] appends the 64-byte signature to them.
//! The consumer side reverses the process with [`signed::split`] and
//! [`codec::decode`].
//!
//! Amounts are carried as `f64` in major currency units and stored on the wire
//! as whole minor units (value × 100, truncated). See [`money`].

pub mod codec;
mod error;
pub mod fields;
mod line_item;
pub mod money;
mod receipt;
pub mod signed;
mod tax;

pub use error::{CorruptReceipt, EncodeError, Field, UnknownTaxRate};
pub use line_item::LineItem;
pub use receipt::{Receipt, ReceiptMetadata};
use sha2::{Digest, Sha256};
pub use tax::{TaxBreakdown, TaxDetail, TaxRate};

/// Length of a receipt hash, in bytes.
pub const RECEIPT_HASH_LEN: usize = 32;

/// SHA-256 digest of an encoded receipt. This is what the signing authority signs.
pub type ReceiptHash = [u8; RECEIPT_HASH_LEN];

/// Hashes the canonical binary form of a receipt.
pub fn receipt_hash(binary: &[u8]) -> ReceiptHash {
    Sha256::digest(binary).into()
}
