// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use receipt_sealing::OneTimeKey;

/// A sealed receipt ready to be deposited in the receipt bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// The receiver's one-time key. The bank indexes the payload by its
    /// compressed bytes.
    pub index_key: OneTimeKey,
    /// The sealed signed receipt.
    pub payload: Vec<u8>,
    /// Identifier for operational tracing. Never required by the bank.
    pub tracking_id: Option<String>,
}

/// Deposits sealed receipts in the anonymous receipt bank.
///
/// # Example
///
/// For example code see [crate::context::memory::InMemoryReceiptBank]
#[async_trait]
pub trait ReceiptBank {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Stores `submission` until the holder of its one-time key collects it.
    ///
    /// Must fail if the tracking id is already in use.
    async fn submit(&self, submission: Submission) -> Result<(), Self::AdapterError>;
}
