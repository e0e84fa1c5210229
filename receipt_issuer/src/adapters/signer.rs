// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use receipt_format::ReceiptHash;

/// Signs receipt hashes on behalf of the signing authority.
///
/// # Example
///
/// For example code see [crate::context::memory::LocalSigner]
#[async_trait]
pub trait ReceiptSigner {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from the standard library.
    /// Errors of this type are returned to the user when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Signs the SHA-256 hash of an encoded receipt.
    ///
    /// A well-behaved signer returns the 64-byte `r || s` form. The register
    /// does not trust that and rejects any other length before assembling the
    /// signed receipt.
    async fn sign(&self, hash: &ReceiptHash) -> Result<Vec<u8>, Self::AdapterError>;

    /// Returns the authority's verifying key as an uncompressed SEC1 point.
    async fn public_key(&self) -> Result<Vec<u8>, Self::AdapterError>;
}
