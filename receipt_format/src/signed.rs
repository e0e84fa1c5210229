// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Framing of a signed receipt: the binary encoding followed by the
//! authority's signature.
//!
//! The signature is the fixed 64-byte `r || s` form (each half a 32-byte
//! big-endian integer), never DER. The receipt encoding has no explicit end
//! marker, so the signature is located by its fixed length.

use thiserror::Error;

pub const SIGNATURE_LEN: usize = 64;

pub type Signature = [u8; SIGNATURE_LEN];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("signature must be exactly {SIGNATURE_LEN} bytes, got {actual}")]
pub struct SignatureLengthError {
    pub actual: usize,
}

/// Appends `signature` to `binary`.
pub fn assemble(binary: &[u8], signature: &[u8]) -> Result<Vec<u8>, SignatureLengthError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(SignatureLengthError {
            actual: signature.len(),
        });
    }
    let mut signed = Vec::with_capacity(binary.len() + SIGNATURE_LEN);
    signed.extend_from_slice(binary);
    signed.extend_from_slice(signature);
    Ok(signed)
}

/// Splits a signed receipt into its binary encoding and signature.
pub fn split(signed: &[u8]) -> Result<(&[u8], &Signature), SignatureLengthError> {
    let binary_len = signed
        .len()
        .checked_sub(SIGNATURE_LEN)
        .ok_or(SignatureLengthError {
            actual: signed.len(),
        })?;
    let (binary, signature) = signed.split_at(binary_len);
    let signature = signature.try_into().map_err(|_| SignatureLengthError {
        actual: signature.len(),
    })?;
    Ok((binary, signature))
}
