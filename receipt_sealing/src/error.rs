// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointError {
    #[error("expected a {expected}-byte point, got {actual} bytes")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid point encoding tag 0x{0:02x}")]
    InvalidTag(u8),
    #[error("point is not on the P-256 curve")]
    NotOnCurve,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SealError {
    #[error("invalid key: {0}")]
    InvalidKey(#[from] PointError),
    #[error("random source failure: {source_error_message}")]
    RandomSource { source_error_message: String },
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("cipher initialisation failed")]
    CipherInit,
    #[error("encryption failed")]
    Encrypt,
    #[error("sealed payload is too short ({len} bytes)")]
    Truncated { len: usize },
    #[error("decryption failed, wrong key or tampered payload")]
    Decrypt,
}
