// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::hash::{Hash, Hasher};

use p256::PublicKey;

use crate::{
    point::{self, COMPRESSED_LEN},
    PointError,
};

/// A receiver's one-time public key.
///
/// Only the compressed public half ever reaches the issuer and the bank. It is
/// both the ECDH input for sealing and the opaque index of the sealed receipt.
/// Construction validates that the bytes encode a point on the curve.
#[derive(Debug, Clone)]
pub struct OneTimeKey {
    public_key: PublicKey,
    compressed: [u8; COMPRESSED_LEN],
}

impl OneTimeKey {
    pub fn from_compressed(bytes: &[u8]) -> Result<Self, PointError> {
        let public_key = point::decompress(bytes)?;
        Ok(Self::from_public_key(public_key))
    }

    pub fn from_public_key(public_key: PublicKey) -> Self {
        OneTimeKey {
            compressed: point::compress(&public_key),
            public_key,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn as_bytes(&self) -> &[u8; COMPRESSED_LEN] {
        &self.compressed
    }
}

impl TryFrom<&[u8]> for OneTimeKey {
    type Error = PointError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_compressed(bytes)
    }
}

impl PartialEq for OneTimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.compressed == other.compressed
    }
}

impl Eq for OneTimeKey {}

impl Hash for OneTimeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.compressed.hash(state);
    }
}
