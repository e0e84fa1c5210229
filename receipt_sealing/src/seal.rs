// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Anonymous encryption to a receiver's public key.
//!
//! The sender draws an ephemeral key pair, takes the x coordinate of
//! `ECDH(ephemeral secret, receiver public)` as the shared secret, derives a
//! 32-byte key with HKDF-SHA256 (no salt, info [`KDF_INFO`]) and encrypts with
//! AES-256-GCM under a random 96-bit nonce. The sealed payload is
//!
//! ```text
//! ephemeral public key (65, uncompressed) || nonce (12) || ciphertext || tag (16)
//! ```
//!
//! The receiver recomputes the same shared secret from its secret key and the
//! ephemeral public key. Nothing in the payload identifies the sender.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use p256::{ecdh, PublicKey, SecretKey};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use sha2::Sha256;

use crate::{
    point::{self, UNCOMPRESSED_LEN},
    SealError, SecretBuffer,
};

pub const KDF_INFO: &[u8] = b"ECIES-encryption";
pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Bytes a sealed payload adds on top of the plaintext.
pub const SEAL_OVERHEAD: usize = UNCOMPRESSED_LEN + NONCE_LEN + TAG_LEN;

/// Seals `plaintext` for `receiver` using the operating system's random source.
pub fn seal(receiver: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
    seal_with_rng(&mut OsRng, receiver, plaintext)
}

pub fn seal_with_rng<R: CryptoRng + RngCore>(
    rng: &mut R,
    receiver: &PublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>, SealError> {
    let ephemeral = random_secret_key(rng)?;
    let ephemeral_public = point::to_uncompressed(&ephemeral.public_key());
    let key = derive_key(&ephemeral, receiver)?;
    drop(ephemeral);

    let mut nonce = [0u8; NONCE_LEN];
    rng.try_fill_bytes(&mut nonce)
        .map_err(|err| SealError::RandomSource {
            source_error_message: err.to_string(),
        })?;

    let cipher = Aes256Gcm::new_from_slice(key.expose()).map_err(|_| SealError::CipherInit)?;
    drop(key);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| SealError::Encrypt)?;

    let mut sealed = Vec::with_capacity(UNCOMPRESSED_LEN + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&ephemeral_public);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Opens a payload produced by [`seal`] with the receiver's secret key.
pub fn open(receiver: &SecretKey, sealed: &[u8]) -> Result<Vec<u8>, SealError> {
    if sealed.len() < SEAL_OVERHEAD {
        return Err(SealError::Truncated { len: sealed.len() });
    }
    let (ephemeral_public, rest) = sealed.split_at(UNCOMPRESSED_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let ephemeral_public = point::from_uncompressed(ephemeral_public)?;
    let key = derive_key(receiver, &ephemeral_public)?;
    let cipher = Aes256Gcm::new_from_slice(key.expose()).map_err(|_| SealError::CipherInit)?;
    drop(key);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| SealError::Decrypt)
}

/// Draws scalars until one is a valid secret key.
fn random_secret_key<R: CryptoRng + RngCore>(rng: &mut R) -> Result<SecretKey, SealError> {
    let mut scalar = SecretBuffer::<32>::zeroed();
    loop {
        rng.try_fill_bytes(scalar.expose_mut())
            .map_err(|err| SealError::RandomSource {
                source_error_message: err.to_string(),
            })?;
        // Zero, or at or above the group order.
        if let Ok(key) = SecretKey::from_slice(scalar.expose()) {
            return Ok(key);
        }
    }
}

fn derive_key(secret: &SecretKey, public: &PublicKey) -> Result<SecretBuffer<KEY_LEN>, SealError> {
    let shared = ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    let mut key = SecretBuffer::<KEY_LEN>::zeroed();
    Hkdf::<Sha256>::new(None, shared.raw_secret_bytes())
        .expand(KDF_INFO, key.expose_mut())
        .map_err(|_| SealError::KeyDerivation)?;
    Ok(key)
}
