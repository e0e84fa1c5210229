// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Receipt sealing
//!
//! Encrypts a signed receipt to a receiver's one-time P-256 public key
//! without any prior relationship between sender and receiver.
//!
//! - [`point`] converts public keys to and from their 33-byte compressed and
//!   65-byte uncompressed SEC1 forms.
//! - [`OneTimeKey`] is a validated receiver key. Its compressed bytes are the
//!   index under which the receipt bank stores the sealed payload.
//! - [`seal`] / [`open`] implement the anonymous encryption scheme:
//!   ephemeral ECDH, HKDF-SHA256 and AES-256-GCM.
//! - [`SecretBuffer`] holds intermediate key material and wipes it on drop.

mod error;
mod one_time_key;
pub mod point;
mod seal;
mod secret;

pub use error::{PointError, SealError};
pub use one_time_key::OneTimeKey;
pub use p256::{PublicKey, SecretKey};
pub use seal::{open, seal, seal_with_rng, KDF_INFO, KEY_LEN, NONCE_LEN, SEAL_OVERHEAD, TAG_LEN};
pub use secret::SecretBuffer;
