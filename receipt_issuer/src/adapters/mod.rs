// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Capabilities the [`Register`](crate::register::Register) depends on.
//!
//! The register never talks to the signing authority or the receipt bank
//! directly. It goes through these traits, so the same issuance pipeline runs
//! against in-process implementations (see [`crate::context::memory`]) and
//! HTTP clients (see [`crate::context::http`]).

mod bank;
mod signer;

pub use bank::{ReceiptBank, Submission};
pub use signer::ReceiptSigner;
