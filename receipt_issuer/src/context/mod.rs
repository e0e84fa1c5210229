// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Implementations of the collaborator adapters.
//!
//! `memory` keeps the signing key and the sealed receipts in-process and is
//! used for standalone registers and tests. `http` talks to a remote signing
//! authority and receipt bank.
pub mod http;
#[cfg(feature = "in_memory")]
pub mod memory;
