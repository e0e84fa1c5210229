// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

pub const DEFAULT_SIGNER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BANK_TIMEOUT_SECS: u64 = 15;

/// Store details stamped on every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Tax registration number, printed as 10 zero-padded digits.
    pub registration_id: u32,
    pub name: String,
    pub address: String,
}

/// Where the signing authority and the receipt bank live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CollaboratorMode {
    /// In-process signer and bank, for demos and tests.
    Standalone,
    /// Remote services over HTTP.
    Online {
        signer_url: String,
        bank_url: String,
        /// Forwarded to the bank so it can report when a receipt is collected.
        #[serde(default)]
        webhook_url: Option<String>,
    },
}

/// Upper bounds on the two remote calls of an issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub signer: Duration,
    pub bank: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            signer: Duration::from_secs(DEFAULT_SIGNER_TIMEOUT_SECS),
            bank: Duration::from_secs(DEFAULT_BANK_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerConfig {
    pub store: StoreInfo,
    #[serde(default)]
    pub catalog: Catalog,
    pub collaborators: CollaboratorMode,
    #[serde(default = "default_signer_timeout_secs")]
    pub signer_timeout_secs: u64,
    #[serde(default = "default_bank_timeout_secs")]
    pub bank_timeout_secs: u64,
}

impl IssuerConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            signer: Duration::from_secs(self.signer_timeout_secs),
            bank: Duration::from_secs(self.bank_timeout_secs),
        }
    }
}

fn default_signer_timeout_secs() -> u64 {
    DEFAULT_SIGNER_TIMEOUT_SECS
}

fn default_bank_timeout_secs() -> u64 {
    DEFAULT_BANK_TIMEOUT_SECS
}
