// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Builds a register's collaborators from an [`IssuerConfig`].

use async_trait::async_trait;
use receipt_format::ReceiptHash;
use thiserror::Error;

use crate::{
    adapters::{ReceiptBank, ReceiptSigner, Submission},
    config::{CollaboratorMode, IssuerConfig},
    context::{
        http::{HttpError, HttpReceiptBank, HttpSigner},
        memory::{InMemoryError, InMemoryReceiptBank, LocalSigner},
    },
    register::Register,
    sequence::CounterSequence,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    InMemory(#[from] InMemoryError),
    #[error(transparent)]
    Http(#[from] HttpError),
}

#[derive(Debug, Clone)]
pub enum SignerService {
    Local(LocalSigner),
    Http(HttpSigner),
}

#[derive(Debug, Clone)]
pub enum BankService {
    InMemory(InMemoryReceiptBank),
    Http(HttpReceiptBank),
}

#[async_trait]
impl ReceiptSigner for SignerService {
    type AdapterError = ServiceError;

    async fn sign(&self, hash: &ReceiptHash) -> Result<Vec<u8>, Self::AdapterError> {
        match self {
            SignerService::Local(signer) => Ok(signer.sign(hash).await?),
            SignerService::Http(signer) => Ok(signer.sign(hash).await?),
        }
    }

    async fn public_key(&self) -> Result<Vec<u8>, Self::AdapterError> {
        match self {
            SignerService::Local(signer) => Ok(signer.public_key().await?),
            SignerService::Http(signer) => Ok(signer.public_key().await?),
        }
    }
}

#[async_trait]
impl ReceiptBank for BankService {
    type AdapterError = ServiceError;

    async fn submit(&self, submission: Submission) -> Result<(), Self::AdapterError> {
        match self {
            BankService::InMemory(bank) => Ok(bank.submit(submission).await?),
            BankService::Http(bank) => Ok(bank.submit(submission).await?),
        }
    }
}

/// Standalone mode gets a fresh random signing key and an empty in-memory
/// bank. Online mode gets HTTP clients for the configured URLs.
pub fn create_services(mode: &CollaboratorMode) -> (SignerService, BankService) {
    match mode {
        CollaboratorMode::Standalone => (
            SignerService::Local(LocalSigner::random()),
            BankService::InMemory(InMemoryReceiptBank::default()),
        ),
        CollaboratorMode::Online {
            signer_url,
            bank_url,
            webhook_url,
        } => {
            let bank = HttpReceiptBank::new(bank_url.as_str());
            let bank = match webhook_url {
                Some(webhook_url) => bank.with_webhook(webhook_url.as_str()),
                None => bank,
            };
            (
                SignerService::Http(HttpSigner::new(signer_url.as_str())),
                BankService::Http(bank),
            )
        }
    }
}

pub fn create_register(config: &IssuerConfig) -> Register<SignerService, BankService> {
    let (signer, bank) = create_services(&config.collaborators);
    Register::new(
        signer,
        bank,
        CounterSequence::default(),
        config.store.clone(),
        config.catalog.clone(),
    )
    .with_timeouts(config.timeouts())
}
