// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process signer and receipt bank.
//!
//! These back the standalone collaborator mode and the tests. The bank here
//! keeps submissions forever; expiry lives in the `receipt_bank` service.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use p256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use receipt_format::ReceiptHash;
use receipt_sealing::{point, OneTimeKey, PublicKey};
use thiserror::Error;

use crate::adapters::{ReceiptBank, ReceiptSigner, Submission};

pub type SubmissionStorage = Arc<RwLock<HashMap<OneTimeKey, Submission>>>;

#[derive(Debug, Error)]
pub enum InMemoryError {
    #[error("something went wrong: {error}")]
    AdapterError { error: String },
}

/// Signing authority holding its P-256 key in memory.
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
}

impl LocalSigner {
    pub fn new(key: SigningKey) -> Self {
        LocalSigner { key }
    }

    pub fn random() -> Self {
        LocalSigner::new(SigningKey::random(&mut OsRng))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key.verifying_key()
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("verifying_key", self.key.verifying_key())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReceiptSigner for LocalSigner {
    type AdapterError = InMemoryError;

    async fn sign(&self, hash: &ReceiptHash) -> Result<Vec<u8>, Self::AdapterError> {
        let signature: Signature =
            self.key
                .sign_prehash(hash)
                .map_err(|err| InMemoryError::AdapterError {
                    error: err.to_string(),
                })?;
        Ok(signature.to_bytes().to_vec())
    }

    async fn public_key(&self) -> Result<Vec<u8>, Self::AdapterError> {
        let public_key = PublicKey::from(self.key.verifying_key());
        Ok(point::to_uncompressed(&public_key).to_vec())
    }
}

/// Receipt bank keeping sealed receipts in a shared map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReceiptBank {
    storage: SubmissionStorage,
}

impl InMemoryReceiptBank {
    pub fn new(storage: SubmissionStorage) -> Self {
        InMemoryReceiptBank { storage }
    }

    /// Removes and returns the submission stored under `key`.
    pub fn take(&self, key: &OneTimeKey) -> Result<Option<Submission>, InMemoryError> {
        let mut storage = self.storage.write().map_err(poisoned)?;
        Ok(storage.remove(key))
    }

    pub fn len(&self) -> Result<usize, InMemoryError> {
        Ok(self.storage.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, InMemoryError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ReceiptBank for InMemoryReceiptBank {
    type AdapterError = InMemoryError;

    async fn submit(&self, submission: Submission) -> Result<(), Self::AdapterError> {
        let mut storage = self.storage.write().map_err(poisoned)?;
        if storage.contains_key(&submission.index_key) {
            return Err(InMemoryError::AdapterError {
                error: "a receipt is already stored under this key".to_owned(),
            });
        }
        if let Some(tracking_id) = &submission.tracking_id {
            if storage
                .values()
                .any(|stored| stored.tracking_id.as_ref() == Some(tracking_id))
            {
                return Err(InMemoryError::AdapterError {
                    error: format!("duplicate receipt id {tracking_id}"),
                });
            }
        }
        storage.insert(submission.index_key.clone(), submission);
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> InMemoryError {
    InMemoryError::AdapterError {
        error: "storage lock poisoned".to_owned(),
    }
}
