// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! One-time retrieval store for sealed receipts.
//!
//! Entries are indexed by the receiver's one-time key and hold the sealed
//! payload, a receipt id unique across the store, and an optional webhook to
//! call on collection. An entry leaves the store exactly once: either it is
//! collected, or the sweeper drops it after `max_age`.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use lazy_static::lazy_static;
use log::{debug, error, info};
use prometheus::{register_int_counter, IntCounter};
use receipt_sealing::OneTimeKey;
use thiserror::Error;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

lazy_static! {
    static ref SWEPT_RECEIPTS: IntCounter = register_int_counter!(
        "receipts_swept_count",
        "Number of receipts dropped by the sweeper before anyone collected them."
    )
    .unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("receipt id {receipt_id} already exists")]
    DuplicateId { receipt_id: String },
    #[error("a receipt is already stored under this key")]
    KeyInUse,
    #[error("receipt store lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReceipt {
    pub payload: Vec<u8>,
    pub receipt_id: String,
    pub webhook_url: Option<String>,
    pub stored_at: Instant,
}

/// Entry counts reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub stored: usize,
    /// Entries past `max_age` that the sweeper has not dropped yet.
    pub expired: usize,
}

#[derive(Debug, Default)]
struct Entries {
    by_key: HashMap<OneTimeKey, StoredReceipt>,
    keys_by_id: HashMap<String, OneTimeKey>,
}

impl Entries {
    fn remove(&mut self, key: &OneTimeKey) -> Option<StoredReceipt> {
        let receipt = self.by_key.remove(key)?;
        self.keys_by_id.remove(&receipt.receipt_id);
        Some(receipt)
    }
}

#[derive(Debug)]
pub struct ReceiptStore {
    entries: RwLock<Entries>,
    max_age: Duration,
}

impl ReceiptStore {
    pub fn new(max_age: Duration) -> Self {
        ReceiptStore {
            entries: RwLock::new(Entries::default()),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Stores a sealed receipt under `key`.
    ///
    /// Fails if `receipt_id` is already in use or if another receipt is
    /// waiting under the same key.
    pub fn submit(
        &self,
        key: OneTimeKey,
        payload: Vec<u8>,
        receipt_id: String,
        webhook_url: Option<String>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write()?;
        if entries.keys_by_id.contains_key(&receipt_id) {
            return Err(StoreError::DuplicateId { receipt_id });
        }
        if entries.by_key.contains_key(&key) {
            return Err(StoreError::KeyInUse);
        }

        debug!("Stored receipt {receipt_id} ({} bytes)", payload.len());
        entries.keys_by_id.insert(receipt_id.clone(), key.clone());
        entries.by_key.insert(
            key,
            StoredReceipt {
                payload,
                receipt_id,
                webhook_url,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Removes and returns the receipt stored under `key`.
    ///
    /// At most one caller ever gets a given receipt back.
    pub fn collect(&self, key: &OneTimeKey) -> Result<Option<StoredReceipt>, StoreError> {
        let receipt = self.entries.write()?.remove(key);
        if let Some(receipt) = &receipt {
            debug!("Collected receipt {}", receipt.receipt_id);
        }
        Ok(receipt)
    }

    /// Drops every entry older than `max_age` and returns how many went.
    pub fn sweep(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write()?;
        let expired: Vec<OneTimeKey> = entries
            .by_key
            .iter()
            .filter(|(_, receipt)| now.duration_since(receipt.stored_at) > self.max_age)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.remove(key);
        }
        Ok(expired.len())
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read()?;
        Ok(StoreStats {
            stored: entries.by_key.len(),
            expired: entries
                .by_key
                .values()
                .filter(|receipt| now.duration_since(receipt.stored_at) > self.max_age)
                .count(),
        })
    }
}

/// Runs [`ReceiptStore::sweep`] every `interval` until the task is aborted.
pub fn spawn_sweeper(store: Arc<ReceiptStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.sweep() {
                Ok(0) => {}
                Ok(swept) => {
                    SWEPT_RECEIPTS.inc_by(swept as u64);
                    info!("Swept {swept} expired receipts");
                }
                Err(e) => {
                    error!("Receipt sweep failed: {e}");
                }
            }
        }
    })
}
