// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The issuing side of a point-of-sale terminal.
//!
//! A [`Register`] holds at most one receipt in progress and moves through
//!
//! ```text
//! NoReceipt --start--> Open --issue--> Issuing --ok--> Closed --start--> Open
//!                       |  \                   \
//!                     cancel add_item,          error --> NoReceipt
//!                       |    set_payment_method
//!                       v
//!                    NoReceipt
//! ```
//!
//! [`Register::issue`] freezes the open receipt and runs it through
//! encode, hash, sign, assemble, seal and submit. Submission is the last step,
//! so a receipt reaches the bank only if every step before it succeeded. Any
//! failure discards the receipt and reports which step failed.

mod draft;

use std::{future::Future, time::Duration};

use chrono::{SubsecRound, Utc};
use log::{debug, error, info};
use receipt_format::{codec, fields, receipt_hash, signed, LineItem, Receipt, ReceiptMetadata};
use receipt_sealing::OneTimeKey;

pub use self::draft::ReceiptDraft;
use crate::{
    adapters::{ReceiptBank, ReceiptSigner, Submission},
    catalog::Catalog,
    config::{StoreInfo, Timeouts},
    error::IssueStep,
    sequence::{CounterSequence, SequenceSource},
    Error, Result,
};

/// Observable state of a [`Register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RegisterStatus {
    NoReceipt,
    Open,
    Issuing,
    Closed,
}

#[derive(Debug)]
enum RegisterState {
    NoReceipt,
    Open(ReceiptDraft),
    Issuing,
    Closed(Receipt),
}

pub struct Register<S, B, Q = CounterSequence> {
    signer: S,
    bank: B,
    sequence: Q,
    store: StoreInfo,
    catalog: Catalog,
    timeouts: Timeouts,
    state: RegisterState,
}

impl<S, B, Q> Register<S, B, Q> {
    pub fn new(signer: S, bank: B, sequence: Q, store: StoreInfo, catalog: Catalog) -> Self {
        Register {
            signer,
            bank,
            sequence,
            store,
            catalog,
            timeouts: Timeouts::default(),
            state: RegisterState::NoReceipt,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn status(&self) -> RegisterStatus {
        match self.state {
            RegisterState::NoReceipt => RegisterStatus::NoReceipt,
            RegisterState::Open(_) => RegisterStatus::Open,
            RegisterState::Issuing => RegisterStatus::Issuing,
            RegisterState::Closed(_) => RegisterStatus::Closed,
        }
    }

    /// The receipt being rung up, if one is open.
    pub fn current_receipt(&self) -> Option<&ReceiptDraft> {
        match &self.state {
            RegisterState::Open(draft) => Some(draft),
            _ => None,
        }
    }

    /// The receipt issued by the last successful [`Register::issue`], until
    /// the next one is started.
    pub fn last_issued(&self) -> Option<&Receipt> {
        match &self.state {
            RegisterState::Closed(receipt) => Some(receipt),
            _ => None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn sequence(&self) -> &Q {
        &self.sequence
    }

    pub fn sequence_mut(&mut self) -> &mut Q {
        &mut self.sequence
    }

    /// Opens a new, empty receipt.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            RegisterState::NoReceipt | RegisterState::Closed(_) => {
                debug!("Starting new receipt");
                self.state = RegisterState::Open(ReceiptDraft::default());
                Ok(())
            }
            RegisterState::Open(_) | RegisterState::Issuing => {
                Err(Error::InvalidStateForRequestedAction {
                    status: self.status(),
                })
            }
        }
    }

    /// Adds `quantity` units of a catalog category to the open receipt.
    ///
    /// `custom_price` overrides the category's preset price. Returns the line
    /// as it stands after the addition.
    pub fn add_item(
        &mut self,
        category_id: u16,
        quantity: u16,
        custom_price: Option<f64>,
    ) -> Result<LineItem> {
        let RegisterState::Open(draft) = &mut self.state else {
            return Err(Error::NoOpenReceipt);
        };
        if quantity == 0 {
            return Err(Error::ZeroQuantity);
        }
        let category = self
            .catalog
            .get(category_id)
            .ok_or(Error::UnknownCategory(category_id))?;
        let unit_price = custom_price.unwrap_or(category.preset_price);
        if !unit_price.is_finite() || unit_price <= 0.0 {
            return Err(Error::InvalidPrice(unit_price));
        }

        let line = draft.add_item(category_id, quantity, unit_price, category.tax_rate)?;
        debug!(
            "Added {quantity} x {} at {unit_price:.2}, line quantity now {}",
            category.name,
            line.quantity()
        );
        Ok(line.clone())
    }

    pub fn set_payment_method(&mut self, method: impl Into<String>) -> Result<()> {
        let RegisterState::Open(draft) = &mut self.state else {
            return Err(Error::NoOpenReceipt);
        };
        draft.set_payment_method(method.into());
        Ok(())
    }

    /// Drops the open receipt.
    pub fn cancel(&mut self) -> Result<()> {
        let RegisterState::Open(_) = self.state else {
            return Err(Error::NoOpenReceipt);
        };
        debug!("Cancelling open receipt");
        self.state = RegisterState::NoReceipt;
        Ok(())
    }
}

impl<S, B, Q> Register<S, B, Q>
where
    S: ReceiptSigner + Send + Sync,
    B: ReceiptBank + Send + Sync,
    Q: SequenceSource + Send,
{
    /// Issues the open receipt to the holder of `receiver_key`, a 33-byte
    /// compressed P-256 public key.
    ///
    /// On success the register is `Closed` and the finalized receipt is
    /// returned for display. On any failure the receipt is discarded, the
    /// register is back to `NoReceipt` and nothing was submitted to the bank.
    ///
    /// Once the signer has been called the pipeline runs to completion or to
    /// its first error. The signer and bank calls are bounded by the
    /// register's [`Timeouts`] and are never retried.
    pub async fn issue(&mut self, receiver_key: &[u8]) -> Result<Receipt> {
        let Register {
            signer,
            bank,
            sequence,
            store,
            timeouts,
            state,
            ..
        } = self;

        let draft = match std::mem::replace(state, RegisterState::Issuing) {
            RegisterState::Open(draft) => draft,
            previous => {
                *state = previous;
                return Err(Error::NoOpenReceipt);
            }
        };
        let guard = IssuingGuard { state };

        let outcome = async {
            draft.validate()?;
            let receiver =
                OneTimeKey::from_compressed(receiver_key).map_err(Error::InvalidReceiverKey)?;
            let receipt = stamp(draft, sequence, store);
            sign_seal_submit(signer, bank, timeouts, &receipt, receiver).await?;
            Ok::<_, Error>(receipt)
        }
        .await;

        match outcome {
            Ok(receipt) => {
                info!(
                    "Issued receipt {} with {} items, total {:.2}",
                    receipt.transaction_id(),
                    receipt.items().len(),
                    receipt.total_amount()
                );
                guard.close(receipt.clone());
                Ok(receipt)
            }
            Err(err) => {
                match err.step() {
                    Some(step) => error!("Receipt discarded, {step} step failed: {err}"),
                    None => error!("Receipt discarded: {err}"),
                }
                Err(err)
            }
        }
    }
}

/// Puts the register back to `NoReceipt` unless the issuance completed.
struct IssuingGuard<'a> {
    state: &'a mut RegisterState,
}

impl IssuingGuard<'_> {
    fn close(self, receipt: Receipt) {
        *self.state = RegisterState::Closed(receipt);
    }
}

impl Drop for IssuingGuard<'_> {
    fn drop(&mut self) {
        if matches!(self.state, RegisterState::Issuing) {
            *self.state = RegisterState::NoReceipt;
        }
    }
}

fn stamp<Q: SequenceSource>(draft: ReceiptDraft, sequence: &mut Q, store: &StoreInfo) -> Receipt {
    let numbers = sequence.next();
    let timestamp = Utc::now().trunc_subsecs(0);
    let metadata = ReceiptMetadata {
        report_number: fields::format_report_number(numbers.report),
        transaction_id: fields::format_transaction_id(&timestamp, numbers.receipt),
        timestamp,
        registration_id: fields::format_registration_id(store.registration_id),
        store_name: store.name.clone(),
        store_address: store.address.clone(),
        serial: fields::format_serial(numbers.receipt),
    };
    let (items, payment_method) = draft.into_parts();
    Receipt::finalize(metadata, items, payment_method)
}

async fn sign_seal_submit<S, B>(
    signer: &S,
    bank: &B,
    timeouts: &Timeouts,
    receipt: &Receipt,
    receiver: OneTimeKey,
) -> Result<()>
where
    S: ReceiptSigner + Sync,
    B: ReceiptBank + Sync,
{
    let binary = codec::encode(receipt)?;
    let hash = receipt_hash(&binary);
    debug!(
        "Encoded receipt {} into {} bytes",
        receipt.transaction_id(),
        binary.len()
    );

    let signature = within(IssueStep::Sign, timeouts.signer, signer.sign(&hash))
        .await?
        .map_err(|err| Error::Signer {
            source_error: anyhow::Error::new(err),
        })?;
    let signed = signed::assemble(&binary, &signature)?;
    let payload = receipt_sealing::seal(receiver.public_key(), &signed)?;
    debug!("Sealed {} bytes for submission", payload.len());

    let submission = Submission {
        index_key: receiver,
        payload,
        tracking_id: Some(receipt.transaction_id().to_string()),
    };
    within(IssueStep::Submit, timeouts.bank, bank.submit(submission))
        .await?
        .map_err(|err| Error::Bank {
            source_error: anyhow::Error::new(err),
        })
}

async fn within<F: Future>(step: IssueStep, limit: Duration, future: F) -> Result<F::Output> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| Error::Timeout {
            step,
            timeout: limit,
        })
}
