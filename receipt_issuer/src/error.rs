// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{result::Result as StdResult, time::Duration};

use receipt_format::{signed::SignatureLengthError, EncodeError};
use receipt_sealing::{PointError, SealError};
use thiserror::Error;

use crate::register::RegisterStatus;

/// Stages of [`Register::issue`](crate::register::Register::issue), in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum IssueStep {
    Validate,
    Encode,
    Sign,
    Assemble,
    Encrypt,
    Submit,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("no receipt is open, start a new receipt first")]
    NoOpenReceipt,
    #[error("the requested action is invalid while the register is {status}")]
    InvalidStateForRequestedAction { status: RegisterStatus },
    #[error("unknown category id {0}")]
    UnknownCategory(u16),
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("unit price must be a positive amount, got {0}")]
    InvalidPrice(f64),
    #[error("line quantity would exceed {}", u16::MAX)]
    QuantityOverflow,
    #[error("cannot issue an empty receipt")]
    EmptyReceipt,
    #[error("no payment method set")]
    MissingPaymentMethod,
    #[error("receipt total must be positive, got {0}")]
    NonPositiveTotal(f64),
    #[error("invalid receiver key: {0}")]
    InvalidReceiverKey(#[source] PointError),
    #[error("failed to encode receipt: {0}")]
    Encode(#[from] EncodeError),
    #[error("signing authority error: {source_error}")]
    Signer { source_error: anyhow::Error },
    #[error("failed to assemble signed receipt: {0}")]
    Assemble(#[from] SignatureLengthError),
    #[error("failed to seal receipt: {0}")]
    Seal(#[from] SealError),
    #[error("receipt bank error: {source_error}")]
    Bank { source_error: anyhow::Error },
    #[error("{step} step timed out after {timeout:?}")]
    Timeout { step: IssueStep, timeout: Duration },
}

impl Error {
    /// The issuance step that failed, if the error came out of
    /// [`Register::issue`](crate::register::Register::issue).
    pub fn step(&self) -> Option<IssueStep> {
        match self {
            Error::EmptyReceipt
            | Error::MissingPaymentMethod
            | Error::NonPositiveTotal(_)
            | Error::InvalidReceiverKey(_) => Some(IssueStep::Validate),
            Error::Encode(_) => Some(IssueStep::Encode),
            Error::Signer { .. } => Some(IssueStep::Sign),
            Error::Assemble(_) => Some(IssueStep::Assemble),
            Error::Seal(_) => Some(IssueStep::Encrypt),
            Error::Bank { .. } => Some(IssueStep::Submit),
            Error::Timeout { step, .. } => Some(*step),
            Error::NoOpenReceipt
            | Error::InvalidStateForRequestedAction { .. }
            | Error::UnknownCategory(_)
            | Error::ZeroQuantity
            | Error::InvalidPrice(_)
            | Error::QuantityOverflow => None,
        }
    }
}

pub type Result<T> = StdResult<T, Error>;
