// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Receipt issuer
//!
//! The point-of-sale side of anonymous receipts. A [`Register`] rings up line
//! items from a [`Catalog`], and on [`Register::issue`] turns the receipt into
//! its binary form, has the signing authority sign its hash, seals the signed
//! receipt to the customer's one-time key and deposits it in the receipt bank.
//!
//! The signing authority and the receipt bank are reached through the
//! [`adapters`] traits. [`context`] has in-process and HTTP implementations,
//! and [`services`] picks between them from an [`IssuerConfig`].
//!
//! ## Getting started
//!
//! ```no_run
//! # async fn run() -> Result<(), receipt_issuer::Error> {
//! use receipt_issuer::{
//!     config::{CollaboratorMode, IssuerConfig, StoreInfo},
//!     services::create_register,
//! };
//!
//! let config = IssuerConfig {
//!     store: StoreInfo {
//!         registration_id: 1234567890,
//!         name: "Corner Shop".into(),
//!         address: "1 Main Street".into(),
//!     },
//!     catalog: Default::default(),
//!     collaborators: CollaboratorMode::Standalone,
//!     signer_timeout_secs: 10,
//!     bank_timeout_secs: 15,
//! };
//! let mut register = create_register(&config);
//! register.start()?;
//! register.add_item(1, 2, None)?;
//! register.set_payment_method("CASH")?;
//! # let customer_key = [0u8; 33];
//! let receipt = register.issue(&customer_key).await?;
//! println!("issued {}", receipt.transaction_id());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod context;
mod error;
pub mod register;
pub mod sequence;
#[cfg(feature = "in_memory")]
pub mod services;

pub use catalog::{Catalog, Category};
pub use config::IssuerConfig;
pub use error::{Error, IssueStep, Result};
pub use register::{Register, RegisterStatus};
