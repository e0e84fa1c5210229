// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! HTTP clients for a remote signing authority and receipt bank.
//!
//! Both services speak JSON with binary fields in standard base64. Errors come
//! back as `{"error": "..."}` with a non-2xx status.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use receipt_format::ReceiptHash;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::{ReceiptBank, ReceiptSigner, Submission};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Compressed one-time key of the receiver.
    pub ephemeral_key: String,
    pub encrypted_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub receipt_id: String,
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}: {message}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("invalid base64 in `{field}`: {source}")]
    Base64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },
}

/// Client for the signing authority's `/sign` and `/public-key` endpoints.
#[derive(Debug, Clone)]
pub struct HttpSigner {
    base_url: String,
    client: Client,
}

impl HttpSigner {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpSigner::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        HttpSigner {
            base_url: trim_base_url(base_url.into()),
            client,
        }
    }
}

#[async_trait]
impl ReceiptSigner for HttpSigner {
    type AdapterError = HttpError;

    async fn sign(&self, hash: &ReceiptHash) -> Result<Vec<u8>, Self::AdapterError> {
        let url = format!("{}/sign", self.base_url);
        let request = SignRequest {
            hash: STANDARD.encode(hash),
        };
        let response = self.client.post(&url).json(&request).send().await;
        let response: SignResponse = read_json(&url, response).await?;
        decode_field("signature", &response.signature)
    }

    async fn public_key(&self) -> Result<Vec<u8>, Self::AdapterError> {
        let url = format!("{}/public-key", self.base_url);
        let response = self.client.get(&url).send().await;
        let response: PublicKeyResponse = read_json(&url, response).await?;
        decode_field("public_key", &response.public_key)
    }
}

/// Client for the receipt bank's `/submit` endpoint.
#[derive(Debug, Clone)]
pub struct HttpReceiptBank {
    base_url: String,
    client: Client,
    webhook_url: Option<String>,
}

impl HttpReceiptBank {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpReceiptBank::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        HttpReceiptBank {
            base_url: trim_base_url(base_url.into()),
            client,
            webhook_url: None,
        }
    }

    /// Asks the bank to call `webhook_url` when a submitted receipt is
    /// collected.
    pub fn with_webhook(mut self, webhook_url: impl Into<String>) -> Self {
        self.webhook_url = Some(webhook_url.into());
        self
    }
}

#[async_trait]
impl ReceiptBank for HttpReceiptBank {
    type AdapterError = HttpError;

    async fn submit(&self, submission: Submission) -> Result<(), Self::AdapterError> {
        let url = format!("{}/submit", self.base_url);
        let request = SubmitRequest {
            ephemeral_key: STANDARD.encode(submission.index_key.as_bytes()),
            encrypted_data: STANDARD.encode(&submission.payload),
            receipt_id: submission.tracking_id,
            webhook_url: self.webhook_url.clone(),
        };
        let response = self.client.post(&url).json(&request).send().await;
        let response: SubmitResponse = read_json(&url, response).await?;
        debug!("Receipt bank accepted receipt {}", response.receipt_id);
        Ok(())
    }
}

fn trim_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_owned()
}

fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, HttpError> {
    STANDARD
        .decode(value)
        .map_err(|source| HttpError::Base64 { field, source })
}

async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Result<Response>,
) -> Result<T, HttpError> {
    let transport = |source| HttpError::Transport {
        url: url.to_owned(),
        source,
    };
    let response = response.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|error| error.error)
            .unwrap_or(body);
        return Err(HttpError::Status {
            url: url.to_owned(),
            status,
            message,
        });
    }
    response.json().await.map_err(transport)
}
