// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! JSON bodies of the receipt bank API and their validation.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine as _,
};
use receipt_sealing::{point::COMPRESSED_LEN, OneTimeKey};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const WEBHOOK_STATUS_DOWNLOADED: &str = "downloaded";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub ephemeral_key: String,
    pub encrypted_data: String,
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub receipt_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectQuery {
    pub ephemeral_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectResponse {
    pub encrypted_data: String,
    pub receipt_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub receipts_stored: usize,
    pub receipts_expired: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub receipt_id: String,
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("No receipt found for given ephemeral key")]
    NotFound,
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Query(#[from] QueryRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Json(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            // Missing fields, wrong types and a missing content type are all
            // malformed submissions.
            ApiError::Json(_) => StatusCode::BAD_REQUEST,
            ApiError::Query(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match &self {
            ApiError::Json(rejection) => rejection.body_text(),
            ApiError::Query(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        (self.status(), Json(ErrorResponse { error })).into_response()
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub key: OneTimeKey,
    pub payload: Vec<u8>,
    pub receipt_id: Option<String>,
    pub webhook_url: Option<String>,
}

impl SubmitRequest {
    pub fn validate(self) -> Result<ValidSubmission, ApiError> {
        let key = parse_ephemeral_key(&self.ephemeral_key)?;

        if self.encrypted_data.is_empty() {
            return Err(ApiError::BadRequest("encrypted_data is required".into()));
        }
        let payload = STANDARD
            .decode(&self.encrypted_data)
            .map_err(|_| ApiError::BadRequest("encrypted_data must be valid base64".into()))?;

        if let Some(receipt_id) = &self.receipt_id {
            if !is_valid_receipt_id(receipt_id) {
                return Err(ApiError::BadRequest(
                    "receipt_id must contain only alphanumeric characters and hyphens".into(),
                ));
            }
        }

        if let Some(webhook_url) = &self.webhook_url {
            let url = Url::parse(webhook_url)
                .map_err(|_| ApiError::BadRequest("webhook_url must be a valid URL".into()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ApiError::BadRequest(
                    "webhook_url must use HTTP or HTTPS".into(),
                ));
            }
        }

        Ok(ValidSubmission {
            key,
            payload,
            receipt_id: self.receipt_id,
            webhook_url: self.webhook_url,
        })
    }
}

/// Parses a base64 compressed one-time key. Both the standard and the
/// URL-safe alphabets are accepted, since the key may travel in a URL path.
pub fn parse_ephemeral_key(value: &str) -> Result<OneTimeKey, ApiError> {
    if value.is_empty() {
        return Err(ApiError::BadRequest("ephemeral_key is required".into()));
    }
    let bytes = STANDARD
        .decode(value)
        .or_else(|_| URL_SAFE.decode(value))
        .map_err(|_| ApiError::BadRequest("ephemeral_key must be valid base64".into()))?;
    if bytes.len() != COMPRESSED_LEN {
        return Err(ApiError::BadRequest(format!(
            "ephemeral_key must decode to exactly {COMPRESSED_LEN} bytes"
        )));
    }
    OneTimeKey::from_compressed(&bytes).map_err(|_| {
        ApiError::BadRequest("ephemeral_key must be a compressed P-256 point".into())
    })
}

fn is_valid_receipt_id(receipt_id: &str) -> bool {
    !receipt_id.is_empty()
        && receipt_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}
