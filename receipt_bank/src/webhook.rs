// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::api::{WebhookPayload, WEBHOOK_STATUS_DOWNLOADED};

pub const DEFAULT_RETRY_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook returned status {0}")]
    Status(StatusCode),
}

/// Tells issuers that one of their receipts was collected.
///
/// A failed call is retried up to `max_retries` times, waiting
/// `attempt * retry_step` before each retry.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    max_retries: u32,
    retry_step: Duration,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, WebhookError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(WebhookNotifier {
            client,
            max_retries,
            retry_step: DEFAULT_RETRY_STEP,
        })
    }

    pub fn with_retry_step(mut self, retry_step: Duration) -> Self {
        self.retry_step = retry_step;
        self
    }

    pub async fn notify_collection(
        &self,
        webhook_url: &str,
        receipt_id: &str,
    ) -> Result<(), WebhookError> {
        let payload = WebhookPayload {
            receipt_id: receipt_id.to_owned(),
            status: WEBHOOK_STATUS_DOWNLOADED.to_owned(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                tokio::time::sleep(self.retry_step * attempt).await;
                debug!("Webhook retry {attempt} for receipt {receipt_id}");
            }
            let error = match self.client.post(webhook_url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Notified collection of receipt {receipt_id}");
                    return Ok(());
                }
                Ok(response) => WebhookError::Status(response.status()),
                Err(e) => WebhookError::Request(e),
            };

            if attempt >= self.max_retries {
                warn!(
                    "Giving up notifying collection of receipt {receipt_id} after {} attempts: {error}",
                    attempt + 1
                );
                return Err(error);
            }
            debug!("Webhook attempt {} for receipt {receipt_id} failed: {error}", attempt + 1);
            attempt += 1;
        }
    }
}
