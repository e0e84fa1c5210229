// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{SecondsFormat, Utc};
use lazy_static::lazy_static;
use log::{error, info, warn};
use prometheus::{register_int_counter, IntCounter};
use tokio::{net::TcpListener, signal, task::JoinHandle};

use crate::{
    api::{
        parse_ephemeral_key, ApiError, CollectQuery, CollectResponse, HealthResponse,
        SubmitRequest, SubmitResponse,
    },
    store::{ReceiptStore, StoreError},
    webhook::WebhookNotifier,
};

// Register the metrics into the global metrics registry.
lazy_static! {
    static ref SUBMISSION_COUNTER: IntCounter = register_int_counter!(
        "receipt_submission_count",
        "Number of sealed receipts accepted for storage."
    )
    .unwrap();
    static ref SUBMISSION_CONFLICT_COUNTER: IntCounter = register_int_counter!(
        "receipt_submission_conflict_count",
        "Number of submissions rejected because the receipt id or key was already in use."
    )
    .unwrap();
    static ref COLLECTION_COUNTER: IntCounter = register_int_counter!(
        "receipt_collection_count",
        "Number of sealed receipts handed out."
    )
    .unwrap();
    static ref COLLECTION_MISS_COUNTER: IntCounter = register_int_counter!(
        "receipt_collection_miss_count",
        "Number of collection requests for which no receipt was stored."
    )
    .unwrap();
    static ref WEBHOOK_FAILURE_COUNTER: IntCounter = register_int_counter!(
        "webhook_failure_count",
        "Number of collection notifications that failed after all retries."
    )
    .unwrap();
}

#[derive(Debug, Clone)]
struct AppState {
    store: Arc<ReceiptStore>,
    notifier: WebhookNotifier,
}

pub fn router(
    store: Arc<ReceiptStore>,
    notifier: WebhookNotifier,
    max_request_body_size: usize,
) -> Router {
    Router::new()
        .route("/submit", post(submit))
        .route("/collect", get(collect_by_query))
        .route("/collect/{ephemeral_key}", get(collect_by_path))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_request_body_size))
        .with_state(AppState { store, notifier })
}

async fn submit(
    State(state): State<AppState>,
    request: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(request) = request?;
    let submission = request.validate()?;
    let receipt_id = submission.receipt_id.unwrap_or_else(random_receipt_id);

    match state.store.submit(
        submission.key,
        submission.payload,
        receipt_id.clone(),
        submission.webhook_url,
    ) {
        Ok(()) => {
            SUBMISSION_COUNTER.inc();
            info!("Receipt {receipt_id} submitted");
            Ok(Json(SubmitResponse { receipt_id }))
        }
        Err(StoreError::DuplicateId { .. }) => {
            SUBMISSION_CONFLICT_COUNTER.inc();
            Err(ApiError::Conflict("Receipt ID already exists".into()))
        }
        Err(StoreError::KeyInUse) => {
            SUBMISSION_CONFLICT_COUNTER.inc();
            Err(ApiError::Conflict(
                "A receipt is already stored for this ephemeral key".into(),
            ))
        }
        Err(e @ StoreError::Poisoned) => {
            error!("Failed to store receipt {receipt_id}: {e}");
            Err(ApiError::Internal("Failed to store receipt".into()))
        }
    }
}

async fn collect_by_path(
    State(state): State<AppState>,
    Path(ephemeral_key): Path<String>,
) -> Result<Json<CollectResponse>, ApiError> {
    collect(&state, &ephemeral_key)
}

async fn collect_by_query(
    State(state): State<AppState>,
    query: Result<Query<CollectQuery>, QueryRejection>,
) -> Result<Json<CollectResponse>, ApiError> {
    let Query(query) = query?;
    collect(&state, &query.ephemeral_key)
}

fn collect(state: &AppState, ephemeral_key: &str) -> Result<Json<CollectResponse>, ApiError> {
    let key = parse_ephemeral_key(ephemeral_key)?;
    let receipt = state.store.collect(&key).map_err(|e| {
        error!("Failed to collect receipt: {e}");
        ApiError::Internal("Failed to retrieve receipt".into())
    })?;
    let Some(receipt) = receipt else {
        COLLECTION_MISS_COUNTER.inc();
        return Err(ApiError::NotFound);
    };

    COLLECTION_COUNTER.inc();
    info!("Receipt {} collected", receipt.receipt_id);

    if let Some(webhook_url) = receipt.webhook_url.clone() {
        let notifier = state.notifier.clone();
        let receipt_id = receipt.receipt_id.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_collection(&webhook_url, &receipt_id).await {
                WEBHOOK_FAILURE_COUNTER.inc();
                warn!("Failed to notify collection of receipt {receipt_id}: {e}");
            }
        });
    }

    Ok(Json(CollectResponse {
        encrypted_data: STANDARD.encode(&receipt.payload),
        receipt_id: receipt.receipt_id,
    }))
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let stats = state.store.stats().map_err(|e| {
        error!("Failed to read store statistics: {e}");
        ApiError::Internal("Failed to read store statistics".into())
    })?;
    Ok(Json(HealthResponse {
        status: "healthy".into(),
        receipts_stored: stats.stored,
        receipts_expired: stats.expired,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

fn random_receipt_id() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

pub async fn run_server(
    port: u16,
    store: Arc<ReceiptStore>,
    notifier: WebhookNotifier,
    max_request_body_size: usize,
) -> Result<(JoinHandle<()>, std::net::SocketAddr)> {
    let app = router(store, notifier, max_request_body_size);

    // Create a `TcpListener` using tokio.
    let listener = TcpListener::bind(&format!("0.0.0.0:{port}")).await?;

    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_handler())
            .await
        {
            error!("Receipt bank error: {e}");
        }
    });

    Ok((handle, addr))
}

/// Graceful shutdown handler
async fn shutdown_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");
}
