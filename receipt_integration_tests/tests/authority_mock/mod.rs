// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! A signing authority speaking the `/sign` and `/public-key` JSON API, backed
//! by an in-process [`LocalSigner`].

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use receipt_format::RECEIPT_HASH_LEN;
use receipt_issuer::{
    adapters::ReceiptSigner,
    context::{
        http::{ErrorResponse, PublicKeyResponse, SignRequest, SignResponse},
        memory::LocalSigner,
    },
};
use tokio::{net::TcpListener, task::JoinHandle};

/// How the mock answers `/sign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Honest,
    Unavailable,
}

struct Authority {
    signer: LocalSigner,
    behavior: Behavior,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

async fn sign(
    State(authority): State<Arc<Authority>>,
    Json(request): Json<SignRequest>,
) -> ApiResult<SignResponse> {
    if authority.behavior == Behavior::Unavailable {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "signing is temporarily unavailable",
        ));
    }
    let hash = STANDARD
        .decode(&request.hash)
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "hash must be valid base64"))?;
    let hash: [u8; RECEIPT_HASH_LEN] = hash.try_into().map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("hash must be {RECEIPT_HASH_LEN} bytes"),
        )
    })?;
    let signature = authority
        .signer
        .sign(&hash)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(SignResponse {
        signature: STANDARD.encode(signature),
    }))
}

async fn public_key(State(authority): State<Arc<Authority>>) -> ApiResult<PublicKeyResponse> {
    let public_key = authority
        .signer
        .public_key()
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(PublicKeyResponse {
        public_key: STANDARD.encode(public_key),
    }))
}

pub async fn run_server(
    signer: LocalSigner,
    behavior: Behavior,
) -> Result<(JoinHandle<()>, SocketAddr)> {
    let app = Router::new()
        .route("/sign", post(sign))
        .route("/public-key", get(public_key))
        .with_state(Arc::new(Authority { signer, behavior }));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Authority mock error: {e}");
        }
    });
    Ok((handle, addr))
}
