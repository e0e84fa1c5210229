// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Serves the default Prometheus registry on `/metrics`.

use axum::{http::StatusCode, routing::get, Router};
use log::{error, info};
use prometheus::{Encoder, TextEncoder};
use tokio::net::TcpListener;

async fn handler_metrics() -> (StatusCode, String) {
    let metric_families = prometheus::gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {e}");
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    match String::from_utf8(buffer) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!("Metrics are not valid UTF-8: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}

pub async fn run_server(port: u16) {
    let app = Router::new().route("/metrics", get(handler_metrics));
    let listener = match TcpListener::bind(&format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind metrics server to port {port}: {e}");
            return;
        }
    };
    info!("Metrics server listening on port {port}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Metrics server error: {e}");
    }
}
