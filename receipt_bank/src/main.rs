// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]

use std::{sync::Arc, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use log::{debug, info};
use receipt_bank::{metrics, server, store, webhook::WebhookNotifier};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for API requests.
    /// Defaults to 8082.
    #[arg(long, default_value_t = 8082, env = "RECEIPT_BANK_PORT")]
    port: u16,

    /// Metrics server port.
    /// Defaults to 5000.
    #[arg(long, default_value_t = 5000, env = "RECEIPT_BANK_METRICS_PORT")]
    metrics_port: u16,

    /// Seconds between two sweeps of expired receipts.
    /// Defaults to 60.
    #[arg(long, default_value_t = 60, env = "RECEIPT_BANK_CLEANUP_INTERVAL_SECS")]
    cleanup_interval_secs: u64,

    /// Seconds a receipt waits for collection before it may be swept.
    /// Defaults to 24 hours.
    #[arg(long, default_value_t = 24 * 60 * 60, env = "RECEIPT_BANK_MAX_RECEIPT_AGE_SECS")]
    max_receipt_age_secs: u64,

    /// Timeout of one collection webhook call, in seconds.
    /// Defaults to 10.
    #[arg(long, default_value_t = 10, env = "RECEIPT_BANK_WEBHOOK_TIMEOUT_SECS")]
    webhook_timeout_secs: u64,

    /// Retries after a failed collection webhook call.
    /// Defaults to 3.
    #[arg(long, default_value_t = 3, env = "RECEIPT_BANK_WEBHOOK_MAX_RETRIES")]
    webhook_max_retries: u32,

    /// Maximum request body size in bytes.
    /// Defaults to 10MB.
    #[arg(long, default_value_t = 10 * 1024 * 1024, env = "RECEIPT_BANK_MAX_REQUEST_BODY_SIZE")]
    max_request_body_size: usize,
}

impl Args {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.cleanup_interval_secs > 0,
            "cleanup interval must be at least one second"
        );
        ensure!(
            self.max_receipt_age_secs > 0,
            "maximum receipt age must be at least one second"
        );
        ensure!(
            self.webhook_timeout_secs > 0,
            "webhook timeout must be at least one second"
        );
        ensure!(
            self.max_request_body_size > 0,
            "maximum request body size must be positive"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger.
    // Set the log level by setting the RUST_LOG environment variable.
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    debug!("Settings: {:?}", args);
    args.validate()?;

    // Start the metrics server.
    // We just let it gracelessly get killed at the end of main()
    tokio::spawn(metrics::run_server(args.metrics_port));

    let store = Arc::new(store::ReceiptStore::new(Duration::from_secs(
        args.max_receipt_age_secs,
    )));
    let sweeper = store::spawn_sweeper(
        store.clone(),
        Duration::from_secs(args.cleanup_interval_secs),
    );
    let notifier = WebhookNotifier::new(
        Duration::from_secs(args.webhook_timeout_secs),
        args.webhook_max_retries,
    )?;

    // This await is non-blocking
    let (handle, _) =
        server::run_server(args.port, store, notifier, args.max_request_body_size).await?;
    info!("Server started. Listening on port {}.", args.port);

    let _ = handle.await;

    // If we're here, we've received a signal to exit.
    info!("Shutting down...");
    sweeper.abort();
    Ok(())
}
