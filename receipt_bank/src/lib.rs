// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod api;
pub mod metrics;
pub mod server;
pub mod store;
pub mod webhook;
