// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests live under `tests/`. They run a mock signing authority and
//! a real receipt bank on local ports and drive a register against both.
