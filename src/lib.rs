// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Geyser harness - reward verification and time simulation for staking
//! contracts on an elastic-supply token.
//!
//! This crate provides:
//! - A simulated clock that pins dev-chain block timestamps
//! - Approximate-equality checks with currency and share tolerance presets
//! - Rebase arithmetic and a rebase driver
//! - A reward oracle checking user/founder splits against the geyser
//! - Chain snapshot/restore for per-test isolation
//! - A deterministic in-process chain with token and geyser models
//! - Bridge flow tracking, TOML config, Prometheus counters and JSON logging

/// Bridge flow state machine.
pub mod bridge;
/// Dev-chain access (JSON-RPC, ABI, contracts, clock, snapshots).
pub mod chain;
/// Harness configuration.
pub mod config;
/// Core primitives (types, errors, economics).
pub mod core;
/// Per-test context.
pub mod harness;
/// Observability (metrics, structured logging setup).
pub mod monitoring;
/// In-process simulated chain.
pub mod sim;
