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

use crate::core::economics::tolerance::ToleranceError;
use prometheus::{IntCounter, Registry};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
}

/// Harness counters.
#[derive(Clone)]
pub struct HarnessMetrics {
    /// Registry.
    pub registry: Registry,

    /// JSON-RPC requests sent.
    pub rpc_requests_total: IntCounter,
    /// JSON-RPC requests that failed (transport or node error).
    pub rpc_errors_total: IntCounter,
    /// Tolerance checks performed.
    pub tolerance_checks_total: IntCounter,
    /// Tolerance checks that failed.
    pub tolerance_failures_total: IntCounter,
    /// Rebases submitted.
    pub rebases_total: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, MetricsError> {
    let c = IntCounter::new(name, help).map_err(|_| MetricsError::Prom)?;
    registry
        .register(Box::new(c.clone()))
        .map_err(|_| MetricsError::Prom)?;
    Ok(c)
}

impl HarnessMetrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let rpc_requests_total = counter(
            &registry,
            "geyser_harness_rpc_requests_total",
            "JSON-RPC requests sent",
        )?;
        let rpc_errors_total = counter(
            &registry,
            "geyser_harness_rpc_errors_total",
            "Failed JSON-RPC requests",
        )?;
        let tolerance_checks_total = counter(
            &registry,
            "geyser_harness_tolerance_checks_total",
            "Tolerance checks performed",
        )?;
        let tolerance_failures_total = counter(
            &registry,
            "geyser_harness_tolerance_failures_total",
            "Tolerance checks out of band",
        )?;
        let rebases_total = counter(
            &registry,
            "geyser_harness_rebases_total",
            "Rebases submitted",
        )?;

        Ok(Self {
            registry,
            rpc_requests_total,
            rpc_errors_total,
            tolerance_checks_total,
            tolerance_failures_total,
            rebases_total,
        })
    }

    /// Count one tolerance check outcome.
    pub fn observe_check<T>(&self, outcome: &Result<T, ToleranceError>) {
        self.tolerance_checks_total.inc();
        if outcome.is_err() {
            self.tolerance_failures_total.inc();
        }
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> Result<String, MetricsError> {
        use prometheus::Encoder;
        let mut buf = Vec::new();
        prometheus::TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| MetricsError::Prom)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Prom)
    }
}
