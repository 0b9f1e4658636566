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

//! JSON-RPC transport to a simulated chain and a typed client for its
//! dev-mode methods (`evm_*`, `miner_*`).

use crate::core::types::{Address, TxHash};
use crate::monitoring::metrics::HarnessMetrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Transport / protocol errors.
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP transport failure.
    #[error("transport: {0}")]
    Transport(String),
    /// Node returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
    },
    /// Result has an unexpected shape.
    #[error("unexpected response to {method}: {detail}")]
    Decode {
        /// Method that was called.
        method: String,
        /// What went wrong.
        detail: String,
    },
}

/// Raw JSON-RPC transport.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Issue `method(params)` and return the `result` member.
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

/// JSON-RPC over HTTP.
pub struct HttpRpc {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
    metrics: Option<Arc<HarnessMetrics>>,
}

impl HttpRpc {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
            metrics: None,
        })
    }

    /// Count requests and failures in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<HarnessMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let req = Request {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let resp: Response = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| RpcError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| RpcError::Decode {
                method: method.to_string(),
                detail: e.to_string(),
            })?;

        if let Some(err) = resp.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(resp.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainRpc for HttpRpc {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        if let Some(m) = &self.metrics {
            m.rpc_requests_total.inc();
        }
        let res = self.send(method, params).await;
        if res.is_err() {
            if let Some(m) = &self.metrics {
                m.rpc_errors_total.inc();
            }
        }
        res
    }
}

fn decode_err(method: &str, detail: impl Into<String>) -> RpcError {
    RpcError::Decode {
        method: method.to_string(),
        detail: detail.into(),
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(method: &str, v: &Value) -> Result<u64, RpcError> {
    match v {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            if digits.is_empty() {
                return Ok(0);
            }
            u64::from_str_radix(digits, 16)
                .map_err(|_| decode_err(method, format!("bad quantity {s}")))
        }
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| decode_err(method, format!("bad quantity {n}"))),
        other => Err(decode_err(method, format!("expected quantity, got {other}"))),
    }
}

/// Format a hex quantity.
pub fn quantity(v: u64) -> String {
    format!("0x{v:x}")
}

fn parse_data(method: &str, v: &Value) -> Result<Vec<u8>, RpcError> {
    let s = v
        .as_str()
        .ok_or_else(|| decode_err(method, "expected hex data"))?;
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|_| decode_err(method, "bad hex data"))
}

/// The two header fields the clock needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block number.
    pub number: u64,
    /// Block timestamp.
    pub timestamp: u64,
}

/// Typed client over a [`ChainRpc`] transport.
#[derive(Clone)]
pub struct DevChain {
    rpc: Arc<dyn ChainRpc>,
}

impl DevChain {
    /// Wrap a transport.
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Self {
        Self { rpc }
    }

    /// Underlying transport.
    pub fn rpc(&self) -> &Arc<dyn ChainRpc> {
        &self.rpc
    }

    /// Unlocked accounts of the node.
    pub async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        let v = self.rpc.request("eth_accounts", json!([])).await?;
        let arr = v
            .as_array()
            .ok_or_else(|| decode_err("eth_accounts", "expected array"))?;
        arr.iter()
            .map(|a| {
                a.as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| decode_err("eth_accounts", "bad address"))
            })
            .collect()
    }

    /// Latest block number.
    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let v = self.rpc.request("eth_blockNumber", json!([])).await?;
        parse_quantity("eth_blockNumber", &v)
    }

    /// Number and timestamp of the latest mined block.
    pub async fn latest_block(&self) -> Result<BlockHeader, RpcError> {
        const METHOD: &str = "eth_getBlockByNumber";
        let v = self.rpc.request(METHOD, json!(["latest", false])).await?;
        let field = |name: &str| {
            v.get(name)
                .ok_or_else(|| decode_err(METHOD, format!("missing {name}")))
                .and_then(|q| parse_quantity(METHOD, q))
        };
        Ok(BlockHeader {
            number: field("number")?,
            timestamp: field("timestamp")?,
        })
    }

    /// Timestamp of the latest mined block.
    pub async fn latest_timestamp(&self) -> Result<u64, RpcError> {
        Ok(self.latest_block().await?.timestamp)
    }

    /// Shift the next block's timestamp forward by `seconds`.
    pub async fn increase_time(&self, seconds: u64) -> Result<(), RpcError> {
        debug!(seconds, "evm_increaseTime");
        self.rpc.request("evm_increaseTime", json!([seconds])).await?;
        Ok(())
    }

    /// Mine one block.
    pub async fn mine(&self) -> Result<(), RpcError> {
        self.rpc.request("evm_mine", json!([])).await?;
        Ok(())
    }

    /// Pause block production.
    pub async fn miner_stop(&self) -> Result<(), RpcError> {
        self.rpc.request("miner_stop", json!([])).await?;
        Ok(())
    }

    /// Resume block production.
    pub async fn miner_start(&self) -> Result<(), RpcError> {
        self.rpc.request("miner_start", json!([])).await?;
        Ok(())
    }

    /// Take a full state snapshot; returns the node's opaque id.
    pub async fn evm_snapshot(&self) -> Result<String, RpcError> {
        let v = self.rpc.request("evm_snapshot", json!([])).await?;
        match v {
            Value::String(s) => Ok(s),
            Value::Number(n) => n
                .as_u64()
                .map(quantity)
                .ok_or_else(|| decode_err("evm_snapshot", format!("bad snapshot id {n}"))),
            other => Err(decode_err("evm_snapshot", format!("expected id, got {other}"))),
        }
    }

    /// Revert to snapshot `id`; `false` when the node does not know the id.
    pub async fn evm_revert(&self, id: &str) -> Result<bool, RpcError> {
        let v = self.rpc.request("evm_revert", json!([id])).await?;
        v.as_bool()
            .ok_or_else(|| decode_err("evm_revert", "expected bool"))
    }

    /// Simulated call (`eth_call` at the pending block); never mutates state.
    pub async fn call(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
    ) -> Result<Vec<u8>, RpcError> {
        let tx = json!({
            "from": from.to_string(),
            "to": to.to_string(),
            "data": format!("0x{}", hex::encode(data)),
        });
        let v = self.rpc.request("eth_call", json!([tx, "pending"])).await?;
        parse_data("eth_call", &v)
    }

    /// Submit a transaction from an unlocked account; returns without waiting
    /// for a receipt.
    pub async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
    ) -> Result<TxHash, RpcError> {
        let tx = json!({
            "from": from.to_string(),
            "to": to.to_string(),
            "data": format!("0x{}", hex::encode(data)),
        });
        let v = self.rpc.request("eth_sendTransaction", json!([tx])).await?;
        v.as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| decode_err("eth_sendTransaction", "bad tx hash"))
    }
}
