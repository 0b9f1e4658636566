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

//! Full chain-state snapshot and restore for test isolation.
//!
//! Handles are move-only: `restore` consumes the handle, so a handle cannot be
//! restored twice. Nested snapshots must be restored in reverse order; restoring
//! an outer snapshot retires every snapshot taken after it.

use crate::chain::rpc::{DevChain, RpcError};
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The chain rejected the snapshot request.
    #[error("snapshot unavailable: {0}")]
    Unavailable(#[source] RpcError),
    /// The chain does not know the handle (never taken, stale, or retired).
    #[error("invalid snapshot handle {0}")]
    InvalidHandle(String),
    /// The revert request itself failed.
    #[error("restore failed: {0}")]
    Restore(#[source] RpcError),
}

/// Opaque snapshot identifier.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a snapshot handle must be restored"]
pub struct ChainSnapshotHandle {
    id: String,
}

impl ChainSnapshotHandle {
    /// Node-assigned id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Request a full state snapshot.
pub async fn snapshot(chain: &DevChain) -> Result<ChainSnapshotHandle, SnapshotError> {
    let id = chain
        .evm_snapshot()
        .await
        .map_err(SnapshotError::Unavailable)?;
    debug!(%id, "snapshot taken");
    Ok(ChainSnapshotHandle { id })
}

/// Roll back to `handle`, retiring it.
pub async fn restore(chain: &DevChain, handle: ChainSnapshotHandle) -> Result<(), SnapshotError> {
    let ok = chain
        .evm_revert(&handle.id)
        .await
        .map_err(SnapshotError::Restore)?;
    if !ok {
        return Err(SnapshotError::InvalidHandle(handle.id));
    }
    debug!(id = %handle.id, "snapshot restored");
    Ok(())
}

/// Run `body` between a snapshot and its restore.
///
/// The restore runs on every exit path of `body`. A `body` error takes
/// precedence over a restore error.
pub async fn isolated<F, Fut, T, E>(chain: &DevChain, body: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<SnapshotError>,
{
    let handle = snapshot(chain).await?;
    let out = body().await;
    let restored = restore(chain, handle).await;
    let value = out?;
    restored?;
    Ok(value)
}
