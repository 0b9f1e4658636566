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

//! Crate-level error aggregating every harness failure class.

use crate::bridge::flow::FlowError;
use crate::chain::clock::ClockError;
use crate::chain::contracts::ContractError;
use crate::chain::rpc::RpcError;
use crate::chain::snapshot::SnapshotError;
use crate::config::ConfigError;
use crate::core::economics::rebase::{RebaseError, RebaseInvokeError};
use crate::core::economics::rewards::OracleError;
use crate::core::economics::tolerance::ToleranceError;
use thiserror::Error;

/// Any harness failure. Surfaced to the calling test unchanged.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Transport failure.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// External contract call failed or reverted.
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// Time-travel violation or clock misuse.
    #[error(transparent)]
    Clock(#[from] ClockError),
    /// Snapshot or restore rejected.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// Value outside its tolerance band.
    #[error(transparent)]
    Tolerance(#[from] ToleranceError),
    /// Rebase arithmetic failure.
    #[error(transparent)]
    Rebase(#[from] RebaseError),
    /// Reward oracle failure.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// Bridge flow failure.
    #[error(transparent)]
    Flow(#[from] FlowError),
    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<RebaseInvokeError> for HarnessError {
    fn from(e: RebaseInvokeError) -> Self {
        match e {
            RebaseInvokeError::Rebase(r) => HarnessError::Rebase(r),
            RebaseInvokeError::Contract(c) => HarnessError::Contract(c),
        }
    }
}

/// Result alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
