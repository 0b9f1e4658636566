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
#![deny(missing_docs)]

//! Deterministic time control for a simulated chain.
//!
//! The clock keeps its own `current_time` and pins the chain's next block to it.
//! A pin applies to the next mined block only; callers must not submit
//! transactions concurrently with an advance.
//!
//! `evm_increaseTime` accumulates on the node until a block is mined, so the
//! clock remembers the target it already requested for the pending block and
//! only asks for the remainder.

use crate::chain::contracts::{ContractError, GeyserContract};
use crate::chain::rpc::{DevChain, RpcError};
use crate::core::types::{Address, ScaledAmount, TxHash};
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info};

/// Clock errors.
#[derive(Debug, Error)]
pub enum ClockError {
    /// `advance_time` or `current_time` before `initialize`.
    #[error("clock not initialized")]
    Uninitialized,
    /// Requested target precedes the chain's current time.
    #[error("invalid time travel: cannot move chain time from {now} back to {target}")]
    TimeTravel {
        /// Chain's latest block time.
        now: u64,
        /// Requested time.
        target: u64,
    },
    /// `current_time + seconds` does not fit in a timestamp.
    #[error("timestamp overflow")]
    Overflow,
    /// Transport failure.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// Contract call failure in a clock helper.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Target requested for the block after `block`.
#[derive(Clone, Copy, Debug)]
struct Pin {
    block: u64,
    target: u64,
}

/// Simulated clock bound to one chain.
pub struct SimulatedClock {
    chain: DevChain,
    current_time: Option<u64>,
    pinned: Option<Pin>,
}

impl SimulatedClock {
    /// Create an uninitialized clock.
    pub fn new(chain: DevChain) -> Self {
        Self {
            chain,
            current_time: None,
            pinned: None,
        }
    }

    /// Record the chain's latest block time as `current_time`.
    pub async fn initialize(&mut self) -> Result<u64, ClockError> {
        let now = self.chain.latest_timestamp().await?;
        self.current_time = Some(now);
        self.pinned = None;
        debug!(current_time = now, "clock initialized");
        Ok(now)
    }

    /// Current clock time.
    pub fn current_time(&self) -> Result<u64, ClockError> {
        self.current_time.ok_or(ClockError::Uninitialized)
    }

    /// Move `current_time` forward by `seconds` and pin the next block to it.
    pub async fn advance_time(&mut self, seconds: u64) -> Result<u64, ClockError> {
        let next = self
            .current_time()?
            .checked_add(seconds)
            .ok_or(ClockError::Overflow)?;
        self.pin_next_transaction_time(next).await?;
        self.current_time = Some(next);
        info!(seconds, current_time = next, "clock advanced");
        Ok(next)
    }

    /// Time the next mined block would carry: the outstanding pin if the chain
    /// has not mined since it was requested, else the latest block time.
    async fn pending_floor(&self) -> Result<(u64, u64), ClockError> {
        let latest = self.chain.latest_block().await?;
        let floor = match self.pinned {
            Some(pin) if pin.block == latest.number => pin.target,
            _ => latest.timestamp,
        };
        Ok((latest.number, floor))
    }

    /// Make the next mined block carry `target` as its timestamp.
    pub async fn pin_next_transaction_time(&mut self, target: u64) -> Result<(), ClockError> {
        let (block, floor) = self.pending_floor().await?;
        if target < floor {
            return Err(ClockError::TimeTravel { now: floor, target });
        }
        if target > floor {
            self.chain.increase_time(target - floor).await?;
        }
        self.pinned = Some(Pin { block, target });
        Ok(())
    }

    /// Mine one block with no transactions.
    pub async fn execute_empty_block(&self) -> Result<(), ClockError> {
        self.chain.mine().await?;
        Ok(())
    }

    /// Run `actions` with block production paused, then mine exactly one block.
    ///
    /// Block production is resumed and the block is mined even when `actions`
    /// fails; the action error takes precedence over any resume error.
    pub async fn execute_as_block<F, Fut, T, E>(&self, actions: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<ClockError>,
    {
        self.chain.miner_stop().await.map_err(ClockError::from)?;
        let out = actions().await;
        let resumed = self.resume_and_mine().await;
        let value = out?;
        resumed?;
        Ok(value)
    }

    async fn resume_and_mine(&self) -> Result<(), ClockError> {
        self.chain.miner_start().await?;
        self.chain.mine().await?;
        Ok(())
    }

    /// Lock `amount` in `geyser` with the schedule starting at the chain's latest
    /// time, or at the already pinned time of the pending block.
    pub async fn lock_tokens_at_latest_time(
        &mut self,
        geyser: &dyn GeyserContract,
        from: Address,
        amount: ScaledAmount,
        duration_sec: u64,
    ) -> Result<TxHash, ClockError> {
        let (_, now) = self.pending_floor().await?;
        self.pin_next_transaction_time(now).await?;
        let tx = geyser.lock_tokens(from, amount, duration_sec, now).await?;
        debug!(%amount, duration_sec, start = now, %tx, "tokens locked");
        Ok(tx)
    }
}
