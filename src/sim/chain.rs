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

//! In-process dev chain speaking the dev-mode JSON-RPC subset, with an
//! elastic token and a geyser deployed at genesis.
//!
//! ## Timing
//! The next block is stamped `latest + pending_increase`; the increase resets
//! once a block is mined. Read-only calls evaluate at that pending timestamp.
//!
//! ## Mining
//! With automine on, every transaction mines its own block. After `miner_stop`
//! transactions queue and land together in the next `evm_mine`.

use crate::chain::contracts::{ContractError, ElasticToken, GeyserContract};
use crate::chain::rpc::{quantity, ChainRpc, RpcError};
use crate::core::types::{
    AccountingTuple, Address, GeyserParams, ScaledAmount, SignedAmount, Stake, TxHash,
    UnlockSchedule,
};
use alloy::primitives::keccak256;
use crate::sim::geyser::GeyserState;
use crate::sim::token::{RebaseEvent, TokenState};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Genesis block timestamp.
pub const GENESIS_TIMESTAMP: u64 = 1_600_000_000;
/// Number of unlocked accounts.
pub const ACCOUNT_COUNT: usize = 10;

/// Queued state transition.
#[derive(Clone, Debug)]
enum Tx {
    Transfer {
        from: Address,
        to: Address,
        amount: ScaledAmount,
    },
    Approve {
        owner: Address,
        spender: Address,
        amount: ScaledAmount,
    },
    Rebase {
        policy: Address,
        epoch: u64,
        delta: SignedAmount,
    },
    LockTokens {
        from: Address,
        amount: ScaledAmount,
        duration_sec: u64,
        start_time: u64,
    },
    Stake {
        from: Address,
        amount: ScaledAmount,
    },
    Unstake {
        from: Address,
        amount: ScaledAmount,
    },
}

#[derive(Clone, Debug)]
struct World {
    block_number: u64,
    block_timestamp: u64,
    pending_increase: u64,
    automine: bool,
    pending: Vec<Tx>,
    tx_count: u64,
    token: TokenState,
    geyser: GeyserState,
}

impl World {
    fn pending_timestamp(&self) -> u64 {
        self.block_timestamp.saturating_add(self.pending_increase)
    }

    fn apply(
        token: &mut TokenState,
        geyser: &mut GeyserState,
        tx: &Tx,
        now: u64,
    ) -> Result<(), String> {
        match tx.clone() {
            Tx::Transfer { from, to, amount } => token.transfer(from, to, amount),
            Tx::Approve {
                owner,
                spender,
                amount,
            } => {
                token.approve(owner, spender, amount);
                Ok(())
            }
            Tx::Rebase {
                policy,
                epoch,
                delta,
            } => token.rebase(policy, epoch, delta).map(|_| ()),
            Tx::LockTokens {
                from,
                amount,
                duration_sec,
                start_time,
            } => geyser.lock_tokens(token, from, amount, duration_sec, start_time, now),
            Tx::Stake { from, amount } => geyser.stake(token, from, amount, now),
            Tx::Unstake { from, amount } => geyser.unstake(token, from, amount, now).map(|_| ()),
        }
    }

    /// Apply `tx` to copies of the contract state, committing only on success.
    fn execute(&mut self, tx: &Tx, now: u64) -> Result<(), String> {
        let mut token = self.token.clone();
        let mut geyser = self.geyser.clone();
        Self::apply(&mut token, &mut geyser, tx, now)?;
        self.token = token;
        self.geyser = geyser;
        Ok(())
    }

    fn mine(&mut self) {
        let ts = self.pending_timestamp();
        self.block_number += 1;
        self.block_timestamp = ts;
        self.pending_increase = 0;
        for tx in std::mem::take(&mut self.pending) {
            if let Err(reason) = self.execute(&tx, ts) {
                warn!(block = self.block_number, ?tx, %reason, "queued transaction reverted");
            }
        }
        debug!(block = self.block_number, timestamp = ts, "block mined");
    }

    fn submit(&mut self, tx: Tx) -> Result<TxHash, String> {
        self.tx_count += 1;
        let hash = keccak256(self.tx_count.to_be_bytes());
        if self.automine {
            let ts = self.pending_timestamp();
            self.execute(&tx, ts)?;
            self.block_number += 1;
            self.block_timestamp = ts;
            self.pending_increase = 0;
        } else {
            self.pending.push(tx);
        }
        Ok(hash)
    }
}

struct Inner {
    world: World,
    snapshots: Vec<(u64, World)>,
    next_snapshot: u64,
}

/// Deterministic in-process chain.
#[derive(Clone)]
pub struct SimChain {
    inner: Arc<Mutex<Inner>>,
    accounts: Arc<Vec<Address>>,
    token_address: Address,
    geyser_address: Address,
}

fn account(i: usize) -> Address {
    let mut b = [0u8; 20];
    b[0] = 0xac;
    b[19] = (i + 1) as u8;
    Address::new(b)
}

fn param_u64(method: &str, params: &Value, idx: usize) -> Result<u64, RpcError> {
    let v = params.get(idx).ok_or_else(|| RpcError::Rpc {
        code: -32602,
        message: format!("{method}: missing param {idx}"),
    })?;
    crate::chain::rpc::parse_quantity(method, v)
}

impl SimChain {
    /// Genesis with `params` for the geyser; `accounts()[0]` owns the supply,
    /// the geyser, and the token's monetary policy, and deploys the token and
    /// the geyser at its nonces 0 and 1.
    pub fn new(params: GeyserParams) -> Self {
        let accounts: Vec<Address> = (0..ACCOUNT_COUNT).map(account).collect();
        let owner = account(0);
        let token_address = owner.create(0);
        let geyser_address = owner.create(1);
        let world = World {
            block_number: 0,
            block_timestamp: GENESIS_TIMESTAMP,
            pending_increase: 0,
            automine: true,
            pending: Vec::new(),
            tx_count: 0,
            token: TokenState::new(owner),
            geyser: GeyserState::new(params, geyser_address, owner, GENESIS_TIMESTAMP),
        };
        Self {
            inner: Arc::new(Mutex::new(Inner {
                world,
                snapshots: Vec::new(),
                next_snapshot: 1,
            })),
            accounts: Arc::new(accounts),
            token_address,
            geyser_address,
        }
    }

    /// Unlocked accounts.
    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// Token deployed at genesis.
    pub fn token(&self) -> SimToken {
        SimToken {
            chain: self.clone(),
        }
    }

    /// Geyser deployed at genesis.
    pub fn geyser(&self) -> SimGeyser {
        SimGeyser {
            chain: self.clone(),
        }
    }

    /// Token address.
    pub fn token_address(&self) -> Address {
        self.token_address
    }

    /// Geyser address (the spender to approve for staking and locking).
    pub fn geyser_address(&self) -> Address {
        self.geyser_address
    }

    /// Rebase events emitted so far.
    pub async fn rebase_events(&self) -> Vec<RebaseEvent> {
        self.inner.lock().await.world.token.rebase_events.clone()
    }

    /// Number of transactions waiting for the next block.
    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.world.pending.len()
    }

    async fn submit(&self, tx: Tx) -> Result<TxHash, ContractError> {
        let mut inner = self.inner.lock().await;
        inner.world.submit(tx).map_err(ContractError::Reverted)
    }

    async fn view<T>(&self, f: impl FnOnce(&World) -> T) -> T {
        let inner = self.inner.lock().await;
        f(&inner.world)
    }

    /// Run `updateAccounting` on a copy of the state at the pending timestamp.
    async fn simulate_accounting(
        &self,
        account: Address,
    ) -> Result<(AccountingTuple, TokenState, GeyserState, u64), ContractError> {
        let inner = self.inner.lock().await;
        let now = inner.world.pending_timestamp();
        let mut token = inner.world.token.clone();
        let mut geyser = inner.world.geyser.clone();
        drop(inner);
        let tuple = geyser
            .update_accounting(&mut token, account, now)
            .map_err(ContractError::Reverted)?;
        Ok((tuple, token, geyser, now))
    }
}

#[async_trait]
impl ChainRpc for SimChain {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut inner = self.inner.lock().await;
        match method {
            "eth_accounts" => Ok(json!(self
                .accounts
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>())),
            "eth_blockNumber" => Ok(json!(quantity(inner.world.block_number))),
            "eth_getBlockByNumber" => Ok(json!({
                "number": quantity(inner.world.block_number),
                "timestamp": quantity(inner.world.block_timestamp),
            })),
            "evm_increaseTime" => {
                let secs = param_u64(method, &params, 0)?;
                let w = &mut inner.world;
                w.pending_increase = w.pending_increase.saturating_add(secs);
                Ok(json!(w.pending_increase))
            }
            "evm_mine" => {
                inner.world.mine();
                Ok(json!("0x0"))
            }
            "miner_stop" => {
                inner.world.automine = false;
                Ok(json!(true))
            }
            "miner_start" => {
                inner.world.automine = true;
                Ok(json!(true))
            }
            "evm_snapshot" => {
                let id = inner.next_snapshot;
                inner.next_snapshot += 1;
                let world = inner.world.clone();
                inner.snapshots.push((id, world));
                Ok(json!(quantity(id)))
            }
            "evm_revert" => {
                let id = param_u64(method, &params, 0)?;
                match inner.snapshots.iter().position(|(sid, _)| *sid == id) {
                    Some(pos) => {
                        let (_, world) = inner.snapshots[pos].clone();
                        inner.world = world;
                        inner.snapshots.truncate(pos);
                        Ok(json!(true))
                    }
                    None => Ok(json!(false)),
                }
            }
            _ => Err(RpcError::Rpc {
                code: -32601,
                message: format!("method {method} not supported"),
            }),
        }
    }
}

/// Elastic token living on a [`SimChain`].
#[derive(Clone)]
pub struct SimToken {
    chain: SimChain,
}

#[async_trait]
impl ElasticToken for SimToken {
    async fn total_supply(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.chain.view(|w| w.token.total_supply()).await)
    }

    async fn balance_of(&self, account: Address) -> Result<ScaledAmount, ContractError> {
        Ok(self.chain.view(|w| w.token.balance_of(account)).await)
    }

    async fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: ScaledAmount,
    ) -> Result<TxHash, ContractError> {
        self.chain.submit(Tx::Transfer { from, to, amount }).await
    }

    async fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: ScaledAmount,
    ) -> Result<TxHash, ContractError> {
        self.chain
            .submit(Tx::Approve {
                owner,
                spender,
                amount,
            })
            .await
    }

    async fn rebase(
        &self,
        policy: Address,
        epoch: u64,
        supply_delta: SignedAmount,
    ) -> Result<TxHash, ContractError> {
        self.chain
            .submit(Tx::Rebase {
                policy,
                epoch,
                delta: supply_delta,
            })
            .await
    }
}

/// Geyser living on a [`SimChain`].
#[derive(Clone)]
pub struct SimGeyser {
    chain: SimChain,
}

#[async_trait]
impl GeyserContract for SimGeyser {
    async fn total_locked(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.chain.view(|w| w.geyser.total_locked(&w.token)).await)
    }

    async fn total_unlocked(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.chain.view(|w| w.geyser.total_unlocked(&w.token)).await)
    }

    async fn total_staked(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.chain.view(|w| w.geyser.total_staked(&w.token)).await)
    }

    async fn total_locked_shares(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.chain.view(|w| w.geyser.total_locked_shares()).await)
    }

    async fn total_staking_shares(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.chain.view(|w| w.geyser.total_staking_shares()).await)
    }

    async fn total_harvested(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.chain.view(|w| w.geyser.total_harvested()).await)
    }

    async fn total_unclaimed_staking_share_seconds(
        &self,
    ) -> Result<ScaledAmount, ContractError> {
        Ok(self
            .chain
            .view(|w| w.geyser.total_unclaimed_staking_share_seconds())
            .await)
    }

    async fn unlock_schedule_count(&self) -> Result<u64, ContractError> {
        Ok(self.chain.view(|w| w.geyser.schedules().len() as u64).await)
    }

    async fn unlock_schedules(&self, index: u64) -> Result<UnlockSchedule, ContractError> {
        self.chain
            .view(|w| w.geyser.schedules().get(index as usize).copied())
            .await
            .ok_or_else(|| {
                ContractError::Reverted("unlock schedule index out of range".to_string())
            })
    }

    async fn total_staked_for(&self, account: Address) -> Result<ScaledAmount, ContractError> {
        Ok(self
            .chain
            .view(|w| w.geyser.total_staked_for(&w.token, account))
            .await)
    }

    async fn get_num_stakes(&self, account: Address) -> Result<u64, ContractError> {
        Ok(self
            .chain
            .view(|w| w.geyser.stakes_of(account).len() as u64)
            .await)
    }

    async fn get_stake(&self, account: Address, index: u64) -> Result<Stake, ContractError> {
        self.chain
            .view(|w| w.geyser.stakes_of(account).get(index as usize).copied())
            .await
            .ok_or_else(|| ContractError::Reverted("stake index out of range".to_string()))
    }

    async fn get_stake_reward_multiplier(
        &self,
        account: Address,
        index: u64,
    ) -> Result<ScaledAmount, ContractError> {
        self.chain
            .view(|w| {
                let now = w.pending_timestamp();
                w.geyser
                    .stakes_of(account)
                    .get(index as usize)
                    .map(|s| w.geyser.reward_multiplier(now.saturating_sub(s.timestamp_sec)))
            })
            .await
            .ok_or_else(|| ContractError::Reverted("stake index out of range".to_string()))
    }

    async fn update_accounting_query(
        &self,
        account: Address,
    ) -> Result<AccountingTuple, ContractError> {
        let (tuple, ..) = self.chain.simulate_accounting(account).await?;
        Ok(tuple)
    }

    async fn harvest_query(&self, account: Address) -> Result<ScaledAmount, ContractError> {
        let (_, token, geyser, now) = self.chain.simulate_accounting(account).await?;
        Ok(geyser.harvestable(&token, account, now))
    }

    async fn claim_rewards_query(&self, account: Address) -> Result<ScaledAmount, ContractError> {
        let (tuple, ..) = self.chain.simulate_accounting(account).await?;
        Ok(tuple.user_rewards)
    }

    async fn lock_tokens(
        &self,
        from: Address,
        amount: ScaledAmount,
        duration_sec: u64,
        start_time: u64,
    ) -> Result<TxHash, ContractError> {
        self.chain
            .submit(Tx::LockTokens {
                from,
                amount,
                duration_sec,
                start_time,
            })
            .await
    }

    async fn stake(&self, from: Address, amount: ScaledAmount) -> Result<TxHash, ContractError> {
        self.chain.submit(Tx::Stake { from, amount }).await
    }

    async fn unstake(&self, from: Address, amount: ScaledAmount) -> Result<TxHash, ContractError> {
        self.chain.submit(Tx::Unstake { from, amount }).await
    }
}
