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

//! Contract surfaces consumed by the harness and their JSON-RPC bindings.

use crate::chain::abi::{
    accounting_tuple, decode_stake, decode_unlock_schedule, to_u64, AbiError, IElasticToken,
    IGeyser,
};
use crate::chain::rpc::{DevChain, RpcError};
use crate::core::types::{
    AccountingTuple, Address, ScaledAmount, SignedAmount, Stake, TxHash, UnlockSchedule, U256,
};
use alloy::primitives::Bytes;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a contract call. Propagated unchanged to the caller.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Transport failure.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// Call or transaction reverted.
    #[error("reverted: {0}")]
    Reverted(String),
    /// Return data could not be decoded.
    #[error("decode: {0}")]
    Decode(#[from] AbiError),
}

impl ContractError {
    fn from_rpc(e: RpcError) -> Self {
        match e {
            RpcError::Rpc { message, .. } if message.contains("revert") => {
                ContractError::Reverted(message)
            }
            other => ContractError::Rpc(other),
        }
    }
}

/// One deployed contract reached through a [`DevChain`].
#[derive(Clone)]
struct Bound {
    chain: DevChain,
    address: Address,
}

impl Bound {
    /// `eth_call` on behalf of `from`, decoding the typed return.
    async fn call<C: SolCall + Send + Sync>(
        &self,
        from: Address,
        call: C,
    ) -> Result<C::Return, ContractError> {
        let data = self
            .chain
            .call(from, self.address, &call.abi_encode())
            .await
            .map_err(ContractError::from_rpc)?;
        C::abi_decode_returns(&data, true).map_err(|e| ContractError::Decode(e.into()))
    }

    /// Read-only view; the caller does not matter.
    async fn view<C: SolCall + Send + Sync>(&self, call: C) -> Result<C::Return, ContractError> {
        self.call(Address::ZERO, call).await
    }

    async fn send<C: SolCall + Send + Sync>(
        &self,
        from: Address,
        call: C,
    ) -> Result<TxHash, ContractError> {
        self.chain
            .send_transaction(from, self.address, &call.abi_encode())
            .await
            .map_err(ContractError::from_rpc)
    }
}

/// Staking / reward-accounting contract under test.
#[async_trait]
pub trait GeyserContract: Send + Sync {
    /// Tokens in the locked pool.
    async fn total_locked(&self) -> Result<ScaledAmount, ContractError>;
    /// Tokens in the unlocked pool.
    async fn total_unlocked(&self) -> Result<ScaledAmount, ContractError>;
    /// Tokens in the staking pool.
    async fn total_staked(&self) -> Result<ScaledAmount, ContractError>;
    /// Outstanding locked shares.
    async fn total_locked_shares(&self) -> Result<ScaledAmount, ContractError>;
    /// Outstanding staking shares.
    async fn total_staking_shares(&self) -> Result<ScaledAmount, ContractError>;
    /// Tokens paid out so far.
    async fn total_harvested(&self) -> Result<ScaledAmount, ContractError>;
    /// Share-seconds not yet claimed.
    async fn total_unclaimed_staking_share_seconds(&self)
        -> Result<ScaledAmount, ContractError>;
    /// Number of unlock schedules.
    async fn unlock_schedule_count(&self) -> Result<u64, ContractError>;
    /// Unlock schedule at `index`.
    async fn unlock_schedules(&self, index: u64) -> Result<UnlockSchedule, ContractError>;
    /// Tokens staked by `account`.
    async fn total_staked_for(&self, account: Address) -> Result<ScaledAmount, ContractError>;
    /// Number of stakes held by `account`.
    async fn get_num_stakes(&self, account: Address) -> Result<u64, ContractError>;
    /// Stake `index` of `account`.
    async fn get_stake(&self, account: Address, index: u64) -> Result<Stake, ContractError>;
    /// Reward multiplier of stake `index` of `account`.
    async fn get_stake_reward_multiplier(
        &self,
        account: Address,
        index: u64,
    ) -> Result<ScaledAmount, ContractError>;
    /// `updateAccounting` evaluated as a simulated call on behalf of `account`.
    async fn update_accounting_query(
        &self,
        account: Address,
    ) -> Result<AccountingTuple, ContractError>;
    /// First element of `harvestQuery` for `account`.
    async fn harvest_query(&self, account: Address) -> Result<ScaledAmount, ContractError>;
    /// First element of `claimRewardsQuery` for `account`.
    async fn claim_rewards_query(&self, account: Address) -> Result<ScaledAmount, ContractError>;

    /// Lock `amount` for `duration_sec` starting at `start_time`.
    async fn lock_tokens(
        &self,
        from: Address,
        amount: ScaledAmount,
        duration_sec: u64,
        start_time: u64,
    ) -> Result<TxHash, ContractError>;
    /// Stake `amount` from `from`.
    async fn stake(&self, from: Address, amount: ScaledAmount) -> Result<TxHash, ContractError>;
    /// Unstake `amount` for `from`, paying out rewards.
    async fn unstake(&self, from: Address, amount: ScaledAmount) -> Result<TxHash, ContractError>;
}

/// Elastic-supply token.
#[async_trait]
pub trait ElasticToken: Send + Sync {
    /// Current total supply.
    async fn total_supply(&self) -> Result<ScaledAmount, ContractError>;
    /// Balance of `account`.
    async fn balance_of(&self, account: Address) -> Result<ScaledAmount, ContractError>;
    /// Transfer `amount` from `from` to `to`.
    async fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: ScaledAmount,
    ) -> Result<TxHash, ContractError>;
    /// Approve `spender` for `amount` on behalf of `owner`.
    async fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: ScaledAmount,
    ) -> Result<TxHash, ContractError>;
    /// Change the supply by `supply_delta`; callable by the monetary policy only.
    async fn rebase(
        &self,
        policy: Address,
        epoch: u64,
        supply_delta: SignedAmount,
    ) -> Result<TxHash, ContractError>;
}

/// Geyser bound to a deployed address over JSON-RPC.
#[derive(Clone)]
pub struct RpcGeyser {
    inner: Bound,
}

impl RpcGeyser {
    /// Bind to `address`.
    pub fn new(chain: DevChain, address: Address) -> Self {
        Self {
            inner: Bound { chain, address },
        }
    }
}

#[async_trait]
impl GeyserContract for RpcGeyser {
    async fn total_locked(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.inner.view(IGeyser::totalLockedCall {}).await?._0)
    }

    async fn total_unlocked(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.inner.view(IGeyser::totalUnlockedCall {}).await?._0)
    }

    async fn total_staked(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.inner.view(IGeyser::totalStakedCall {}).await?._0)
    }

    async fn total_locked_shares(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.inner.view(IGeyser::totalLockedSharesCall {}).await?._0)
    }

    async fn total_staking_shares(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.inner.view(IGeyser::totalStakingSharesCall {}).await?._0)
    }

    async fn total_harvested(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.inner.view(IGeyser::totalHarvestedCall {}).await?._0)
    }

    async fn total_unclaimed_staking_share_seconds(
        &self,
    ) -> Result<ScaledAmount, ContractError> {
        let r = self
            .inner
            .view(IGeyser::totalUnclaimedStakingShareSecondsCall {})
            .await?;
        Ok(r._0)
    }

    async fn unlock_schedule_count(&self) -> Result<u64, ContractError> {
        let r = self.inner.view(IGeyser::unlockScheduleCountCall {}).await?;
        Ok(to_u64(r._0, "unlockScheduleCount")?)
    }

    async fn unlock_schedules(&self, index: u64) -> Result<UnlockSchedule, ContractError> {
        let r = self
            .inner
            .view(IGeyser::unlockSchedulesCall {
                index: U256::from(index),
            })
            .await?;
        Ok(decode_unlock_schedule(r)?)
    }

    async fn total_staked_for(&self, account: Address) -> Result<ScaledAmount, ContractError> {
        let r = self
            .inner
            .view(IGeyser::totalStakedForCall { addr: account })
            .await?;
        Ok(r._0)
    }

    async fn get_num_stakes(&self, account: Address) -> Result<u64, ContractError> {
        let r = self
            .inner
            .view(IGeyser::getNumStakesCall { user: account })
            .await?;
        Ok(to_u64(r._0, "getNumStakes")?)
    }

    async fn get_stake(&self, account: Address, index: u64) -> Result<Stake, ContractError> {
        let r = self
            .inner
            .view(IGeyser::getStakeCall {
                user: account,
                index: U256::from(index),
            })
            .await?;
        Ok(decode_stake(r)?)
    }

    async fn get_stake_reward_multiplier(
        &self,
        account: Address,
        index: u64,
    ) -> Result<ScaledAmount, ContractError> {
        let r = self
            .inner
            .view(IGeyser::getStakeRewardMultiplierCall {
                user: account,
                index: U256::from(index),
            })
            .await?;
        Ok(r._0)
    }

    async fn update_accounting_query(
        &self,
        account: Address,
    ) -> Result<AccountingTuple, ContractError> {
        let r = self
            .inner
            .call(account, IGeyser::updateAccountingCall {})
            .await?;
        Ok(accounting_tuple(r)?)
    }

    async fn harvest_query(&self, account: Address) -> Result<ScaledAmount, ContractError> {
        let r = self.inner.call(account, IGeyser::harvestQueryCall {}).await?;
        Ok(r.rewards)
    }

    async fn claim_rewards_query(&self, account: Address) -> Result<ScaledAmount, ContractError> {
        let r = self
            .inner
            .call(account, IGeyser::claimRewardsQueryCall {})
            .await?;
        Ok(r.rewards)
    }

    async fn lock_tokens(
        &self,
        from: Address,
        amount: ScaledAmount,
        duration_sec: u64,
        start_time: u64,
    ) -> Result<TxHash, ContractError> {
        let call = IGeyser::lockTokensCall {
            amount,
            durationSec: U256::from(duration_sec),
            startTime: U256::from(start_time),
        };
        self.inner.send(from, call).await
    }

    async fn stake(&self, from: Address, amount: ScaledAmount) -> Result<TxHash, ContractError> {
        let call = IGeyser::stakeCall {
            amount,
            data: Bytes::new(),
        };
        self.inner.send(from, call).await
    }

    async fn unstake(&self, from: Address, amount: ScaledAmount) -> Result<TxHash, ContractError> {
        let call = IGeyser::unstakeCall {
            amount,
            data: Bytes::new(),
        };
        self.inner.send(from, call).await
    }
}

/// Elastic-supply token bound to a deployed address over JSON-RPC.
#[derive(Clone)]
pub struct RpcToken {
    inner: Bound,
}

impl RpcToken {
    /// Bind to `address`.
    pub fn new(chain: DevChain, address: Address) -> Self {
        Self {
            inner: Bound { chain, address },
        }
    }
}

#[async_trait]
impl ElasticToken for RpcToken {
    async fn total_supply(&self) -> Result<ScaledAmount, ContractError> {
        Ok(self.inner.view(IElasticToken::totalSupplyCall {}).await?._0)
    }

    async fn balance_of(&self, account: Address) -> Result<ScaledAmount, ContractError> {
        let r = self
            .inner
            .view(IElasticToken::balanceOfCall { who: account })
            .await?;
        Ok(r._0)
    }

    async fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: ScaledAmount,
    ) -> Result<TxHash, ContractError> {
        let call = IElasticToken::transferCall { to, value: amount };
        self.inner.send(from, call).await
    }

    async fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: ScaledAmount,
    ) -> Result<TxHash, ContractError> {
        let call = IElasticToken::approveCall {
            spender,
            value: amount,
        };
        self.inner.send(owner, call).await
    }

    async fn rebase(
        &self,
        policy: Address,
        epoch: u64,
        supply_delta: SignedAmount,
    ) -> Result<TxHash, ContractError> {
        let call = IElasticToken::rebaseCall {
            epoch: U256::from(epoch),
            supplyDelta: supply_delta,
        };
        self.inner.send(policy, call).await
    }
}
