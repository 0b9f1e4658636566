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

//! Integer-scaled amounts, account identities and the records decoded from
//! the geyser.

use serde::{Deserialize, Serialize};

pub use alloy::primitives::{Address, TxHash, I256, U256};

/// Fixed-point amount in the token's smallest unit (or internal share units).
pub type ScaledAmount = U256;

/// Signed fixed-point amount (rebase supply deltas).
pub type SignedAmount = I256;

/// Decimal places of a percentage value (`10.50` => `1050`).
pub const PERC_DECIMALS: u32 = 2;
/// Decimal places of the elastic-supply token.
pub const AMPL_DECIMALS: u32 = 9;

/// Seconds per hour.
pub const ONE_HOUR: u64 = 3_600;
/// Seconds per day.
pub const ONE_DAY: u64 = 24 * ONE_HOUR;
/// Seconds per (non-leap) year.
pub const ONE_YEAR: u64 = 365 * ONE_DAY;

/// Lift a machine integer into a scaled amount.
pub const fn scaled(v: u64) -> ScaledAmount {
    U256::from_limbs([v, 0, 0, 0])
}

/// Scale whole tokens into the token's smallest unit.
pub const fn ampl(whole_tokens: u64) -> ScaledAmount {
    scaled(whole_tokens * 10u64.pow(AMPL_DECIMALS))
}

/// Convert days into seconds.
pub const fn days_to_seconds(days: u64) -> u64 {
    days * ONE_DAY
}

/// Point-in-time accounting view of one account, decoded from the ordered
/// 8-tuple of `updateAccounting` plus the pool's `totalStaked`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSnapshot {
    /// Tokens still locked in schedules.
    pub total_locked: ScaledAmount,
    /// Tokens unlocked and awaiting distribution.
    pub total_unlocked: ScaledAmount,
    /// Tokens staked across all accounts.
    pub total_staked: ScaledAmount,
    /// Staking share-seconds accrued by the queried account.
    pub staking_share_seconds: ScaledAmount,
    /// Staking share-seconds accrued by all accounts.
    pub total_staking_share_seconds: ScaledAmount,
    /// Rewards attributable to the account before the founder split.
    pub total_user_rewards: ScaledAmount,
    /// Chain timestamp the accounting was evaluated at.
    pub now: u64,
    /// User leg of the split.
    pub user_rewards: ScaledAmount,
    /// Founder leg of the split.
    pub founder_rewards: ScaledAmount,
}

/// Raw `updateAccounting` tuple in contract order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountingTuple {
    /// Element 0.
    pub total_locked: ScaledAmount,
    /// Element 1.
    pub total_unlocked: ScaledAmount,
    /// Element 2.
    pub staking_share_seconds: ScaledAmount,
    /// Element 3.
    pub total_staking_share_seconds: ScaledAmount,
    /// Element 4.
    pub total_user_rewards: ScaledAmount,
    /// Element 5.
    pub now: u64,
    /// Element 6.
    pub user_rewards: ScaledAmount,
    /// Element 7.
    pub founder_rewards: ScaledAmount,
}

impl AccountingTuple {
    /// Attach the pool-wide staked total, producing the named snapshot.
    pub fn into_snapshot(self, total_staked: ScaledAmount) -> RewardSnapshot {
        RewardSnapshot {
            total_locked: self.total_locked,
            total_unlocked: self.total_unlocked,
            total_staked,
            staking_share_seconds: self.staking_share_seconds,
            total_staking_share_seconds: self.total_staking_share_seconds,
            total_user_rewards: self.total_user_rewards,
            now: self.now,
            user_rewards: self.user_rewards,
            founder_rewards: self.founder_rewards,
        }
    }
}

/// Linear unlock schedule as reported by `unlockSchedules(index)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockSchedule {
    /// Shares minted when the tokens were locked.
    pub initial_locked_shares: ScaledAmount,
    /// Shares unlocked so far.
    pub unlocked_shares: ScaledAmount,
    /// Last time shares were unlocked.
    pub last_unlock_timestamp_sec: u64,
    /// Unlock end.
    pub end_at_sec: u64,
    /// Unlock duration.
    pub duration_sec: u64,
    /// Unlock start.
    pub start_time: u64,
}

/// One stake of an account as reported by `getStake(account, index)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    /// Staking shares held by the stake.
    pub staking_shares: ScaledAmount,
    /// Stake creation time.
    pub timestamp_sec: u64,
    /// Last harvest time.
    pub last_harvest_timestamp_sec: u64,
}

/// Geyser construction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeyserParams {
    /// Maximum number of unlock schedules.
    pub max_unlock_schedules: u64,
    /// Reward percentage paid to a stake at time zero (0..=100).
    pub start_bonus: u64,
    /// Seconds until a stake earns the full reward.
    pub bonus_period_sec: u64,
    /// Shares minted per token for the first deposit into an empty pool.
    pub initial_shares_per_token: u64,
    /// Accounting start time.
    pub global_start_time: u64,
    /// Founder cut of rewards, whole percent (0..=100).
    pub founder_percentage: u8,
}

impl GeyserParams {
    /// No time bonus, no founder cut.
    pub const fn default_params() -> Self {
        Self {
            max_unlock_schedules: 10,
            start_bonus: 100,
            bonus_period_sec: 1,
            initial_shares_per_token: 1_000_000,
            global_start_time: 0,
            founder_percentage: 0,
        }
    }

    /// 50% start bonus ramping over one day.
    pub const fn time_bonus_params() -> Self {
        Self {
            start_bonus: 50,
            bonus_period_sec: ONE_DAY,
            ..Self::default_params()
        }
    }

    /// Time bonus plus a 10% founder cut.
    pub const fn founder_rewards_params() -> Self {
        Self {
            founder_percentage: 10,
            ..Self::time_bonus_params()
        }
    }

    /// Production parameters: 33% start bonus over 63 days, 10% founder cut.
    pub const fn badger_params() -> Self {
        Self {
            start_bonus: 33,
            bonus_period_sec: days_to_seconds(63),
            founder_percentage: 10,
            ..Self::default_params()
        }
    }

    /// Percentage of rewards kept by users.
    pub fn user_percentage(&self) -> u8 {
        100u8.saturating_sub(self.founder_percentage)
    }
}

impl Default for GeyserParams {
    fn default() -> Self {
        Self::default_params()
    }
}
