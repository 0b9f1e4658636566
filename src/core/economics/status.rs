#![allow(missing_docs)]
// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

//! Human-readable geyser status built from read-only queries.

#![forbid(unsafe_code)]

use crate::chain::contracts::{ContractError, GeyserContract};
use crate::core::economics::tolerance::{check_within_tolerance, ToleranceError};
use crate::core::types::{Address, RewardSnapshot, ScaledAmount, Stake, UnlockSchedule};
use serde::Serialize;
use std::fmt;

/// Pool-wide totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GlobalStatus {
    pub total_locked: ScaledAmount,
    pub total_unlocked: ScaledAmount,
    pub total_staked: ScaledAmount,
    pub total_locked_shares: ScaledAmount,
    pub total_staking_shares: ScaledAmount,
    pub total_harvested: ScaledAmount,
    pub total_unclaimed_staking_share_seconds: ScaledAmount,
    pub unlock_schedule_count: u64,
}

/// A stake and its current reward multiplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StakeStatus {
    pub stake: Stake,
    pub reward_multiplier: ScaledAmount,
}

/// Per-account view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountStatus {
    pub account: Address,
    pub total_staked_for: ScaledAmount,
    pub stakes: Vec<StakeStatus>,
    pub accounting: RewardSnapshot,
}

/// Full report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeyserStatus {
    pub global: GlobalStatus,
    pub schedules: Vec<UnlockSchedule>,
    pub accounts: Vec<AccountStatus>,
}

/// Gather global state, every unlock schedule and every stake of `accounts`.
pub async fn collect_status(
    geyser: &dyn GeyserContract,
    accounts: &[Address],
) -> Result<GeyserStatus, ContractError> {
    let global = GlobalStatus {
        total_locked: geyser.total_locked().await?,
        total_unlocked: geyser.total_unlocked().await?,
        total_staked: geyser.total_staked().await?,
        total_locked_shares: geyser.total_locked_shares().await?,
        total_staking_shares: geyser.total_staking_shares().await?,
        total_harvested: geyser.total_harvested().await?,
        total_unclaimed_staking_share_seconds: geyser
            .total_unclaimed_staking_share_seconds()
            .await?,
        unlock_schedule_count: geyser.unlock_schedule_count().await?,
    };

    let mut schedules = Vec::with_capacity(global.unlock_schedule_count as usize);
    for i in 0..global.unlock_schedule_count {
        schedules.push(geyser.unlock_schedules(i).await?);
    }

    let mut out = Vec::with_capacity(accounts.len());
    for &account in accounts {
        let accounting = geyser
            .update_accounting_query(account)
            .await?
            .into_snapshot(global.total_staked);
        let total_staked_for = geyser.total_staked_for(account).await?;
        let n = geyser.get_num_stakes(account).await?;
        let mut stakes = Vec::with_capacity(n as usize);
        for i in 0..n {
            stakes.push(StakeStatus {
                stake: geyser.get_stake(account, i).await?,
                reward_multiplier: geyser.get_stake_reward_multiplier(account, i).await?,
            });
        }
        out.push(AccountStatus {
            account,
            total_staked_for,
            stakes,
            accounting,
        });
    }

    Ok(GeyserStatus {
        global,
        schedules,
        accounts: out,
    })
}

impl GeyserStatus {
    /// Shares still locked across every schedule.
    pub fn outstanding_schedule_shares(&self) -> ScaledAmount {
        self.schedules
            .iter()
            .map(|s| s.initial_locked_shares.saturating_sub(s.unlocked_shares))
            .fold(ScaledAmount::ZERO, ScaledAmount::saturating_add)
    }

    /// `totalLockedShares` must match the shares outstanding in the schedules.
    pub fn check_locked_shares(&self, delta: ScaledAmount) -> Result<(), ToleranceError> {
        check_within_tolerance(
            self.global.total_locked_shares,
            self.outstanding_schedule_shares(),
            delta,
            Some("totalLockedShares"),
        )
    }
}

impl fmt::Display for GeyserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.global;
        writeln!(f, "Global State:")?;
        writeln!(f, "  totalLocked: {}", g.total_locked)?;
        writeln!(f, "  totalUnlocked: {}", g.total_unlocked)?;
        writeln!(f, "  totalStaked: {}", g.total_staked)?;
        writeln!(f, "  totalLockedShares: {}", g.total_locked_shares)?;
        writeln!(f, "  totalStakingShares: {}", g.total_staking_shares)?;
        writeln!(f, "  totalHarvested: {}", g.total_harvested)?;
        writeln!(f, "  unlockScheduleCount: {}", g.unlock_schedule_count)?;
        writeln!(
            f,
            "  totalUnclaimedStakingShareSeconds: {}",
            g.total_unclaimed_staking_share_seconds
        )?;

        for (i, s) in self.schedules.iter().enumerate() {
            writeln!(f, "Unlock Schedule {i}:")?;
            writeln!(f, "  initialLockedShares: {}", s.initial_locked_shares)?;
            writeln!(f, "  unlockedShares: {}", s.unlocked_shares)?;
            writeln!(f, "  lastUnlockTimestampSec: {}", s.last_unlock_timestamp_sec)?;
            writeln!(f, "  endAtSec: {}", s.end_at_sec)?;
            writeln!(f, "  durationSec: {}", s.duration_sec)?;
            writeln!(f, "  startTime: {}", s.start_time)?;
        }

        for a in &self.accounts {
            writeln!(f, "Account {}:", a.account)?;
            writeln!(f, "  totalStakedFor: {}", a.total_staked_for)?;
            writeln!(f, "  totalRewards: {}", a.accounting.total_user_rewards)?;
            writeln!(f, "  userRewards: {}", a.accounting.user_rewards)?;
            writeln!(f, "  founderRewards: {}", a.accounting.founder_rewards)?;
            for (i, s) in a.stakes.iter().enumerate() {
                writeln!(f, "  Stake {i}:")?;
                writeln!(f, "    stakingShares: {}", s.stake.staking_shares)?;
                writeln!(f, "    timestampSec: {}", s.stake.timestamp_sec)?;
                writeln!(
                    f,
                    "    lastHarvestTimestampSec: {}",
                    s.stake.last_harvest_timestamp_sec
                )?;
                writeln!(f, "    rewardMultiplier: {}", s.reward_multiplier)?;
            }
        }
        Ok(())
    }
}
