#![allow(missing_docs)]
// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

//! Geyser model: linear unlock schedules, staking share-seconds, time bonus,
//! founder split.

#![forbid(unsafe_code)]

use crate::core::types::{
    AccountingTuple, Address, GeyserParams, ScaledAmount, Stake, UnlockSchedule, U256,
};
use crate::sim::token::TokenState;
use std::collections::BTreeMap;

/// `a * b / c`; zero when `c` is zero, saturating when the product overflows.
pub fn mul_div(a: U256, b: U256, c: U256) -> U256 {
    if c.is_zero() {
        return U256::ZERO;
    }
    a.checked_mul(b).map(|p| p / c).unwrap_or(U256::MAX)
}

fn sum(values: impl IntoIterator<Item = U256>) -> U256 {
    values.into_iter().fold(U256::ZERO, U256::saturating_add)
}

#[derive(Clone, Copy, Debug, Default)]
struct UserTotals {
    staking_shares: U256,
    staking_share_seconds: U256,
    last_accounting_timestamp: u64,
}

#[derive(Clone, Debug)]
pub struct GeyserState {
    pub params: GeyserParams,
    pub address: Address,
    pub owner: Address,
    pub founder: Address,
    pub staking_pool: Address,
    pub unlocked_pool: Address,
    pub locked_pool: Address,
    total_locked_shares: U256,
    total_staking_shares: U256,
    total_staking_share_seconds: U256,
    last_accounting_timestamp: u64,
    total_harvested: ScaledAmount,
    schedules: Vec<UnlockSchedule>,
    users: BTreeMap<Address, UserTotals>,
    stakes: BTreeMap<Address, Vec<Stake>>,
}

impl GeyserState {
    /// Pools are deployed by the geyser at creation nonces 1..=3.
    pub fn new(params: GeyserParams, address: Address, owner: Address, now: u64) -> Self {
        Self {
            params,
            address,
            owner,
            founder: owner,
            staking_pool: address.create(1),
            unlocked_pool: address.create(2),
            locked_pool: address.create(3),
            total_locked_shares: U256::ZERO,
            total_staking_shares: U256::ZERO,
            total_staking_share_seconds: U256::ZERO,
            last_accounting_timestamp: now.max(params.global_start_time),
            total_harvested: U256::ZERO,
            schedules: Vec::new(),
            users: BTreeMap::new(),
            stakes: BTreeMap::new(),
        }
    }

    pub fn total_locked(&self, token: &TokenState) -> ScaledAmount {
        token.balance_of(self.locked_pool)
    }

    pub fn total_unlocked(&self, token: &TokenState) -> ScaledAmount {
        token.balance_of(self.unlocked_pool)
    }

    pub fn total_staked(&self, token: &TokenState) -> ScaledAmount {
        token.balance_of(self.staking_pool)
    }

    pub fn total_locked_shares(&self) -> U256 {
        self.total_locked_shares
    }

    pub fn total_staking_shares(&self) -> U256 {
        self.total_staking_shares
    }

    pub fn total_unclaimed_staking_share_seconds(&self) -> U256 {
        self.total_staking_share_seconds
    }

    pub fn total_harvested(&self) -> ScaledAmount {
        self.total_harvested
    }

    pub fn schedules(&self) -> &[UnlockSchedule] {
        &self.schedules
    }

    pub fn stakes_of(&self, account: Address) -> &[Stake] {
        self.stakes.get(&account).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_staked_for(&self, token: &TokenState, account: Address) -> ScaledAmount {
        let shares = self
            .users
            .get(&account)
            .map(|u| u.staking_shares)
            .unwrap_or_default();
        mul_div(self.total_staked(token), shares, self.total_staking_shares)
    }

    /// Bonus percentage (`start_bonus..=100`) earned after `stake_time` seconds.
    pub fn reward_multiplier(&self, stake_time: u64) -> U256 {
        let p = &self.params;
        if p.bonus_period_sec == 0 || stake_time >= p.bonus_period_sec {
            return U256::from(100u8);
        }
        let start = p.start_bonus.min(100);
        let ramp =
            U256::from(100 - start) * U256::from(stake_time) / U256::from(p.bonus_period_sec);
        U256::from(start) + ramp
    }

    fn split(&self, total: ScaledAmount) -> (ScaledAmount, ScaledAmount) {
        let pct = U256::from(self.params.founder_percentage.min(100));
        let founder = mul_div(total, pct, U256::from(100u8));
        (total - founder, founder)
    }

    fn unlock_schedule_shares(s: &mut UnlockSchedule, now: u64) -> U256 {
        if s.unlocked_shares >= s.initial_locked_shares {
            return U256::ZERO;
        }
        let shares = if now >= s.end_at_sec {
            s.last_unlock_timestamp_sec = s.end_at_sec;
            s.initial_locked_shares - s.unlocked_shares
        } else {
            let elapsed = now.saturating_sub(s.last_unlock_timestamp_sec);
            s.last_unlock_timestamp_sec = s.last_unlock_timestamp_sec.max(now);
            mul_div(
                U256::from(elapsed),
                s.initial_locked_shares,
                U256::from(s.duration_sec.max(1)),
            )
            .min(s.initial_locked_shares - s.unlocked_shares)
        };
        s.unlocked_shares += shares;
        shares
    }

    fn unlock_tokens(
        &mut self,
        token: &mut TokenState,
        now: u64,
    ) -> Result<ScaledAmount, String> {
        let unlocked_shares = sum(
            self.schedules
                .iter_mut()
                .map(|s| Self::unlock_schedule_shares(s, now)),
        );
        let unlocked_tokens = mul_div(
            unlocked_shares,
            self.total_locked(token),
            self.total_locked_shares,
        );
        if !unlocked_tokens.is_zero() {
            token.transfer(self.locked_pool, self.unlocked_pool, unlocked_tokens)?;
        }
        self.total_locked_shares -= unlocked_shares.min(self.total_locked_shares);
        Ok(unlocked_tokens)
    }

    /// Unlock due tokens, accrue share-seconds to `now`, and report `account`'s
    /// rewards.
    pub fn update_accounting(
        &mut self,
        token: &mut TokenState,
        account: Address,
        now: u64,
    ) -> Result<AccountingTuple, String> {
        self.unlock_tokens(token, now)?;

        let elapsed = now.saturating_sub(self.last_accounting_timestamp);
        self.total_staking_share_seconds = self
            .total_staking_share_seconds
            .saturating_add(U256::from(elapsed).saturating_mul(self.total_staking_shares));
        self.last_accounting_timestamp = self.last_accounting_timestamp.max(now);

        let user = self.users.entry(account).or_default();
        let user_elapsed = now.saturating_sub(user.last_accounting_timestamp);
        user.staking_share_seconds = user
            .staking_share_seconds
            .saturating_add(U256::from(user_elapsed).saturating_mul(user.staking_shares));
        user.last_accounting_timestamp = user.last_accounting_timestamp.max(now);
        let user_sss = user.staking_share_seconds;

        let total_unlocked = self.total_unlocked(token);
        let total_user_rewards =
            mul_div(total_unlocked, user_sss, self.total_staking_share_seconds);
        let (user_rewards, founder_rewards) = self.split(total_user_rewards);

        Ok(AccountingTuple {
            total_locked: self.total_locked(token),
            total_unlocked,
            staking_share_seconds: user_sss,
            total_staking_share_seconds: self.total_staking_share_seconds,
            total_user_rewards,
            now,
            user_rewards,
            founder_rewards,
        })
    }

    pub fn lock_tokens(
        &mut self,
        token: &mut TokenState,
        from: Address,
        amount: ScaledAmount,
        duration_sec: u64,
        start_time: u64,
        now: u64,
    ) -> Result<(), String> {
        if from != self.owner {
            return Err("caller is not the owner".to_string());
        }
        if self.schedules.len() as u64 >= self.params.max_unlock_schedules {
            return Err("reached maximum unlock schedules".to_string());
        }
        self.update_accounting(token, from, now)?;

        let locked = self.total_locked(token);
        let minted = if locked.is_zero() {
            amount.saturating_mul(U256::from(self.params.initial_shares_per_token))
        } else {
            mul_div(self.total_locked_shares, amount, locked)
        };
        let end = start_time.saturating_add(duration_sec);
        self.schedules.push(UnlockSchedule {
            initial_locked_shares: minted,
            unlocked_shares: U256::ZERO,
            last_unlock_timestamp_sec: start_time,
            end_at_sec: end,
            duration_sec,
            start_time,
        });
        self.total_locked_shares = self.total_locked_shares.saturating_add(minted);
        token.transfer_from(self.address, from, self.locked_pool, amount)
    }

    pub fn stake(
        &mut self,
        token: &mut TokenState,
        from: Address,
        amount: ScaledAmount,
        now: u64,
    ) -> Result<(), String> {
        if amount.is_zero() {
            return Err("stake amount is zero".to_string());
        }
        let staked = self.total_staked(token);
        let minted = if self.total_staking_shares.is_zero() {
            amount.saturating_mul(U256::from(self.params.initial_shares_per_token))
        } else {
            mul_div(self.total_staking_shares, amount, staked)
        };
        if minted.is_zero() {
            return Err("stake amount is too small".to_string());
        }
        self.update_accounting(token, from, now)?;

        let user = self.users.entry(from).or_default();
        user.staking_shares = user.staking_shares.saturating_add(minted);
        user.last_accounting_timestamp = now;
        self.stakes.entry(from).or_default().push(Stake {
            staking_shares: minted,
            timestamp_sec: now,
            last_harvest_timestamp_sec: now,
        });
        self.total_staking_shares = self.total_staking_shares.saturating_add(minted);
        token.transfer_from(self.address, from, self.staking_pool, amount)
    }

    fn bonused_reward(&self, total_unlocked: U256, share_seconds: U256, stake_time: u64) -> U256 {
        let reward = mul_div(total_unlocked, share_seconds, self.total_staking_share_seconds);
        mul_div(reward, self.reward_multiplier(stake_time), U256::from(100u8))
    }

    /// Burn stakes newest-first for `amount` and pay the bonused rewards out.
    pub fn unstake(
        &mut self,
        token: &mut TokenState,
        from: Address,
        amount: ScaledAmount,
        now: u64,
    ) -> Result<ScaledAmount, String> {
        self.update_accounting(token, from, now)?;
        if amount.is_zero() {
            return Err("unstake amount is zero".to_string());
        }
        if self.total_staked_for(token, from) < amount {
            return Err("unstake amount is greater than total user stakes".to_string());
        }
        let to_burn = mul_div(self.total_staking_shares, amount, self.total_staked(token));
        if to_burn.is_zero() {
            return Err("unable to unstake amount this small".to_string());
        }

        let total_unlocked = self.total_unlocked(token);
        let mut stakes = self.stakes.remove(&from).unwrap_or_default();
        let mut shares_left = to_burn;
        let mut sss_burned = U256::ZERO;
        let mut rewards = U256::ZERO;
        while !shares_left.is_zero() {
            let Some(last) = stakes.last_mut() else {
                break;
            };
            let stake_time = now.saturating_sub(last.timestamp_sec);
            let burn = last.staking_shares.min(shares_left);
            let sss = burn.saturating_mul(U256::from(stake_time));
            rewards = rewards.saturating_add(self.bonused_reward(total_unlocked, sss, stake_time));
            sss_burned = sss_burned.saturating_add(sss);
            shares_left -= burn;
            if burn == last.staking_shares {
                stakes.pop();
            } else {
                last.staking_shares -= burn;
            }
        }
        self.stakes.insert(from, stakes);

        let user = self.users.entry(from).or_default();
        user.staking_share_seconds = user.staking_share_seconds.saturating_sub(sss_burned);
        user.staking_shares = user.staking_shares.saturating_sub(to_burn);
        self.total_staking_share_seconds =
            self.total_staking_share_seconds.saturating_sub(sss_burned);
        self.total_staking_shares = self.total_staking_shares.saturating_sub(to_burn);

        token.transfer(self.staking_pool, from, amount)?;
        let (user_rewards, founder_rewards) = self.split(rewards);
        if !user_rewards.is_zero() {
            token.transfer(self.unlocked_pool, from, user_rewards)?;
        }
        if !founder_rewards.is_zero() {
            token.transfer(self.unlocked_pool, self.founder, founder_rewards)?;
        }
        self.total_harvested = self.total_harvested.saturating_add(rewards);
        Ok(user_rewards)
    }

    /// User leg of the bonused rewards accrued by every stake of `account`
    /// since its last harvest.
    pub fn harvestable(&self, token: &TokenState, account: Address, now: u64) -> ScaledAmount {
        if self.total_staking_share_seconds.is_zero() {
            return U256::ZERO;
        }
        let total_unlocked = self.total_unlocked(token);
        let rewards = sum(self.stakes_of(account).iter().map(|s| {
            let since_harvest = now.saturating_sub(s.last_harvest_timestamp_sec);
            let sss = s.staking_shares.saturating_mul(U256::from(since_harvest));
            self.bonused_reward(total_unlocked, sss, now.saturating_sub(s.timestamp_sec))
        }));
        self.split(rewards).0
    }
}
