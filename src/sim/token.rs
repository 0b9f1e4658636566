#![allow(missing_docs)]
// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

//! Gons-based elastic-supply token state.
//!
//! Balances are held in gons; `gons_per_fragment = total_gons() / total_supply`,
//! so a rebase scales every balance proportionally.

#![forbid(unsafe_code)]

use crate::core::types::{ampl, Address, ScaledAmount, SignedAmount, U256};
use std::collections::BTreeMap;

/// Supply minted at deployment (50M tokens).
pub const INITIAL_SUPPLY: ScaledAmount = ampl(50_000_000);

/// Fixed gon count: the largest multiple of the initial supply below 2^256.
pub fn total_gons() -> U256 {
    U256::MAX - U256::MAX % INITIAL_SUPPLY
}

/// Supply cap after positive rebases.
pub fn max_supply() -> ScaledAmount {
    U256::from(u128::MAX)
}

/// Rebase event as the token would emit it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebaseEvent {
    pub epoch: u64,
    pub total_supply: ScaledAmount,
}

#[derive(Clone, Debug)]
pub struct TokenState {
    pub monetary_policy: Address,
    total_supply: ScaledAmount,
    gons_per_fragment: U256,
    gon_balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<(Address, Address), ScaledAmount>,
    pub rebase_events: Vec<RebaseEvent>,
}

impl TokenState {
    /// Mint the initial supply to `owner`, who is also the monetary policy.
    pub fn new(owner: Address) -> Self {
        let mut gon_balances = BTreeMap::new();
        gon_balances.insert(owner, total_gons());
        Self {
            monetary_policy: owner,
            total_supply: INITIAL_SUPPLY,
            gons_per_fragment: total_gons() / INITIAL_SUPPLY,
            gon_balances,
            allowances: BTreeMap::new(),
            rebase_events: Vec::new(),
        }
    }

    pub fn total_supply(&self) -> ScaledAmount {
        self.total_supply
    }

    pub fn balance_of(&self, who: Address) -> ScaledAmount {
        self.gon_balances.get(&who).copied().unwrap_or_default() / self.gons_per_fragment
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> ScaledAmount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: ScaledAmount,
    ) -> Result<(), String> {
        let gons = amount
            .checked_mul(self.gons_per_fragment)
            .ok_or_else(|| "transfer amount overflow".to_string())?;
        let from_gons = self.gon_balances.get(&from).copied().unwrap_or_default();
        if from_gons < gons {
            return Err("transfer amount exceeds balance".to_string());
        }
        self.gon_balances.insert(from, from_gons - gons);
        let to_gons = self.gon_balances.entry(to).or_default();
        *to_gons = to_gons.saturating_add(gons);
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: ScaledAmount) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: ScaledAmount,
    ) -> Result<(), String> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err("transfer amount exceeds allowance".to_string());
        }
        self.transfer(from, to, amount)?;
        self.allowances.insert((from, spender), allowed - amount);
        Ok(())
    }

    /// Apply `supply_delta`; a zero delta still records the event.
    pub fn rebase(
        &mut self,
        caller: Address,
        epoch: u64,
        supply_delta: SignedAmount,
    ) -> Result<ScaledAmount, String> {
        if caller != self.monetary_policy {
            return Err("caller is not the monetary policy".to_string());
        }
        let magnitude = supply_delta.unsigned_abs();
        let next = if supply_delta.is_negative() {
            self.total_supply
                .checked_sub(magnitude)
                .filter(|s| !s.is_zero())
                .ok_or_else(|| "rebase would exhaust the supply".to_string())?
        } else {
            self.total_supply.saturating_add(magnitude).min(max_supply())
        };
        self.total_supply = next;
        self.gons_per_fragment = total_gons() / next;
        self.rebase_events.push(RebaseEvent {
            epoch,
            total_supply: next,
        });
        Ok(next)
    }
}
