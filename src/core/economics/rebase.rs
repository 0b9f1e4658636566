#![allow(missing_docs)]
// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

//! Elastic-supply rebase arithmetic in fixed point.

#![forbid(unsafe_code)]

use crate::chain::contracts::{ContractError, ElasticToken};
use crate::core::types::{
    Address, ScaledAmount, SignedAmount, TxHash, I256, PERC_DECIMALS, U256,
};
use crate::monitoring::metrics::HarnessMetrics;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// `100%` expressed in hundredths of a percent.
const ONE_HUNDRED_PCT: i64 = 100 * 10i64.pow(PERC_DECIMALS);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RebaseError {
    #[error("invalid percent {0:?}")]
    InvalidPercent(String),
    #[error("rebase would make the supply negative")]
    NegativeSupply,
    #[error("arithmetic overflow")]
    Overflow,
}

/// Signed percentage change with two decimal places (`10.50%` is `1050`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RebasePercent(i64);

impl RebasePercent {
    pub const ZERO: RebasePercent = RebasePercent(0);

    pub const fn from_hundredths(h: i64) -> Self {
        Self(h)
    }

    pub const fn whole(pct: i64) -> Self {
        Self(pct * 100)
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }
}

impl FromStr for RebasePercent {
    type Err = RebaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || RebaseError::InvalidPercent(s.to_string());
        let t = s.trim().trim_end_matches('%');
        let (neg, t) = match t.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, t.strip_prefix('+').unwrap_or(t)),
        };
        let (int_part, frac_part) = t.split_once('.').unwrap_or((t, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(bad());
        }
        if frac_part.len() > PERC_DECIMALS as usize
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(bad());
        }
        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| bad())?
        };
        let mut frac: i64 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| bad())?
        };
        if frac_part.len() == 1 {
            frac *= 10;
        }
        let h = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(bad)?;
        Ok(Self(if neg { -h } else { h }))
    }
}

impl fmt::Display for RebasePercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}%", abs / 100, abs % 100)
    }
}

/// Result of a supply computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebaseOutcome {
    pub previous_supply: ScaledAmount,
    pub new_supply: ScaledAmount,
    pub supply_delta: SignedAmount,
}

/// `supply * (10000 + percent_hundredths) / 10000`, in integers.
pub fn compute_rebased_supply(
    supply: ScaledAmount,
    percent: RebasePercent,
) -> Result<RebaseOutcome, RebaseError> {
    let factor = ONE_HUNDRED_PCT
        .checked_add(percent.hundredths())
        .ok_or(RebaseError::Overflow)?;
    let factor = u64::try_from(factor).map_err(|_| RebaseError::NegativeSupply)?;
    let new_supply = supply
        .checked_mul(U256::from(factor))
        .ok_or(RebaseError::Overflow)?
        / U256::from(ONE_HUNDRED_PCT as u64);

    let supply_delta = if new_supply >= supply {
        I256::try_from(new_supply - supply).map_err(|_| RebaseError::Overflow)?
    } else {
        -I256::try_from(supply - new_supply).map_err(|_| RebaseError::Overflow)?
    };
    Ok(RebaseOutcome {
        previous_supply: supply,
        new_supply,
        supply_delta,
    })
}

#[derive(Debug, Error)]
pub enum RebaseInvokeError {
    #[error(transparent)]
    Rebase(#[from] RebaseError),
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Drives rebases of an elastic token from its monetary policy account.
pub struct RebaseSimulator {
    token: Arc<dyn ElasticToken>,
    policy: Address,
    epoch: u64,
    metrics: Option<Arc<HarnessMetrics>>,
}

impl RebaseSimulator {
    pub fn new(token: Arc<dyn ElasticToken>, policy: Address) -> Self {
        Self {
            token,
            policy,
            epoch: 1,
            metrics: None,
        }
    }

    /// Count submitted rebases in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<HarnessMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Epoch the next rebase will be tagged with.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Read the supply, compute the new one and submit the signed delta.
    ///
    /// A zero change is still submitted so the token emits its rebase event.
    pub async fn invoke_rebase(
        &mut self,
        percent: RebasePercent,
    ) -> Result<(RebaseOutcome, TxHash), RebaseInvokeError> {
        let supply = self.token.total_supply().await?;
        let outcome = compute_rebased_supply(supply, percent)?;
        let tx = self
            .token
            .rebase(self.policy, self.epoch, outcome.supply_delta)
            .await?;
        info!(
            epoch = self.epoch,
            %supply,
            %percent,
            delta = %outcome.supply_delta,
            "rebase submitted"
        );
        if let Some(m) = &self.metrics {
            m.rebases_total.inc();
        }
        self.epoch += 1;
        Ok((outcome, tx))
    }
}
