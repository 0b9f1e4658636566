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

//! Reward oracle: reads accounting from the geyser and checks it against an
//! independently computed user/founder split.

use crate::chain::contracts::{ContractError, GeyserContract};
use crate::core::economics::tolerance::{check_within_tolerance, ToleranceError, CURRENCY_DELTA};
use crate::core::types::{Address, RewardSnapshot, ScaledAmount, U256};
use crate::monitoring::metrics::HarnessMetrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Oracle errors.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Founder percentage outside `0..=100`.
    #[error("founder percentage {0} exceeds 100")]
    InvalidPercentage(u8),
    /// Query against the geyser failed.
    #[error(transparent)]
    Query(#[from] ContractError),
    /// A leg of the split diverged from the expectation.
    #[error(transparent)]
    Mismatch(#[from] ToleranceError),
}

/// User and founder legs of a reward amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardSplit {
    /// Rewards kept by the user.
    pub user_rewards: ScaledAmount,
    /// Rewards taken by the founder.
    pub founder_rewards: ScaledAmount,
}

/// Split `total` so that `founder = total * pct / 100` and `user = total - founder`.
///
/// The two legs always sum to `total`.
pub fn expected_split(
    total: ScaledAmount,
    founder_percentage: u8,
) -> Result<RewardSplit, OracleError> {
    if founder_percentage > 100 {
        return Err(OracleError::InvalidPercentage(founder_percentage));
    }
    let pct = U256::from(founder_percentage);
    let hundred = U256::from(100u8);
    // total * pct may overflow near U256::MAX; split the product.
    let founder_rewards = (total / hundred) * pct + (total % hundred) * pct / hundred;
    Ok(RewardSplit {
        user_rewards: total - founder_rewards,
        founder_rewards,
    })
}

/// Read-only view over a geyser.
#[derive(Clone)]
pub struct RewardOracle {
    geyser: Arc<dyn GeyserContract>,
    currency_delta: ScaledAmount,
    metrics: Option<Arc<HarnessMetrics>>,
}

impl RewardOracle {
    /// Wrap a geyser.
    pub fn new(geyser: Arc<dyn GeyserContract>) -> Self {
        Self {
            geyser,
            currency_delta: CURRENCY_DELTA,
            metrics: None,
        }
    }

    /// Count every leg checked, and every leg out of band, in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<HarnessMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Use `delta` instead of [`CURRENCY_DELTA`] for the split checks.
    pub fn with_currency_delta(mut self, delta: ScaledAmount) -> Self {
        self.currency_delta = delta;
        self
    }

    /// Accounting snapshot of `account`, evaluated as a simulated call.
    pub async fn query_accounting(&self, account: Address) -> Result<RewardSnapshot, OracleError> {
        let tuple = self.geyser.update_accounting_query(account).await?;
        let total_staked = self.geyser.total_staked().await?;
        Ok(tuple.into_snapshot(total_staked))
    }

    /// Total rewards of `account` before the founder split.
    pub async fn total_rewards_for(&self, account: Address) -> Result<ScaledAmount, OracleError> {
        Ok(self.geyser.update_accounting_query(account).await?.total_user_rewards)
    }

    /// Rewards `account` would receive from a harvest now.
    pub async fn harvestable_rewards_for(
        &self,
        account: Address,
    ) -> Result<ScaledAmount, OracleError> {
        Ok(self.geyser.harvest_query(account).await?)
    }

    /// Rewards `account` could claim now.
    pub async fn claimable_rewards_for(
        &self,
        account: Address,
    ) -> Result<ScaledAmount, OracleError> {
        Ok(self.geyser.claim_rewards_query(account).await?)
    }

    /// Check the reported split of `account` against a split of its own
    /// reported total.
    pub async fn verify_rewards(
        &self,
        account: Address,
        founder_percentage: u8,
    ) -> Result<RewardSnapshot, OracleError> {
        let snap = self.query_accounting(account).await?;
        self.check_split(&snap, snap.total_user_rewards, founder_percentage)?;
        Ok(snap)
    }

    /// Check the reported total and split of `account` against `expected_total`.
    pub async fn verify_expected_rewards(
        &self,
        account: Address,
        expected_total: ScaledAmount,
        founder_percentage: u8,
    ) -> Result<RewardSnapshot, OracleError> {
        let snap = self.query_accounting(account).await?;
        self.check_split(&snap, expected_total, founder_percentage)?;
        Ok(snap)
    }

    fn check_split(
        &self,
        snap: &RewardSnapshot,
        expected_total: ScaledAmount,
        founder_percentage: u8,
    ) -> Result<(), OracleError> {
        let expected = expected_split(expected_total, founder_percentage)?;
        debug!(
            %expected_total,
            user = %expected.user_rewards,
            founder = %expected.founder_rewards,
            "checking reward split"
        );
        let legs = [
            ("totalRewards", snap.total_user_rewards, expected_total),
            ("userRewards", snap.user_rewards, expected.user_rewards),
            ("founderRewards", snap.founder_rewards, expected.founder_rewards),
        ];
        for (label, actual, want) in legs {
            let outcome = check_within_tolerance(actual, want, self.currency_delta, Some(label));
            if let Some(m) = &self.metrics {
                m.observe_check(&outcome);
            }
            outcome?;
        }
        Ok(())
    }
}
