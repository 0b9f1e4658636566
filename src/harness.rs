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

//! Per-test context: chain, clock, contracts and the accounts a scenario uses.
//!
//! Each test builds its own context; nothing is shared between tests.

use crate::chain::clock::SimulatedClock;
use crate::chain::contracts::{ElasticToken, GeyserContract, RpcGeyser, RpcToken};
use crate::chain::rpc::{ChainRpc, DevChain, HttpRpc, RpcError};
use crate::chain::snapshot::{self, ChainSnapshotHandle};
use crate::config::{ConfigError, HarnessConfig};
use crate::core::economics::rebase::RebaseSimulator;
use crate::core::economics::rewards::RewardOracle;
use crate::core::error::{HarnessError, HarnessResult};
use crate::core::types::{ampl, Address, GeyserParams, ScaledAmount};
use crate::monitoring::metrics::HarnessMetrics;
use crate::sim::SimChain;
use std::sync::Arc;
use tracing::info;

/// Tokens given to `another_account` and approved to the geyser per account.
pub const FUNDED_AMOUNT: ScaledAmount = ampl(50_000);

/// Owner and second account of a simulated chain.
fn pick_accounts(accounts: &[Address]) -> Result<(Address, Address), RpcError> {
    match accounts {
        [owner, another, ..] => Ok((*owner, *another)),
        _ => Err(RpcError::Decode {
            method: "eth_accounts".to_string(),
            detail: format!("need two accounts, node exposes {}", accounts.len()),
        }),
    }
}

/// Everything one scenario needs.
pub struct GeyserTestContext {
    /// Typed chain client.
    pub chain: DevChain,
    /// Clock bound to `chain`, already initialized.
    pub clock: SimulatedClock,
    /// Elastic token.
    pub token: Arc<dyn ElasticToken>,
    /// Geyser under test.
    pub geyser: Arc<dyn GeyserContract>,
    /// Deployer, geyser owner and monetary policy.
    pub owner: Address,
    /// Second funded account.
    pub another_account: Address,
    /// Geyser parameters.
    pub params: GeyserParams,
    /// Founder share of rewards.
    pub founder_percentage: u8,
    /// `100 - founder_percentage`.
    pub user_percentage: u8,
    sim: Option<SimChain>,
}

impl GeyserTestContext {
    /// Fresh in-process chain with `params`.
    ///
    /// `another_account` receives [`FUNDED_AMOUNT`] from the owner; both
    /// approve the geyser for the same amount.
    pub async fn simulated(params: GeyserParams) -> HarnessResult<Self> {
        let sim = SimChain::new(params);
        let chain = DevChain::new(Arc::new(sim.clone()));
        let (owner, another_account) = pick_accounts(&chain.accounts().await?)?;

        let token: Arc<dyn ElasticToken> = Arc::new(sim.token());
        let geyser: Arc<dyn GeyserContract> = Arc::new(sim.geyser());
        let spender = sim.geyser_address();
        token.transfer(owner, another_account, FUNDED_AMOUNT).await?;
        token.approve(owner, spender, FUNDED_AMOUNT).await?;
        token.approve(another_account, spender, FUNDED_AMOUNT).await?;

        let mut clock = SimulatedClock::new(chain.clone());
        let now = clock.initialize().await?;
        info!(
            %owner,
            %another_account,
            founder = params.founder_percentage,
            now,
            "simulated context ready"
        );

        Ok(Self {
            chain,
            clock,
            token,
            geyser,
            owner,
            another_account,
            params,
            founder_percentage: params.founder_percentage,
            user_percentage: params.user_percentage(),
            sim: Some(sim),
        })
    }

    /// Context over a live node described by `config`.
    pub async fn connect(config: &HarnessConfig) -> HarnessResult<Self> {
        Self::connect_with_metrics(config, None).await
    }

    /// [`Self::connect`], counting RPC traffic in `metrics`.
    pub async fn connect_with_metrics(
        config: &HarnessConfig,
        metrics: Option<Arc<HarnessMetrics>>,
    ) -> HarnessResult<Self> {
        config.validate()?;
        let mut http = HttpRpc::new(&config.rpc.url, config.timeout())?;
        if let Some(m) = metrics {
            http = http.with_metrics(m);
        }
        Self::with_transport(config, Arc::new(http)).await
    }

    /// Context over the contracts named by `config`, reached through `rpc`.
    ///
    /// The owner is `accounts.owner` or else the node's first account; having
    /// neither is a configuration error.
    pub async fn with_transport(
        config: &HarnessConfig,
        rpc: Arc<dyn ChainRpc>,
    ) -> HarnessResult<Self> {
        let resolved = config.validate()?;
        let chain = DevChain::new(rpc);
        let accounts = chain.accounts().await?;
        let owner = resolved
            .owner
            .or_else(|| accounts.first().copied())
            .ok_or_else(|| ConfigError::Invalid {
                field: "accounts.owner".to_string(),
                reason: "not set and the node exposes no accounts".to_string(),
            })?;
        let another_account = accounts
            .iter()
            .copied()
            .find(|a| *a != owner)
            .unwrap_or(owner);

        let founder_percentage = config.verification.founder_percentage.unwrap_or(0);
        let params = GeyserParams {
            founder_percentage,
            ..GeyserParams::default_params()
        };

        let mut clock = SimulatedClock::new(chain.clone());
        clock.initialize().await?;
        info!(
            url = %config.rpc.url,
            token = %resolved.token,
            geyser = %resolved.geyser,
            %owner,
            "connected"
        );

        Ok(Self {
            token: Arc::new(RpcToken::new(chain.clone(), resolved.token)),
            geyser: Arc::new(RpcGeyser::new(chain.clone(), resolved.geyser)),
            chain,
            clock,
            owner,
            another_account,
            params,
            founder_percentage,
            user_percentage: params.user_percentage(),
            sim: None,
        })
    }

    /// Oracle over this context's geyser.
    pub fn oracle(&self) -> RewardOracle {
        RewardOracle::new(self.geyser.clone())
    }

    /// Rebase driver acting as the owner.
    pub fn rebaser(&self) -> RebaseSimulator {
        RebaseSimulator::new(self.token.clone(), self.owner)
    }

    /// The in-process chain, when the context is simulated.
    pub fn sim(&self) -> Option<&SimChain> {
        self.sim.as_ref()
    }

    /// Snapshot the whole chain.
    pub async fn snapshot(&self) -> HarnessResult<ChainSnapshotHandle> {
        Ok(snapshot::snapshot(&self.chain).await?)
    }

    /// Restore `handle` and re-read the clock from the restored chain.
    pub async fn restore(&mut self, handle: ChainSnapshotHandle) -> HarnessResult<()> {
        snapshot::restore(&self.chain, handle).await?;
        self.clock.initialize().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct NoAccounts;

    #[async_trait]
    impl ChainRpc for NoAccounts {
        async fn request(&self, method: &str, _params: Value) -> Result<Value, RpcError> {
            match method {
                "eth_accounts" => Ok(json!([])),
                other => Err(RpcError::Rpc {
                    code: -32601,
                    message: format!("unexpected {other}"),
                }),
            }
        }
    }

    fn config(sim: &SimChain, owner: Option<Address>) -> HarnessConfig {
        let owner = owner
            .map(|o| format!("[accounts]\nowner = \"{o}\"\n"))
            .unwrap_or_default();
        let raw = format!(
            "[rpc]\nurl = \"http://127.0.0.1:8545\"\n\
             [contracts]\ntoken = \"{}\"\ngeyser = \"{}\"\n{owner}",
            sim.token_address(),
            sim.geyser_address(),
        );
        HarnessConfig::from_toml_str(&raw).unwrap()
    }

    #[test]
    fn pick_accounts_needs_two() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        assert_eq!(pick_accounts(&[a, b, a]).unwrap(), (a, b));
        for short in [&[][..], &[a][..]] {
            let err = pick_accounts(short).unwrap_err();
            assert!(matches!(&err, RpcError::Decode { method, .. } if method == "eth_accounts"));
        }
    }

    #[tokio::test]
    async fn missing_owner_is_a_config_error() {
        let sim = SimChain::new(GeyserParams::default_params());
        let err = GeyserTestContext::with_transport(&config(&sim, None), Arc::new(NoAccounts))
            .await
            .err()
            .expect("no owner available");
        let field = match &err {
            HarnessError::Config(ConfigError::Invalid { field, .. }) => field.as_str(),
            other => panic!("expected config error, got {other}"),
        };
        assert_eq!(field, "accounts.owner");
    }

    #[tokio::test]
    async fn owner_defaults_to_first_node_account() {
        let sim = SimChain::new(GeyserParams::default_params());
        let ctx = GeyserTestContext::with_transport(&config(&sim, None), Arc::new(sim.clone()))
            .await
            .unwrap();
        assert_eq!(ctx.owner, sim.accounts()[0]);
        assert_eq!(ctx.another_account, sim.accounts()[1]);
        assert!(ctx.sim().is_none());
    }

    #[tokio::test]
    async fn configured_owner_wins() {
        let sim = SimChain::new(GeyserParams::default_params());
        let chosen = sim.accounts()[3];
        let ctx =
            GeyserTestContext::with_transport(&config(&sim, Some(chosen)), Arc::new(sim.clone()))
                .await
                .unwrap();
        assert_eq!(ctx.owner, chosen);
        assert_eq!(ctx.another_account, sim.accounts()[0]);
    }
}
