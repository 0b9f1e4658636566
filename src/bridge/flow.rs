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

//! Lock-and-mint / burn-and-release flow tracking.
//!
//! A flow moves `AwaitingDeposit -> Confirming -> Signing -> Submitting -> Done`.
//! `Error` from any live state ends it in `Failed`. Settled flows accept no
//! further events.

use crate::chain::abi::IMintAdapter;
use crate::core::types::{Address, ScaledAmount, TxHash};
use alloy::primitives::address;
use alloy::sol_types::SolCall;
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Flow errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    /// Event not accepted in the current state.
    #[error("illegal transition: {event} in state {state}")]
    IllegalTransition {
        /// State name at the time of the event.
        state: String,
        /// Offending event.
        event: String,
    },
    /// Event source ended before the flow settled.
    #[error("event source exhausted in state {0}")]
    SourceExhausted(String),
    /// Every state sender is gone.
    #[error("flow dropped before settling")]
    Closed,
}

/// Fixed bridge parameter set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeParams {
    /// Asset moved across.
    pub asset: &'static str,
    /// Origin chain of the asset.
    pub from_chain: &'static str,
    /// Destination network id.
    pub network_id: u64,
    /// Adapter contract minting on the destination.
    pub adapter: Address,
    /// Adapter function called on mint.
    pub contract_fn: &'static str,
    /// Deposit confirmations required before signing.
    pub required_confirmations: u64,
}

const BTC_ADAPTER: Address = address!("9c3ef5ece74d7d33d0f68dfb550d2474dc8e9732");

impl BridgeParams {
    /// BTC from Bitcoin to network 42 through the mint adapter.
    pub const fn btc() -> Self {
        Self {
            asset: "BTC",
            from_chain: "Bitcoin",
            network_id: 42,
            adapter: BTC_ADAPTER,
            contract_fn: IMintAdapter::mintCall::SIGNATURE,
            required_confirmations: 0,
        }
    }

    /// Calldata for the adapter's mint of `amount` to `to`.
    pub fn mint_calldata(&self, to: Address, amount: ScaledAmount) -> Vec<u8> {
        IMintAdapter::mintCall {
            _to: to,
            _amount: amount,
        }
        .abi_encode()
    }
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self::btc()
    }
}

/// Direction and payload of a flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowKind {
    /// Deposit on the origin chain, mint on the destination.
    Mint {
        /// Destination recipient.
        to: Address,
        /// Amount in the asset's smallest unit.
        amount: ScaledAmount,
    },
    /// Burn on the destination, release on the origin chain.
    Burn {
        /// Origin-chain recipient, as that chain spells addresses.
        to: String,
        /// Amount in the asset's smallest unit.
        amount: ScaledAmount,
    },
}

/// Flow state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    AwaitingDeposit,
    Confirming { confirmations: u64, target: u64 },
    Signing,
    Submitting,
    Done { tx: TxHash },
    Failed { reason: String },
}

impl FlowState {
    /// `Done` or `Failed`.
    pub fn is_settled(&self) -> bool {
        matches!(self, FlowState::Done { .. } | FlowState::Failed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            FlowState::AwaitingDeposit => "AwaitingDeposit",
            FlowState::Confirming { .. } => "Confirming",
            FlowState::Signing => "Signing",
            FlowState::Submitting => "Submitting",
            FlowState::Done { .. } => "Done",
            FlowState::Failed { .. } => "Failed",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Confirming {
                confirmations,
                target,
            } => write!(f, "Confirming({confirmations}/{target})"),
            FlowState::Done { tx } => write!(f, "Done({tx})"),
            FlowState::Failed { reason } => write!(f, "Failed({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Observation fed into a flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowEvent {
    DepositDetected,
    /// Total confirmations seen so far.
    Confirmation(u64),
    SignatureReady,
    Submitted(TxHash),
    Confirmed,
    Error(String),
}

/// Pull-based event feed.
pub trait FlowEventSource: Send {
    /// Next event, or `None` once the feed is exhausted.
    fn next_event(&mut self) -> BoxFuture<'_, Option<FlowEvent>>;
}

/// Fixed event script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedEvents {
    events: VecDeque<FlowEvent>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = FlowEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl FlowEventSource for ScriptedEvents {
    fn next_event(&mut self) -> BoxFuture<'_, Option<FlowEvent>> {
        future::ready(self.events.pop_front()).boxed()
    }
}

impl FlowEventSource for mpsc::Receiver<FlowEvent> {
    fn next_event(&mut self) -> BoxFuture<'_, Option<FlowEvent>> {
        self.recv().boxed()
    }
}

/// One tracked bridge transfer.
pub struct BridgeFlow {
    kind: FlowKind,
    params: BridgeParams,
    submitted: Option<TxHash>,
    state_tx: watch::Sender<FlowState>,
}

impl BridgeFlow {
    fn new(kind: FlowKind, params: BridgeParams) -> Self {
        let (state_tx, _) = watch::channel(FlowState::AwaitingDeposit);
        Self {
            kind,
            params,
            submitted: None,
            state_tx,
        }
    }

    /// Track a deposit-and-mint of `amount` to `to`.
    pub fn mint(params: BridgeParams, to: Address, amount: ScaledAmount) -> Self {
        Self::new(FlowKind::Mint { to, amount }, params)
    }

    /// Track a burn-and-release of `amount` to origin-chain address `to`.
    pub fn burn(params: BridgeParams, to: impl Into<String>, amount: ScaledAmount) -> Self {
        Self::new(
            FlowKind::Burn {
                to: to.into(),
                amount,
            },
            params,
        )
    }

    pub fn kind(&self) -> &FlowKind {
        &self.kind
    }

    pub fn params(&self) -> &BridgeParams {
        &self.params
    }

    /// Current state.
    pub fn state(&self) -> FlowState {
        self.state_tx.borrow().clone()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state_tx.subscribe()
    }

    /// Resolve once the flow is `Done` or `Failed`.
    pub async fn wait_settled(&self) -> Result<FlowState, FlowError> {
        wait_settled(self.subscribe()).await
    }

    fn next_state(&self, current: &FlowState, event: &FlowEvent) -> Option<FlowState> {
        let target = self.params.required_confirmations;
        let confirming = |n: u64| {
            if n >= target {
                FlowState::Signing
            } else {
                FlowState::Confirming {
                    confirmations: n,
                    target,
                }
            }
        };
        match (current, event) {
            (s, _) if s.is_settled() => None,
            (_, FlowEvent::Error(reason)) => Some(FlowState::Failed {
                reason: reason.clone(),
            }),
            (FlowState::AwaitingDeposit, FlowEvent::DepositDetected) => Some(confirming(0)),
            (FlowState::Confirming { confirmations, .. }, FlowEvent::Confirmation(n)) => {
                Some(confirming((*n).max(*confirmations)))
            }
            (FlowState::Signing, FlowEvent::SignatureReady) => Some(FlowState::Submitting),
            (FlowState::Submitting, FlowEvent::Submitted(_)) => Some(FlowState::Submitting),
            (FlowState::Submitting, FlowEvent::Confirmed) => {
                self.submitted.map(|tx| FlowState::Done { tx })
            }
            _ => None,
        }
    }

    /// Apply one event; returns the new state.
    pub fn apply(&mut self, event: FlowEvent) -> Result<FlowState, FlowError> {
        let current = self.state();
        let Some(next) = self.next_state(&current, &event) else {
            warn!(state = %current, ?event, "rejected flow event");
            return Err(FlowError::IllegalTransition {
                state: current.to_string(),
                event: format!("{event:?}"),
            });
        };
        if let FlowEvent::Submitted(tx) = event {
            self.submitted = Some(tx);
        }
        info!(asset = self.params.asset, from = %current, to = %next, "flow transition");
        self.state_tx.send_replace(next.clone());
        Ok(next)
    }

    /// Feed events from `source` until the flow settles.
    pub async fn drive(
        &mut self,
        source: &mut dyn FlowEventSource,
    ) -> Result<FlowState, FlowError> {
        loop {
            let current = self.state();
            if current.is_settled() {
                return Ok(current);
            }
            match source.next_event().await {
                Some(ev) => {
                    self.apply(ev)?;
                }
                None => return Err(FlowError::SourceExhausted(current.to_string())),
            }
        }
    }
}

/// Resolve once `rx` observes a settled state.
pub async fn wait_settled(mut rx: watch::Receiver<FlowState>) -> Result<FlowState, FlowError> {
    let state = rx
        .wait_for(FlowState::is_settled)
        .await
        .map_err(|_| FlowError::Closed)?;
    Ok(state.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_confirmations_skip_straight_to_signing() {
        let mut flow = BridgeFlow::mint(BridgeParams::btc(), Address::ZERO, ScaledAmount::from(1));
        assert_eq!(flow.apply(FlowEvent::DepositDetected), Ok(FlowState::Signing));
    }

    #[test]
    fn mint_calldata_starts_with_selector() {
        let to = Address::repeat_byte(0x22);
        let data = BridgeParams::btc().mint_calldata(to, ScaledAmount::from(5));
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &alloy::primitives::keccak256("mint(address,uint256)")[..4]);
        assert_eq!(&data[4 + 12..4 + 32], to.as_slice());
        assert_eq!(data[4 + 63], 5);
    }

    #[test]
    fn btc_adapter_address() {
        let expected: Address = "0x9c3ef5ece74d7d33d0f68dfb550d2474dc8e9732".parse().unwrap();
        assert_eq!(BridgeParams::btc().adapter, expected);
        assert_eq!(BridgeParams::btc().contract_fn, "mint(address,uint256)");
    }
}
