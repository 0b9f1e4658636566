// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex};

use alloy::sol_types::SolCall;
use async_trait::async_trait;
use geyser_harness::chain::abi::{IElasticToken, IGeyser};
use geyser_harness::chain::contracts::{
    ContractError, ElasticToken, GeyserContract, RpcGeyser, RpcToken,
};
use geyser_harness::chain::rpc::{ChainRpc, DevChain, RpcError};
use geyser_harness::core::economics::rewards::RewardOracle;
use geyser_harness::core::types::{Address, TxHash, I256, U256};
use serde_json::{json, Value};

const GEYSER: Address = Address::repeat_byte(0x22);
const ALICE: Address = Address::repeat_byte(0x11);

fn word(v: U256) -> String {
    hex::encode(v.to_be_bytes::<32>())
}

fn words(vs: &[U256]) -> Value {
    json!(format!("0x{}", vs.iter().map(|v| word(*v)).collect::<String>()))
}

fn wide_share_seconds() -> U256 {
    (U256::from(1u8) << 200) + U256::from(3)
}

/// Answers `eth_call` by selector and records every request.
#[derive(Default)]
struct ScriptedNode {
    seen: Mutex<Vec<(String, Value)>>,
}

impl ScriptedNode {
    fn answer(&self, data: &str) -> Result<Value, RpcError> {
        let sel = &data[2..10];
        let is = |selector: [u8; 4]| sel == hex::encode(selector);
        if is(IGeyser::totalStakedCall::SELECTOR) {
            Ok(words(&[U256::from(42)]))
        } else if is(IGeyser::updateAccountingCall::SELECTOR) {
            // locked, unlocked, sss, total sss, total rewards, now, user, founder
            let tuple = [7u64, 100, 5, 10, 50, 1_600_000_000, 45, 5].map(U256::from);
            Ok(words(&tuple))
        } else if is(IGeyser::totalUnclaimedStakingShareSecondsCall::SELECTOR) {
            Ok(words(&[wide_share_seconds()]))
        } else if is(IGeyser::totalLockedCall::SELECTOR) {
            Err(RpcError::Rpc {
                code: -32000,
                message: "VM Exception while processing transaction: revert paused".to_string(),
            })
        } else {
            Ok(json!("0x"))
        }
    }
}

#[async_trait]
impl ChainRpc for ScriptedNode {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((method.to_string(), params.clone()));
        }
        match method {
            "eth_call" => {
                let data = params[0]["data"].as_str().unwrap_or("0x00000000");
                self.answer(data)
            }
            "eth_sendTransaction" => Ok(json!(format!("0x{}", "ab".repeat(32)))),
            _ => Err(RpcError::Rpc {
                code: -32601,
                message: "unsupported".to_string(),
            }),
        }
    }
}

fn bind() -> (Arc<ScriptedNode>, DevChain) {
    let node = Arc::new(ScriptedNode::default());
    (node.clone(), DevChain::new(node))
}

#[tokio::test]
async fn views_are_simulated_calls_at_the_pending_block() {
    let (node, chain) = bind();
    let geyser = RpcGeyser::new(chain, GEYSER);
    assert_eq!(geyser.total_staked().await.expect("staked"), U256::from(42));

    let seen = node.seen.lock().expect("lock");
    let (method, params) = &seen[0];
    assert_eq!(method, "eth_call");
    assert_eq!(params[1], "pending");
    let to: Address = params[0]["to"].as_str().expect("to").parse().expect("address");
    assert_eq!(to, GEYSER);
}

#[tokio::test]
async fn accounting_tuple_feeds_the_oracle() {
    let (node, chain) = bind();
    let oracle = RewardOracle::new(Arc::new(RpcGeyser::new(chain, GEYSER)));
    let snap = oracle.verify_rewards(ALICE, 10).await.expect("10% split");
    assert_eq!(snap.total_staked, U256::from(42));
    assert_eq!(snap.total_user_rewards, U256::from(50));
    assert_eq!(snap.user_rewards, U256::from(45));
    assert_eq!(snap.founder_rewards, U256::from(5));
    assert_eq!(snap.now, 1_600_000_000);

    // the accounting refresh is sent from the account itself
    let seen = node.seen.lock().expect("lock");
    assert!(seen.iter().any(|(_, p)| {
        p[0]["from"]
            .as_str()
            .and_then(|s| s.parse::<Address>().ok())
            == Some(ALICE)
    }));
}

#[tokio::test]
async fn share_seconds_wider_than_128_bits_decode() {
    let (_node, chain) = bind();
    let geyser = RpcGeyser::new(chain, GEYSER);
    assert_eq!(
        geyser
            .total_unclaimed_staking_share_seconds()
            .await
            .expect("share-seconds"),
        wide_share_seconds()
    );
}

#[tokio::test]
async fn node_reverts_surface_as_contract_reverts() {
    let (_node, chain) = bind();
    let geyser = RpcGeyser::new(chain, GEYSER);
    match geyser.total_locked().await {
        Err(ContractError::Reverted(msg)) => assert!(msg.contains("paused")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn short_return_data_is_a_decode_error() {
    let (_node, chain) = bind();
    let geyser = RpcGeyser::new(chain, GEYSER);
    assert!(matches!(
        geyser.total_harvested().await,
        Err(ContractError::Decode(_))
    ));
}

#[tokio::test]
async fn writes_carry_the_encoded_call() {
    let (node, chain) = bind();
    let token = RpcToken::new(chain, GEYSER);
    let delta = I256::try_from(-5i64).expect("fits");
    let tx = token.rebase(ALICE, 3, delta).await.expect("rebase");
    assert_eq!(tx, TxHash::repeat_byte(0xab));

    let seen = node.seen.lock().expect("lock");
    let (method, params) = &seen[0];
    assert_eq!(method, "eth_sendTransaction");
    let data = params[0]["data"].as_str().expect("data");
    let selector = hex::encode(IElasticToken::rebaseCall::SELECTOR);
    assert!(data.starts_with(&format!("0x{selector}")));
    // int256 -5 is sign-extended
    assert!(data.ends_with(&format!("{}fb", "f".repeat(62))));
}
