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

use geyser_harness::chain::clock::{ClockError, SimulatedClock};
use geyser_harness::chain::rpc::DevChain;
use geyser_harness::core::error::HarnessError;
use geyser_harness::core::types::{ampl, GeyserParams, ONE_DAY, ONE_HOUR, U256};
use geyser_harness::harness::GeyserTestContext;
use geyser_harness::sim::chain::GENESIS_TIMESTAMP;
use geyser_harness::sim::SimChain;
use std::sync::Arc;

fn fresh_chain() -> DevChain {
    DevChain::new(Arc::new(SimChain::new(GeyserParams::default_params())))
}

#[tokio::test]
async fn clock_must_be_initialized_first() {
    let mut clock = SimulatedClock::new(fresh_chain());
    assert!(matches!(clock.current_time(), Err(ClockError::Uninitialized)));
    assert!(matches!(
        clock.advance_time(10).await,
        Err(ClockError::Uninitialized)
    ));
}

#[tokio::test]
async fn advance_pins_next_block_timestamp() {
    let chain = fresh_chain();
    let mut clock = SimulatedClock::new(chain.clone());
    assert_eq!(clock.initialize().await.expect("init"), GENESIS_TIMESTAMP);

    let t = clock.advance_time(ONE_HOUR).await.expect("advance");
    assert_eq!(t, GENESIS_TIMESTAMP + ONE_HOUR);
    assert_eq!(clock.current_time().expect("time"), t);

    let block = chain.block_number().await.expect("block");
    clock.execute_empty_block().await.expect("mine");
    assert_eq!(chain.block_number().await.expect("block"), block + 1);
    assert_eq!(chain.latest_timestamp().await.expect("ts"), t);

    let t2 = clock.advance_time(ONE_DAY).await.expect("advance");
    clock.execute_empty_block().await.expect("mine");
    assert_eq!(chain.latest_timestamp().await.expect("ts"), t2);
    assert_eq!(t2, GENESIS_TIMESTAMP + ONE_HOUR + ONE_DAY);
}

#[tokio::test]
async fn back_to_back_advances_land_on_current_time() {
    let chain = fresh_chain();
    let mut clock = SimulatedClock::new(chain.clone());
    clock.initialize().await.expect("init");

    clock.advance_time(100).await.expect("advance");
    clock.advance_time(100).await.expect("advance");
    clock.advance_time(0).await.expect("advance");
    clock.execute_empty_block().await.expect("mine");

    let now = clock.current_time().expect("time");
    assert_eq!(now, GENESIS_TIMESTAMP + 200);
    assert_eq!(chain.latest_timestamp().await.expect("ts"), now);
}

#[tokio::test]
async fn advance_survives_an_intervening_transaction() {
    let ctx = GeyserTestContext::simulated(GeyserParams::default_params())
        .await
        .expect("context");
    let mut clock = SimulatedClock::new(ctx.chain.clone());
    let t0 = clock.initialize().await.expect("init");

    clock.advance_time(ONE_HOUR).await.expect("advance");
    // automine: the transfer's block consumes the pin
    ctx.token
        .transfer(ctx.owner, ctx.another_account, U256::from(1))
        .await
        .expect("transfer");
    assert_eq!(ctx.chain.latest_timestamp().await.expect("ts"), t0 + ONE_HOUR);

    clock.advance_time(ONE_HOUR).await.expect("advance");
    clock.advance_time(ONE_HOUR).await.expect("advance");
    clock.execute_empty_block().await.expect("mine");
    assert_eq!(
        ctx.chain.latest_timestamp().await.expect("ts"),
        t0 + 3 * ONE_HOUR
    );
}

#[tokio::test]
async fn pinning_below_a_pending_pin_is_rejected() {
    let chain = fresh_chain();
    let mut clock = SimulatedClock::new(chain.clone());
    clock.initialize().await.expect("init");
    clock.advance_time(100).await.expect("advance");

    let err = clock
        .pin_next_transaction_time(GENESIS_TIMESTAMP + 50)
        .await
        .expect_err("below pending pin");
    assert!(matches!(
        err,
        ClockError::TimeTravel { now, target }
            if now == GENESIS_TIMESTAMP + 100 && target == GENESIS_TIMESTAMP + 50
    ));
}

#[tokio::test]
async fn pinning_into_the_past_is_rejected() {
    let chain = fresh_chain();
    let mut clock = SimulatedClock::new(chain.clone());
    clock.initialize().await.expect("init");
    clock.advance_time(100).await.expect("advance");
    clock.execute_empty_block().await.expect("mine");

    let err = clock
        .pin_next_transaction_time(GENESIS_TIMESTAMP)
        .await
        .expect_err("past target");
    match err {
        ClockError::TimeTravel { now, target } => {
            assert_eq!(now, GENESIS_TIMESTAMP + 100);
            assert_eq!(target, GENESIS_TIMESTAMP);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn pinning_to_latest_time_is_allowed() {
    let chain = fresh_chain();
    let mut clock = SimulatedClock::new(chain.clone());
    let now = chain.latest_timestamp().await.expect("ts");
    clock.pin_next_transaction_time(now).await.expect("pin");
    clock.execute_empty_block().await.expect("mine");
    assert_eq!(chain.latest_timestamp().await.expect("ts"), now);
}

#[tokio::test]
async fn actions_in_a_block_share_one_block() {
    let ctx = GeyserTestContext::simulated(GeyserParams::default_params())
        .await
        .expect("context");
    let sim = ctx.sim().expect("simulated").clone();
    let accounts = sim.accounts().to_vec();
    let before = ctx.chain.block_number().await.expect("block");

    let token = ctx.token.clone();
    let owner = ctx.owner;
    let (a, b) = (accounts[2], accounts[3]);
    ctx.clock
        .execute_as_block(|| async {
            token.transfer(owner, a, ampl(1)).await?;
            token.transfer(owner, b, ampl(2)).await?;
            assert_eq!(sim.pending_count().await, 2);
            Ok::<(), HarnessError>(())
        })
        .await
        .expect("block");

    assert_eq!(ctx.chain.block_number().await.expect("block"), before + 1);
    assert_eq!(sim.pending_count().await, 0);
    assert_eq!(ctx.token.balance_of(a).await.expect("balance"), ampl(1));
    assert_eq!(ctx.token.balance_of(b).await.expect("balance"), ampl(2));
}

#[tokio::test]
async fn failed_block_actions_still_resume_mining() {
    let ctx = GeyserTestContext::simulated(GeyserParams::default_params())
        .await
        .expect("context");
    let before = ctx.chain.block_number().await.expect("block");

    let out = ctx
        .clock
        .execute_as_block(|| async {
            Err::<(), HarnessError>(HarnessError::Clock(ClockError::Overflow))
        })
        .await;
    assert!(matches!(out, Err(HarnessError::Clock(ClockError::Overflow))));
    assert_eq!(ctx.chain.block_number().await.expect("block"), before + 1);

    // automine is back on: a plain transfer mines its own block
    ctx.token
        .transfer(ctx.owner, ctx.another_account, U256::from(1))
        .await
        .expect("transfer");
    assert_eq!(ctx.chain.block_number().await.expect("block"), before + 2);
}

#[tokio::test]
async fn lock_at_latest_time_starts_schedule_now() {
    let mut ctx = GeyserTestContext::simulated(GeyserParams::default_params())
        .await
        .expect("context");
    let latest = ctx.chain.latest_timestamp().await.expect("ts");
    ctx.clock
        .lock_tokens_at_latest_time(ctx.geyser.as_ref(), ctx.owner, ampl(100), ONE_DAY)
        .await
        .expect("lock");

    let schedule = ctx.geyser.unlock_schedules(0).await.expect("schedule");
    assert_eq!(schedule.start_time, latest);
    assert_eq!(schedule.end_at_sec, latest + ONE_DAY);
    assert_eq!(ctx.geyser.total_locked().await.expect("locked"), ampl(100));
}

#[tokio::test]
async fn lock_after_advance_starts_at_the_pinned_time() {
    let mut ctx = GeyserTestContext::simulated(GeyserParams::default_params())
        .await
        .expect("context");
    let t = ctx.clock.advance_time(ONE_HOUR).await.expect("advance");
    ctx.clock
        .lock_tokens_at_latest_time(ctx.geyser.as_ref(), ctx.owner, ampl(100), ONE_DAY)
        .await
        .expect("lock");

    let schedule = ctx.geyser.unlock_schedules(0).await.expect("schedule");
    assert_eq!(schedule.start_time, t);
    assert_eq!(ctx.chain.latest_timestamp().await.expect("ts"), t);
}
