// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use geyser_harness::chain::snapshot::{isolated, restore, snapshot, SnapshotError};
use geyser_harness::core::economics::tolerance::check_currency;
use geyser_harness::core::error::HarnessError;
use geyser_harness::core::types::{
    ampl, AccountingTuple, GeyserParams, ScaledAmount, ONE_DAY, ONE_HOUR, U256,
};
use geyser_harness::harness::GeyserTestContext;

async fn context() -> GeyserTestContext {
    GeyserTestContext::simulated(GeyserParams::default_params())
        .await
        .expect("context")
}

#[tokio::test]
async fn restore_rolls_back_balances_and_time() {
    let mut ctx = context().await;
    let block = ctx.chain.block_number().await.expect("block");
    let ts = ctx.chain.latest_timestamp().await.expect("ts");

    let handle = ctx.snapshot().await.expect("snapshot");
    ctx.token
        .transfer(ctx.another_account, ctx.owner, ampl(10))
        .await
        .expect("transfer");
    ctx.clock.advance_time(ONE_DAY).await.expect("advance");
    ctx.clock.execute_empty_block().await.expect("mine");
    assert_eq!(
        ctx.token.balance_of(ctx.another_account).await.expect("balance"),
        ampl(49_990)
    );

    ctx.restore(handle).await.expect("restore");
    assert_eq!(
        ctx.token.balance_of(ctx.another_account).await.expect("balance"),
        ampl(50_000)
    );
    assert_eq!(ctx.chain.block_number().await.expect("block"), block);
    assert_eq!(ctx.chain.latest_timestamp().await.expect("ts"), ts);
    assert_eq!(ctx.clock.current_time().expect("time"), ts);
}

#[derive(Debug, PartialEq, Eq)]
struct GeyserValues {
    total_locked: ScaledAmount,
    total_unlocked: ScaledAmount,
    total_staked: ScaledAmount,
    total_staking_shares: ScaledAmount,
    unlock_schedule_count: u64,
    accounting: AccountingTuple,
}

async fn geyser_values(ctx: &GeyserTestContext) -> GeyserValues {
    let g = &ctx.geyser;
    GeyserValues {
        total_locked: g.total_locked().await.expect("totalLocked"),
        total_unlocked: g.total_unlocked().await.expect("totalUnlocked"),
        total_staked: g.total_staked().await.expect("totalStaked"),
        total_staking_shares: g.total_staking_shares().await.expect("totalStakingShares"),
        unlock_schedule_count: g.unlock_schedule_count().await.expect("unlockScheduleCount"),
        accounting: g
            .update_accounting_query(ctx.another_account)
            .await
            .expect("updateAccounting"),
    }
}

async fn lock_stake_and_wait(ctx: &mut GeyserTestContext, locked: u64, staked: u64) {
    ctx.clock
        .lock_tokens_at_latest_time(ctx.geyser.as_ref(), ctx.owner, ampl(locked), ONE_DAY)
        .await
        .expect("lock");
    ctx.clock.advance_time(ONE_HOUR).await.expect("advance");
    ctx.geyser
        .stake(ctx.another_account, ampl(staked))
        .await
        .expect("stake");
    ctx.clock.advance_time(ONE_HOUR).await.expect("advance");
    ctx.clock.execute_empty_block().await.expect("mine");
}

#[tokio::test]
async fn restore_rolls_back_geyser_accounting() {
    let mut ctx = context().await;
    lock_stake_and_wait(&mut ctx, 1_000, 100).await;
    let before = geyser_values(&ctx).await;
    assert_eq!(before.unlock_schedule_count, 1);
    assert!(!before.accounting.total_staking_share_seconds.is_zero());

    let handle = ctx.snapshot().await.expect("snapshot");
    lock_stake_and_wait(&mut ctx, 500, 200).await;
    let during = geyser_values(&ctx).await;
    assert_eq!(during.unlock_schedule_count, 2);
    assert_ne!(during, before);

    ctx.restore(handle).await.expect("restore");
    assert_eq!(geyser_values(&ctx).await, before);
}

#[tokio::test]
async fn restoring_an_earlier_snapshot_retires_later_ones() {
    let ctx = context().await;
    let first = snapshot(&ctx.chain).await.expect("first");
    let second = snapshot(&ctx.chain).await.expect("second");
    assert_ne!(first.id(), second.id());

    restore(&ctx.chain, first).await.expect("restore first");
    let err = restore(&ctx.chain, second).await.expect_err("second is stale");
    assert!(matches!(err, SnapshotError::InvalidHandle(_)));
}

#[tokio::test]
async fn snapshots_nest() {
    let ctx = context().await;
    let outer = snapshot(&ctx.chain).await.expect("outer");
    ctx.token
        .transfer(ctx.owner, ctx.another_account, ampl(1))
        .await
        .expect("transfer");
    let inner = snapshot(&ctx.chain).await.expect("inner");
    ctx.token
        .transfer(ctx.owner, ctx.another_account, ampl(1))
        .await
        .expect("transfer");

    restore(&ctx.chain, inner).await.expect("restore inner");
    assert_eq!(
        ctx.token.balance_of(ctx.another_account).await.expect("balance"),
        ampl(50_001)
    );
    restore(&ctx.chain, outer).await.expect("restore outer");
    assert_eq!(
        ctx.token.balance_of(ctx.another_account).await.expect("balance"),
        ampl(50_000)
    );
}

#[tokio::test]
async fn isolated_restores_after_a_failing_body() {
    let ctx = context().await;
    let token = ctx.token.clone();
    let (from, to) = (ctx.another_account, ctx.owner);

    let out = isolated(&ctx.chain, || async {
        token.transfer(from, to, ampl(5)).await?;
        check_currency(token.balance_of(from).await?, ampl(50_000), "anotherAccount")?;
        Ok::<(), HarnessError>(())
    })
    .await;

    match out {
        Err(HarnessError::Tolerance(e)) => {
            assert!(e.to_string().starts_with("anotherAccount:"), "{e}")
        }
        other => panic!("expected tolerance failure, got {other:?}"),
    }
    assert_eq!(
        ctx.token.balance_of(from).await.expect("balance"),
        ampl(50_000)
    );
}

#[tokio::test]
async fn isolated_returns_the_body_value() {
    let ctx = context().await;
    let token = ctx.token.clone();
    let owner = ctx.owner;
    let supply = isolated(&ctx.chain, || async {
        Ok::<_, HarnessError>(token.total_supply().await?)
    })
    .await
    .expect("isolated");
    assert_eq!(supply, ctx.token.total_supply().await.expect("supply"));
    assert!(ctx.token.balance_of(owner).await.expect("balance") > U256::ZERO);
}
