// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use proptest::prelude::*;

use geyser_harness::core::types::{GeyserParams, ONE_DAY, U256};
use geyser_harness::harness::GeyserTestContext;

#[derive(Clone, Copy, Debug)]
enum Then {
    Nothing,
    MineEmpty,
    Transfer,
}

fn step() -> impl Strategy<Value = (u64, Then)> {
    let secs = prop_oneof![Just(0u64), 1u64..60, 0u64..ONE_DAY];
    let then = prop_oneof![
        Just(Then::Nothing),
        Just(Then::MineEmpty),
        Just(Then::Transfer),
    ];
    (secs, then)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn mined_blocks_carry_the_clock_time(steps in prop::collection::vec(step(), 1..12)) {
        runtime().block_on(async {
            let mut ctx = GeyserTestContext::simulated(GeyserParams::default_params())
                .await
                .expect("context");
            let start = ctx.clock.current_time().expect("time");

            for (secs, then) in &steps {
                ctx.clock.advance_time(*secs).await.expect("advance");
                match then {
                    Then::Nothing => continue,
                    Then::MineEmpty => ctx.clock.execute_empty_block().await.expect("mine"),
                    Then::Transfer => {
                        ctx.token
                            .transfer(ctx.owner, ctx.another_account, U256::from(1))
                            .await
                            .expect("transfer");
                    }
                }
                let latest = ctx.chain.latest_timestamp().await.expect("ts");
                prop_assert_eq!(latest, ctx.clock.current_time().expect("time"));
            }

            ctx.clock.execute_empty_block().await.expect("mine");
            let total: u64 = steps.iter().map(|(secs, _)| secs).sum();
            let now = ctx.clock.current_time().expect("time");
            prop_assert_eq!(now, start + total);
            prop_assert_eq!(ctx.chain.latest_timestamp().await.expect("ts"), now);
            Ok(())
        })?;
    }
}
