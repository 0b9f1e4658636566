#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use geyser_harness::core::economics::rebase::{compute_rebased_supply, RebasePercent};
use geyser_harness::core::types::U256;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    percent: &'a str,
    supply: [u64; 4],
}

fuzz_target!(|input: Input<'_>| {
    let Ok(p) = input.percent.parse::<RebasePercent>() else {
        return;
    };
    // Display output parses back to the same value.
    let again: RebasePercent = p.to_string().parse().expect("display reparses");
    assert_eq!(again, p);
    if let Ok(out) = compute_rebased_supply(U256::from_limbs(input.supply), p) {
        let moved = out.supply_delta.unsigned_abs();
        if out.supply_delta.is_negative() {
            assert_eq!(out.previous_supply - moved, out.new_supply);
        } else {
            assert_eq!(out.previous_supply + moved, out.new_supply);
        }
    }
});
