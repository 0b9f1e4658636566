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

//! Contract interfaces of the geyser, the elastic token and the bridge mint
//! adapter, plus decoding of the multi-value returns into harness records.

use crate::core::types::{AccountingTuple, ScaledAmount, Stake, UnlockSchedule};
use alloy::sol;
use alloy::sol_types::SolCall;
use thiserror::Error;

sol! {
    /// Token geyser: staking pools, unlock schedules and reward accounting.
    interface IGeyser {
        function totalLocked() external view returns (uint256);
        function totalUnlocked() external view returns (uint256);
        function totalStaked() external view returns (uint256);
        function totalLockedShares() external view returns (uint256);
        function totalStakingShares() external view returns (uint256);
        function totalHarvested() external view returns (uint256);
        function totalUnclaimedStakingShareSeconds() external view returns (uint256);
        function unlockScheduleCount() external view returns (uint256);
        function unlockSchedules(uint256 index) external view returns (
            uint256 initialLockedShares,
            uint256 unlockedShares,
            uint256 lastUnlockTimestampSec,
            uint256 endAtSec,
            uint256 durationSec,
            uint256 startTime
        );
        function totalStakedFor(address addr) external view returns (uint256);
        function getNumStakes(address user) external view returns (uint256);
        function getStake(address user, uint256 index) external view returns (
            uint256 stakingShares,
            uint256 timestampSec,
            uint256 lastHarvestTimestampSec
        );
        function getStakeRewardMultiplier(address user, uint256 index)
            external view returns (uint256);
        function updateAccounting() external returns (
            uint256 totalLocked,
            uint256 totalUnlocked,
            uint256 stakingShareSeconds,
            uint256 totalStakingShareSeconds,
            uint256 totalUserRewards,
            uint256 timestamp,
            uint256 userRewards,
            uint256 founderRewards
        );
        function harvestQuery() external returns (uint256 rewards);
        function claimRewardsQuery() external returns (uint256 rewards);
        function lockTokens(uint256 amount, uint256 durationSec, uint256 startTime) external;
        function stake(uint256 amount, bytes data) external;
        function unstake(uint256 amount, bytes data) external;
    }

    /// Elastic-supply (rebasing) token.
    interface IElasticToken {
        function totalSupply() external view returns (uint256);
        function balanceOf(address who) external view returns (uint256);
        function transfer(address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);
        function rebase(uint256 epoch, int256 supplyDelta) external returns (uint256);
    }

    /// Bridge-side mint entry point.
    interface IMintAdapter {
        function mint(address _to, uint256 _amount) external;
    }
}

/// Return-data decoding errors.
#[derive(Debug, Error)]
pub enum AbiError {
    /// Data does not match the declared return types.
    #[error(transparent)]
    Sol(#[from] alloy::sol_types::Error),
    /// A time field does not fit a machine timestamp.
    #[error("{field} does not fit a u64 timestamp")]
    Timestamp {
        /// Offending return field.
        field: &'static str,
    },
}

/// Narrow a timestamp / count word to `u64`.
pub fn to_u64(v: ScaledAmount, field: &'static str) -> Result<u64, AbiError> {
    u64::try_from(v).map_err(|_| AbiError::Timestamp { field })
}

/// Decode the 8-value `updateAccounting` return data.
pub fn decode_accounting(data: &[u8]) -> Result<AccountingTuple, AbiError> {
    accounting_tuple(IGeyser::updateAccountingCall::abi_decode_returns(data, true)?)
}

/// Name the 8-value `updateAccounting` return.
pub fn accounting_tuple(r: IGeyser::updateAccountingReturn) -> Result<AccountingTuple, AbiError> {
    Ok(AccountingTuple {
        total_locked: r.totalLocked,
        total_unlocked: r.totalUnlocked,
        staking_share_seconds: r.stakingShareSeconds,
        total_staking_share_seconds: r.totalStakingShareSeconds,
        total_user_rewards: r.totalUserRewards,
        now: to_u64(r.timestamp, "timestamp")?,
        user_rewards: r.userRewards,
        founder_rewards: r.founderRewards,
    })
}

/// Decode `unlockSchedules(index)`.
pub fn decode_unlock_schedule(
    r: IGeyser::unlockSchedulesReturn,
) -> Result<UnlockSchedule, AbiError> {
    Ok(UnlockSchedule {
        initial_locked_shares: r.initialLockedShares,
        unlocked_shares: r.unlockedShares,
        last_unlock_timestamp_sec: to_u64(r.lastUnlockTimestampSec, "lastUnlockTimestampSec")?,
        end_at_sec: to_u64(r.endAtSec, "endAtSec")?,
        duration_sec: to_u64(r.durationSec, "durationSec")?,
        start_time: to_u64(r.startTime, "startTime")?,
    })
}

/// Decode `getStake(user, index)`.
pub fn decode_stake(r: IGeyser::getStakeReturn) -> Result<Stake, AbiError> {
    Ok(Stake {
        staking_shares: r.stakingShares,
        timestamp_sec: to_u64(r.timestampSec, "timestampSec")?,
        last_harvest_timestamp_sec: to_u64(r.lastHarvestTimestampSec, "lastHarvestTimestampSec")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, I256, U256};

    fn accounting_words(words: [U256; 8]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes::<32>()).collect()
    }

    #[test]
    fn well_known_selectors() {
        assert_eq!(IElasticToken::transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(IElasticToken::totalSupplyCall::SELECTOR, [0x18, 0x16, 0x0d, 0xdd]);
        assert_eq!(IElasticToken::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IGeyser::stakeCall::SIGNATURE, "stake(uint256,bytes)");
    }

    #[test]
    fn negative_int_is_sign_extended() {
        let data = IElasticToken::rebaseCall {
            epoch: U256::from(1),
            supplyDelta: I256::MINUS_ONE,
        }
        .abi_encode();
        assert_eq!(data.len(), 4 + 2 * 32);
        assert!(data[4 + 32..].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn empty_bytes_has_offset_and_zero_length() {
        let data = IGeyser::stakeCall {
            amount: U256::from(5),
            data: Bytes::new(),
        }
        .abi_encode();
        // selector + amount + offset + length
        assert_eq!(data.len(), 4 + 3 * 32);
        assert_eq!(U256::from_be_slice(&data[4..36]), U256::from(5));
        assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(64));
        assert_eq!(U256::from_be_slice(&data[68..100]), U256::ZERO);
    }

    #[test]
    fn accounting_rejects_short_data() {
        let data = accounting_words([U256::from(1); 8]);
        assert!(matches!(
            decode_accounting(&data[..7 * 32]),
            Err(AbiError::Sol(_))
        ));
    }

    #[test]
    fn wide_share_seconds_decode_in_full() {
        let wide = U256::from(1u8) << 200;
        let mut words = [U256::from(7); 8];
        words[2] = wide;
        words[3] = wide + U256::from(1);
        words[5] = U256::from(1_600_000_000u64);
        let tuple = decode_accounting(&accounting_words(words)).unwrap();
        assert_eq!(tuple.staking_share_seconds, wide);
        assert_eq!(tuple.total_staking_share_seconds, wide + U256::from(1));
        assert_eq!(tuple.now, 1_600_000_000);
    }

    #[test]
    fn oversized_timestamp_is_rejected() {
        let mut words = [U256::ZERO; 8];
        words[5] = U256::from(u64::MAX) + U256::from(1);
        assert!(matches!(
            decode_accounting(&accounting_words(words)),
            Err(AbiError::Timestamp { field: "timestamp" })
        ));
    }
}
