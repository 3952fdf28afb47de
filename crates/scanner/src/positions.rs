// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Expansion of position counts into read calls, and the resolved results.

use alloy::primitives::{Address, U256};

use crate::events::PositionCounts;

/// One pending `stakingInfoForAddress(account, index)` read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionCall {
    pub account: Address,
    pub index: u64,
}

/// Expand per-account counts into one call per position.
///
/// Accounts appear in first-seen order with indices ascending and contiguous.
/// The resolver aligns decoded results back to this order, so it must be
/// preserved end-to-end.
pub fn expand_calls(counts: &PositionCounts) -> Vec<PositionCall> {
    let mut calls = Vec::with_capacity(counts.total() as usize);
    for (account, count) in counts.iter() {
        for index in 0..count {
            calls.push(PositionCall { account, index });
        }
    }
    calls
}

/// A decoded stake position, tagged with the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPosition {
    /// Account owning the position.
    pub account: Address,
    /// Position index within the account.
    pub index: u64,
    /// Unix time the position was opened.
    pub opened_at: u64,
    /// Unix time the position unlocks.
    pub unlock_at: u64,
    /// Staked amount in raw token units.
    pub amount_staked: U256,
    /// Whether the position was staked under the alternate plan.
    pub is_alternate_plan: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{enumerate_positions, StakeOpenedEvent};
    use alloy::primitives::address;

    const ALICE: Address = address!("0x1111111111111111111111111111111111111111");
    const BOB: Address = address!("0x2222222222222222222222222222222222222222");

    #[test]
    fn expands_counts_in_account_then_index_order() {
        let counts = enumerate_positions([
            StakeOpenedEvent { account: ALICE, position_index: 1 },
            StakeOpenedEvent { account: BOB, position_index: 0 },
        ]);
        let calls = expand_calls(&counts);
        assert_eq!(
            calls,
            vec![
                PositionCall { account: ALICE, index: 0 },
                PositionCall { account: ALICE, index: 1 },
                PositionCall { account: BOB, index: 0 },
            ]
        );
    }

    #[test]
    fn call_count_is_sum_of_counts() {
        let counts = enumerate_positions([
            StakeOpenedEvent { account: ALICE, position_index: 6 },
            StakeOpenedEvent { account: BOB, position_index: 2 },
        ]);
        let calls = expand_calls(&counts);
        assert_eq!(calls.len() as u64, counts.total());

        // Per account, indices are ascending and contiguous.
        let alice_indices: Vec<_> =
            calls.iter().filter(|call| call.account == ALICE).map(|call| call.index).collect();
        assert_eq!(alice_indices, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn empty_counts_expand_to_no_calls() {
        let counts = enumerate_positions([]);
        assert!(expand_calls(&counts).is_empty());
    }
}
