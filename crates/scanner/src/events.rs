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

//! Decoding of raw stake logs and per-account position counting.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use alloy::primitives::{Address, U256};

use crate::covalent::RawLogEntry;
use crate::error::ScanError;

/// A decoded `Stake` event: `account` opened the position at `position_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeOpenedEvent {
    pub account: Address,
    pub position_index: u64,
}

/// Decode a raw log payload into a [StakeOpenedEvent].
///
/// The payload is two 32-byte ABI words: the position index, then the
/// account address left-padded to a word. Payload length and padding are
/// validated before extraction.
pub fn decode_stake_opened(entry: &RawLogEntry) -> Result<StakeOpenedEvent, ScanError> {
    let payload = entry.raw_log_data.strip_prefix("0x").unwrap_or(&entry.raw_log_data);
    let bytes = hex::decode(payload).map_err(|err| {
        ScanError::Decode(format!(
            "log at block {} offset {}: invalid hex payload: {err}",
            entry.block_height, entry.log_offset
        ))
    })?;
    if bytes.len() != 64 {
        return Err(ScanError::Decode(format!(
            "log at block {} offset {}: expected 64-byte payload, got {} bytes",
            entry.block_height,
            entry.log_offset,
            bytes.len()
        )));
    }

    let index = U256::from_be_slice(&bytes[..32]);
    let position_index = u64::try_from(index).map_err(|_| {
        ScanError::Decode(format!(
            "log at block {} offset {}: position index {index} exceeds u64",
            entry.block_height, entry.log_offset
        ))
    })?;

    if bytes[32..44].iter().any(|byte| *byte != 0) {
        return Err(ScanError::Decode(format!(
            "log at block {} offset {}: account word has nonzero padding",
            entry.block_height, entry.log_offset
        )));
    }
    let account = Address::from_slice(&bytes[44..]);

    Ok(StakeOpenedEvent { account, position_index })
}

/// Number of positions each account has ever opened, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct PositionCounts {
    counts: HashMap<Address, u64>,
    order: Vec<Address>,
}

impl PositionCounts {
    /// Number of distinct accounts observed.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Positions opened by `account`.
    pub fn get(&self, account: Address) -> u64 {
        self.counts.get(&account).copied().unwrap_or(0)
    }

    /// Accounts with their counts, in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (Address, u64)> + '_ {
        self.order.iter().map(|account| (*account, self.counts[account]))
    }

    /// Total positions across all accounts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    fn record(&mut self, account: Address, position_index: u64) {
        let count = position_index.saturating_add(1);
        match self.counts.entry(account) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get_mut();
                *current = (*current).max(count);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(count);
                self.order.push(account);
            }
        }
    }
}

/// Fold decoded events into per-account position counts.
///
/// The count is the highest observed position index plus one, so duplicated
/// or reordered events from the indexing API cannot lower it.
pub fn enumerate_positions(
    events: impl IntoIterator<Item = StakeOpenedEvent>,
) -> PositionCounts {
    let mut counts = PositionCounts::default();
    for event in events {
        counts.record(event.account, event.position_index);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const ALICE: Address = address!("0x1111111111111111111111111111111111111111");
    const BOB: Address = address!("0x2222222222222222222222222222222222222222");

    fn entry(raw_log_data: &str) -> RawLogEntry {
        RawLogEntry { block_height: 17_000_000, log_offset: 0, raw_log_data: raw_log_data.into() }
    }

    fn stake_payload(position_index: u64, account: Address) -> String {
        let mut bytes = [0u8; 64];
        bytes[24..32].copy_from_slice(&position_index.to_be_bytes());
        bytes[44..].copy_from_slice(account.as_slice());
        format!("0x{}", hex::encode(bytes))
    }

    #[test]
    fn decodes_well_formed_payload() {
        let event = decode_stake_opened(&entry(&stake_payload(5, ALICE))).unwrap();
        assert_eq!(event.account, ALICE);
        assert_eq!(event.position_index, 5);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = decode_stake_opened(&entry("0x00")).unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)), "{err}");

        let long = format!("0x{}", hex::encode([0u8; 96]));
        let err = decode_stake_opened(&entry(&long)).unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)), "{err}");
    }

    #[test]
    fn rejects_invalid_hex() {
        let err = decode_stake_opened(&entry("0xzz")).unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)), "{err}");
    }

    #[test]
    fn rejects_nonzero_account_padding() {
        let mut payload = stake_payload(1, ALICE);
        // Corrupt the first padding byte of the account word.
        payload.replace_range(66..68, "ff");
        let err = decode_stake_opened(&entry(&payload)).unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)), "{err}");
    }

    #[test]
    fn rejects_oversized_position_index() {
        let mut bytes = [0u8; 64];
        bytes[0] = 1;
        bytes[44..].copy_from_slice(ALICE.as_slice());
        let payload = format!("0x{}", hex::encode(bytes));
        let err = decode_stake_opened(&entry(&payload)).unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)), "{err}");
    }

    fn event(account: Address, position_index: u64) -> StakeOpenedEvent {
        StakeOpenedEvent { account, position_index }
    }

    #[test]
    fn counts_are_highest_index_plus_one() {
        let counts = enumerate_positions([event(ALICE, 3), event(ALICE, 1), event(BOB, 0)]);
        assert_eq!(counts.get(ALICE), 4);
        assert_eq!(counts.get(BOB), 1);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn counts_are_invariant_under_reordering() {
        let forward = enumerate_positions([
            event(ALICE, 0),
            event(ALICE, 1),
            event(BOB, 0),
            event(ALICE, 2),
        ]);
        let shuffled = enumerate_positions([
            event(ALICE, 2),
            event(BOB, 0),
            event(ALICE, 0),
            event(ALICE, 1),
        ]);
        for account in [ALICE, BOB] {
            assert_eq!(forward.get(account), shuffled.get(account));
        }
        assert_eq!(forward.total(), shuffled.total());
    }

    #[test]
    fn duplicate_events_do_not_inflate_counts() {
        let counts = enumerate_positions([event(ALICE, 1), event(ALICE, 1), event(ALICE, 1)]);
        assert_eq!(counts.get(ALICE), 2);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn iteration_preserves_first_seen_order() {
        let counts = enumerate_positions([event(BOB, 0), event(ALICE, 0), event(BOB, 1)]);
        let accounts: Vec<_> = counts.iter().map(|(account, _)| account).collect();
        assert_eq!(accounts, vec![BOB, ALICE]);
    }

    #[test]
    fn unknown_account_has_zero_positions() {
        let counts = enumerate_positions([]);
        assert!(counts.is_empty());
        assert_eq!(counts.get(ALICE), 0);
    }
}
