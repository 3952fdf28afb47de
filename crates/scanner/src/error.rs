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

//! Error taxonomy for the scanning pipeline.

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// A log page request failed in transit.
    #[error("indexing API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The indexing API answered with an error envelope.
    #[error("indexing API error: {0}")]
    Api(String),

    /// Malformed log payload or ABI return data. Aggregation cannot proceed
    /// on corrupted alignment, so this aborts the run.
    #[error("decode failure: {0}")]
    Decode(String),

    /// A resolved position whose unlock time precedes its staking time.
    #[error("position {account}#{index}: unlock time {unlock_at} precedes staking time {opened_at}")]
    Invariant { account: Address, index: u64, opened_at: u64, unlock_at: u64 },

    /// The aggregate contract call reverted or the RPC endpoint failed.
    #[error("aggregate call failed: {0}")]
    ChainCall(#[from] alloy::contract::Error),
}
