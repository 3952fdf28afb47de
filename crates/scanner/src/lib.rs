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

//! Off-chain reconstruction of staking positions from indexed event logs and
//! batched contract reads.

// Declare modules
pub mod aggregate;
pub mod covalent;
pub mod error;
pub mod events;
pub mod multicall;
pub mod pipeline;
pub mod positions;

// Re-export commonly used types
pub use aggregate::{aggregate_durations, DurationReport};

pub use covalent::{
    block_ranges, BlockRange, CovalentClient, EventKind, FetchPolicy, RawLogEntry,
    DEFAULT_BLOCK_WINDOW, DEFAULT_COVALENT_URL, DEFAULT_PAGE_SIZE,
};

pub use error::ScanError;

pub use events::{decode_stake_opened, enumerate_positions, PositionCounts, StakeOpenedEvent};

pub use multicall::{MulticallClient, DEFAULT_CHUNK_SIZE};

pub use pipeline::{run_scan, ScanOptions, ScanReport};

pub use positions::{expand_calls, PositionCall, ResolvedPosition};
