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

//! End-to-end reconstruction pipeline: fetch, decode, enumerate, expand,
//! resolve, aggregate.

use std::collections::BTreeMap;

use alloy::providers::Provider;
use stakescan_contracts::Deployment;

use crate::aggregate::{aggregate_durations, DurationReport};
use crate::covalent::{block_ranges, BlockRange, CovalentClient, EventKind, FetchPolicy};
use crate::error::ScanError;
use crate::events::{decode_stake_opened, enumerate_positions};
use crate::multicall::MulticallClient;
use crate::positions::{expand_calls, ResolvedPosition};

/// Options for one scan run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// First block to scan.
    pub start_block: u64,
    /// End of the scan window (exclusive); the current chain height if unset.
    pub end_block: Option<u64>,
    /// Blocks per log page request.
    pub block_window: u64,
    /// Calls per aggregate submission.
    pub chunk_size: usize,
    /// Policy for failed log pages.
    pub fetch_policy: FetchPolicy,
    /// Retries per aggregate submission.
    pub retries: u32,
}

/// Outcome of a scan run.
#[derive(Debug)]
pub struct ScanReport {
    /// Number of position reads issued.
    pub total_calls: usize,
    /// First resolved position, as a decode diagnostic.
    pub first_position: Option<ResolvedPosition>,
    /// Staked totals by lock duration in seconds.
    pub buckets: BTreeMap<u64, f64>,
    /// Positions excluded for violating the duration invariant.
    pub anomalies: usize,
    /// Distinct accounts that ever opened a position.
    pub distinct_accounts: usize,
    /// Log pages skipped under the best-effort fetch policy. Stake events in
    /// these ranges are missing from the totals.
    pub skipped_ranges: Vec<BlockRange>,
}

/// Run the full reconstruction pipeline.
///
/// Every external call is awaited before the next is issued: pagination
/// proceeds in increasing block order and chunk resolution in chunk order,
/// so the output is a deterministic function of the chain state.
pub async fn run_scan<P: Provider>(
    provider: &P,
    covalent: &CovalentClient,
    deployment: &Deployment,
    opts: &ScanOptions,
) -> Result<ScanReport, ScanError> {
    let end_block = match opts.end_block {
        Some(block) => block,
        None => {
            provider.get_block_number().await.map_err(|err| ScanError::ChainCall(err.into()))?
        }
    };
    tracing::info!("scanning stake events in blocks [{}, {})", opts.start_block, end_block);

    let mut raw_logs = Vec::new();
    let mut skipped_ranges = Vec::new();
    for range in block_ranges(opts.start_block, end_block, opts.block_window) {
        match covalent.fetch_logs(range, EventKind::Stake).await {
            Ok(items) => {
                tracing::debug!("blocks {range}: {} stake logs", items.len());
                raw_logs.extend(items);
            }
            Err(err) if opts.fetch_policy == FetchPolicy::BestEffort => {
                tracing::warn!(
                    "skipping blocks {range}: {err}; stake events in this range are lost"
                );
                skipped_ranges.push(range);
            }
            Err(err) => return Err(err),
        }
    }
    tracing::info!("fetched {} stake logs", raw_logs.len());

    let events =
        raw_logs.iter().map(decode_stake_opened).collect::<Result<Vec<_>, ScanError>>()?;
    let counts = enumerate_positions(events);
    let calls = expand_calls(&counts);
    tracing::info!("{} accounts opened {} positions", counts.len(), calls.len());

    let resolver = MulticallClient::new(
        provider,
        deployment.multicall_address,
        deployment.staking_address,
        opts.retries,
    );
    let positions = resolver.resolve_all(&calls, opts.chunk_size).await?;

    let DurationReport { buckets, anomalies, alternate_plan } =
        aggregate_durations(&positions, deployment.token_decimals)?;
    if alternate_plan > 0 {
        tracing::info!("{alternate_plan} alternate-plan positions excluded from totals");
    }

    Ok(ScanReport {
        total_calls: calls.len(),
        first_position: positions.first().cloned(),
        buckets,
        anomalies: anomalies.len(),
        distinct_accounts: counts.len(),
        skipped_ranges,
    })
}
