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

//! Duration-bucketed aggregation of resolved positions.

use std::collections::BTreeMap;

use alloy::primitives::{utils::format_units, U256};

use crate::error::ScanError;
use crate::positions::ResolvedPosition;

/// Staked totals keyed by lock duration.
#[derive(Debug, Default)]
pub struct DurationReport {
    /// Token total per lock duration in seconds, in human-scale units.
    pub buckets: BTreeMap<u64, f64>,
    /// Positions excluded because their unlock time precedes their staking time.
    pub anomalies: Vec<ScanError>,
    /// Positions excluded because they were staked under the alternate plan.
    pub alternate_plan: u64,
}

/// Bucket staked amounts by lock duration (`unlock_at - opened_at`).
///
/// Alternate-plan positions are excluded from totals. A position with a
/// negative duration is excluded as well and reported as an anomaly rather
/// than aborting the run.
pub fn aggregate_durations(
    positions: &[ResolvedPosition],
    token_decimals: u8,
) -> Result<DurationReport, ScanError> {
    let mut report = DurationReport::default();
    for position in positions {
        let Some(duration) = position.unlock_at.checked_sub(position.opened_at) else {
            let anomaly = ScanError::Invariant {
                account: position.account,
                index: position.index,
                opened_at: position.opened_at,
                unlock_at: position.unlock_at,
            };
            tracing::warn!("excluding position from totals: {anomaly}");
            report.anomalies.push(anomaly);
            continue;
        };
        if position.is_alternate_plan {
            report.alternate_plan += 1;
            continue;
        }
        *report.buckets.entry(duration).or_insert(0.0) +=
            to_token_units(position.amount_staked, token_decimals)?;
    }
    Ok(report)
}

/// Convert a raw token amount to human-scale units.
fn to_token_units(amount: U256, decimals: u8) -> Result<f64, ScanError> {
    format_units(amount, decimals)
        .ok()
        .and_then(|formatted| formatted.parse::<f64>().ok())
        .ok_or_else(|| {
            ScanError::Decode(format!("cannot convert amount {amount} with {decimals} decimals"))
        })
}
