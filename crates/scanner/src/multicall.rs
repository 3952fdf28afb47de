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

//! Batched resolution of position reads through the multicall aggregator.

use std::time::Duration;

use alloy::{
    primitives::{Address, Bytes, U256},
    providers::Provider,
    sol_types::SolCall,
};
use stakescan_contracts::{IMulticall, IStaking};

use crate::error::ScanError;
use crate::positions::{PositionCall, ResolvedPosition};

/// Calls submitted per aggregate invocation.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Resolves position reads in bounded batches, preserving call order.
#[derive(Debug, Clone)]
pub struct MulticallClient<P> {
    provider: P,
    multicall_address: Address,
    staking_address: Address,
    retries: u32,
}

impl<P: Provider> MulticallClient<P> {
    pub fn new(
        provider: P,
        multicall_address: Address,
        staking_address: Address,
        retries: u32,
    ) -> Self {
        Self { provider, multicall_address, staking_address, retries }
    }

    /// Resolve every call, in order.
    ///
    /// The output has the same length and order as `calls` regardless of
    /// `chunk_size`; chunking only bounds the size of each aggregate
    /// submission. Chunks are submitted strictly sequentially.
    pub async fn resolve_all(
        &self,
        calls: &[PositionCall],
        chunk_size: usize,
    ) -> Result<Vec<ResolvedPosition>, ScanError> {
        let chunk_size = chunk_size.max(1);
        let mut resolved = Vec::with_capacity(calls.len());
        for chunk in calls.chunks(chunk_size) {
            let return_data = self.aggregate_chunk(chunk).await?;
            resolved.extend(decode_chunk(chunk, &return_data)?);
            tracing::debug!("resolved {}/{} position reads", resolved.len(), calls.len());
        }
        Ok(resolved)
    }

    /// Submit one chunk through `aggregate`, retrying transient RPC failures.
    async fn aggregate_chunk(&self, chunk: &[PositionCall]) -> Result<Vec<Bytes>, ScanError> {
        let multicall = IMulticall::new(self.multicall_address, &self.provider);
        let calls = encode_chunk(self.staking_address, chunk);
        let mut attempt = 0;
        loop {
            match multicall.aggregate(calls.clone()).call().await {
                Ok(returned) => return Ok(returned.returnData),
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(
                        "aggregate of {} calls, attempt {attempt} failed: {err}",
                        chunk.len()
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) => return Err(ScanError::ChainCall(err)),
            }
        }
    }
}

/// ABI-encode a chunk of position reads against the staking contract.
fn encode_chunk(staking_address: Address, chunk: &[PositionCall]) -> Vec<IMulticall::Call> {
    chunk
        .iter()
        .map(|call| IMulticall::Call {
            target: staking_address,
            callData: IStaking::stakingInfoForAddressCall {
                account: call.account,
                index: U256::from(call.index),
            }
            .abi_encode()
            .into(),
        })
        .collect()
}

/// Decode one chunk's raw returns back into positions.
///
/// Each result is tagged with the `(account, index)` of the call that
/// produced it, and the result count must match the call count, so a
/// misalignment cannot pass silently.
fn decode_chunk(
    chunk: &[PositionCall],
    return_data: &[Bytes],
) -> Result<Vec<ResolvedPosition>, ScanError> {
    if return_data.len() != chunk.len() {
        return Err(ScanError::Decode(format!(
            "aggregate returned {} results for {} calls",
            return_data.len(),
            chunk.len()
        )));
    }
    chunk
        .iter()
        .zip(return_data)
        .map(|(call, data)| {
            let info =
                IStaking::stakingInfoForAddressCall::abi_decode_returns(data).map_err(|err| {
                    ScanError::Decode(format!("position {}#{}: {err}", call.account, call.index))
                })?;
            Ok(ResolvedPosition {
                account: call.account,
                index: call.index,
                opened_at: timestamp(info.stakingTime, call)?,
                unlock_at: timestamp(info.timeToUnlock, call)?,
                amount_staked: info.tokensStaked,
                is_alternate_plan: info.option,
            })
        })
        .collect()
}

fn timestamp(value: U256, call: &PositionCall) -> Result<u64, ScanError> {
    u64::try_from(value).map_err(|_| {
        ScanError::Decode(format!(
            "position {}#{}: timestamp {value} exceeds u64",
            call.account, call.index
        ))
    })
}
