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

//! Client for the Covalent block-indexing API.

use std::fmt;
use std::time::Duration;

use alloy::{
    primitives::{Address, B256},
    sol_types::SolEvent,
};
use serde::Deserialize;
use stakescan_contracts::IStaking;
use url::Url;

use crate::error::ScanError;

/// Public root of the Covalent HTTP API.
pub const DEFAULT_COVALENT_URL: &str = "https://api.covalenthq.com/v1";
/// Blocks covered by one log page request.
pub const DEFAULT_BLOCK_WINDOW: u64 = 1_000_000;
/// Maximum log entries returned per page.
pub const DEFAULT_PAGE_SIZE: u64 = 100_000;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Staking contract event kinds the indexing API is queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Stake,
    Unstake,
}

impl EventKind {
    /// Topic hash selecting this event kind.
    pub fn topic(&self) -> B256 {
        match self {
            EventKind::Stake => IStaking::Stake::SIGNATURE_HASH,
            EventKind::Unstake => IStaking::Unstake::SIGNATURE_HASH,
        }
    }
}

/// Half-open block range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub start: u64,
    pub end: u64,
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Tile `[start, end)` into consecutive ranges of at most `window` blocks.
/// The last range is clipped to `end`.
pub fn block_ranges(start: u64, end: u64, window: u64) -> impl Iterator<Item = BlockRange> {
    let window = window.max(1);
    (start..end)
        .step_by(window as usize)
        .map(move |range_start| BlockRange { start: range_start, end: (range_start + window).min(end) })
}

/// What to do when a log page cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FetchPolicy {
    /// Log the failed range and continue. Events in that range are lost.
    BestEffort,
    /// Abort the run on the first failed page.
    FailFast,
}

/// One event log entry as returned by the indexing API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLogEntry {
    /// Block containing the event.
    pub block_height: u64,
    /// Index of the log within its block.
    #[serde(default)]
    pub log_offset: u64,
    /// Hex-encoded event payload.
    pub raw_log_data: String,
}

#[derive(Debug, Deserialize)]
struct PagedItems {
    items: Vec<RawLogEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    data: Option<PagedItems>,
    #[serde(default)]
    error: bool,
    error_message: Option<String>,
}

/// Client for the Covalent `events/topics` endpoint, scoped to one contract.
#[derive(Debug, Clone)]
pub struct CovalentClient {
    http: reqwest::Client,
    base_url: Url,
    chain_id: u64,
    api_key: String,
    contract: Address,
    page_size: u64,
    retries: u32,
}

impl CovalentClient {
    pub fn new(
        base_url: Url,
        chain_id: u64,
        api_key: impl Into<String>,
        contract: Address,
        page_size: u64,
        retries: u32,
        timeout: Duration,
    ) -> Result<Self, ScanError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            chain_id,
            api_key: api_key.into(),
            contract,
            page_size,
            retries,
        })
    }

    /// Fetch all logs of `kind` emitted by the contract within `range`,
    /// retrying transient failures up to the configured budget.
    pub async fn fetch_logs(
        &self,
        range: BlockRange,
        kind: EventKind,
    ) -> Result<Vec<RawLogEntry>, ScanError> {
        let mut attempt = 0;
        loop {
            match self.fetch_page(range, kind).await {
                Ok(items) => return Ok(items),
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!("log page {range} attempt {attempt} failed: {err}");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_page(
        &self,
        range: BlockRange,
        kind: EventKind,
    ) -> Result<Vec<RawLogEntry>, ScanError> {
        let url = self.page_url(range, kind);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let body: ApiResponse = response.json().await?;
        if body.error {
            return Err(ScanError::Api(
                body.error_message.unwrap_or_else(|| "unspecified indexing API error".into()),
            ));
        }
        Ok(body.data.map(|data| data.items).unwrap_or_default())
    }

    // The API's ending-block bound is inclusive; ranges are half-open.
    fn page_url(&self, range: BlockRange, kind: EventKind) -> String {
        format!(
            "{}/{}/events/topics/{}/?starting-block={}&ending-block={}&page-size={}&key={}&sender-address={}",
            self.base_url.as_str().trim_end_matches('/'),
            self.chain_id,
            kind.topic(),
            range.start,
            range.end.saturating_sub(1),
            self.page_size,
            self.api_key,
            self.contract,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, keccak256};

    #[test]
    fn topics_match_event_signatures() {
        assert_eq!(EventKind::Stake.topic(), keccak256("Stake(uint256,address)"));
        assert_eq!(EventKind::Unstake.topic(), keccak256("Unstake(uint256,address)"));
    }

    #[test]
    fn ranges_tile_the_window() {
        let ranges: Vec<_> = block_ranges(0, 2_500_000, 1_000_000).collect();
        assert_eq!(
            ranges,
            vec![
                BlockRange { start: 0, end: 1_000_000 },
                BlockRange { start: 1_000_000, end: 2_000_000 },
                BlockRange { start: 2_000_000, end: 2_500_000 },
            ]
        );

        // Exact multiple of the window: no empty trailing range.
        let ranges: Vec<_> = block_ranges(100, 300, 100).collect();
        assert_eq!(
            ranges,
            vec![BlockRange { start: 100, end: 200 }, BlockRange { start: 200, end: 300 }]
        );
    }

    #[test]
    fn ranges_cover_every_block_exactly_once() {
        let ranges: Vec<_> = block_ranges(17, 1042, 64).collect();
        let mut expected_start = 17;
        for range in &ranges {
            assert_eq!(range.start, expected_start);
            assert!(range.end > range.start);
            expected_start = range.end;
        }
        assert_eq!(expected_start, 1042);
    }

    #[test]
    fn empty_window_yields_no_ranges() {
        assert_eq!(block_ranges(500, 500, 1_000_000).count(), 0);
        assert_eq!(block_ranges(500, 400, 1_000_000).count(), 0);
    }

    #[test]
    fn page_url_shape() {
        let client = CovalentClient::new(
            Url::parse(DEFAULT_COVALENT_URL).unwrap(),
            56,
            "test-key",
            address!("0x50c50569c9706A9a3034AFefa954CECa78859853"),
            100_000,
            0,
            Duration::from_secs(30),
        )
        .unwrap();

        let url = client.page_url(BlockRange { start: 100, end: 1_000_100 }, EventKind::Stake);
        assert!(url.starts_with("https://api.covalenthq.com/v1/56/events/topics/0x"));
        assert!(url.contains("starting-block=100"));
        assert!(url.contains("ending-block=1000099"));
        assert!(url.contains("page-size=100000"));
        assert!(url.contains("key=test-key"));
        assert!(url
            .to_lowercase()
            .contains("sender-address=0x50c50569c9706a9a3034afefa954ceca78859853"));
    }

    #[test]
    fn response_envelope_parses() {
        let body = r#"{
            "data": {
                "items": [
                    {
                        "block_height": 17000001,
                        "log_offset": 3,
                        "raw_log_data": "0xdeadbeef"
                    }
                ]
            },
            "error": false,
            "error_message": null
        }"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.error);
        let items = parsed.data.unwrap().items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].block_height, 17000001);
        assert_eq!(items[0].raw_log_data, "0xdeadbeef");
    }

    #[test]
    fn error_envelope_parses() {
        let body = r#"{"data": null, "error": true, "error_message": "backend unavailable"}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.error);
        assert_eq!(parsed.error_message.as_deref(), Some("backend unavailable"));
    }
}
