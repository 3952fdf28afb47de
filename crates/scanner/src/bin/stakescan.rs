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

use std::time::Duration;

use alloy::{
    providers::{fillers::ChainIdFiller, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use anyhow::{Context, Result};
use clap::Parser;
use stakescan::{
    run_scan, CovalentClient, FetchPolicy, ScanOptions, DEFAULT_BLOCK_WINDOW, DEFAULT_CHUNK_SIZE,
    DEFAULT_COVALENT_URL, DEFAULT_PAGE_SIZE,
};
use stakescan_contracts::Deployment;
use url::Url;

/// Arguments of the staking-position scanner.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    /// URL of the chain RPC endpoint.
    #[clap(short, long, env)]
    rpc_url: Url,

    /// Base URL of the block-indexing API.
    #[clap(long, env, default_value = DEFAULT_COVALENT_URL)]
    covalent_url: Url,

    /// API key for the block-indexing API.
    #[clap(long, env = "COVALENT_API_KEY")]
    covalent_key: String,

    /// Deployment to scan; defaults to the chain's known deployment.
    #[clap(flatten, next_help_heading = "Staking Deployment")]
    deployment: Option<Deployment>,

    /// First block to scan (defaults to the deployment's creation block).
    #[clap(long, env)]
    start_block: Option<u64>,

    /// End of the scan window, exclusive (defaults to the current height).
    #[clap(long, env)]
    end_block: Option<u64>,

    /// Blocks covered by one log page request.
    #[clap(long, default_value_t = DEFAULT_BLOCK_WINDOW)]
    block_window: u64,

    /// Maximum log entries per page.
    #[clap(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u64,

    /// Position reads per aggregate submission.
    #[clap(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// What to do when a log page cannot be fetched.
    #[clap(long, value_enum, default_value_t = FetchPolicy::BestEffort)]
    fetch_policy: FetchPolicy,

    /// Number of retries per network call.
    #[clap(long, default_value = "3")]
    retries: u32,

    /// Timeout in seconds for indexing API requests.
    #[clap(long, default_value = "30")]
    timeout: u64,

    /// Whether to log in JSON format.
    #[clap(long, env, default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = MainArgs::parse();

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();

    if args.log_json {
        tracing_subscriber::fmt().with_ansi(false).json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_ansi(false).with_env_filter(filter).init();
    }

    let result = run(&args).await;
    if let Err(err) = &result {
        tracing::error!("FATAL: {err:?}");
    }
    result
}

async fn run(args: &MainArgs) -> Result<()> {
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .filler(ChainIdFiller::default())
        .connect_client(
            RpcClient::builder()
                .layer(RetryBackoffLayer::new(args.retries, 1000, 200))
                .http(args.rpc_url.clone()),
        );
    let chain_id = provider.get_chain_id().await?;

    let deployment = args
        .deployment
        .clone()
        .or_else(|| Deployment::from_chain_id(chain_id))
        .with_context(|| format!("no known deployment for chain ID {chain_id}"))?;
    tracing::info!("scanning staking contract {} on chain {chain_id}", deployment.staking_address);

    let covalent = CovalentClient::new(
        args.covalent_url.clone(),
        chain_id,
        args.covalent_key.clone(),
        deployment.staking_address,
        args.page_size,
        args.retries,
        Duration::from_secs(args.timeout),
    )?;

    let opts = ScanOptions {
        start_block: args.start_block.unwrap_or(deployment.from_block),
        end_block: args.end_block,
        block_window: args.block_window,
        chunk_size: args.chunk_size,
        fetch_policy: args.fetch_policy,
        retries: args.retries,
    };

    let report = run_scan(&provider, &covalent, &deployment, &opts).await?;

    if !report.skipped_ranges.is_empty() {
        tracing::warn!(
            "{} log pages were skipped; totals may undercount. Skipped ranges: {:?}",
            report.skipped_ranges.len(),
            report.skipped_ranges
        );
    }
    if report.anomalies > 0 {
        tracing::warn!("{} positions excluded for violating the duration invariant", report.anomalies);
    }

    println!("total position reads: {}", report.total_calls);
    if let Some(first) = &report.first_position {
        println!("first position: {first:?}");
    }
    println!("staked totals by lock duration:");
    for (duration, total) in &report.buckets {
        println!("  {duration}s: {total}");
    }
    println!("total stakers: {}", report.distinct_accounts);

    Ok(())
}
