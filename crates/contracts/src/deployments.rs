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

use alloy::primitives::{address, Address};
use clap::Args;
use derive_builder::Builder;

pub use alloy_chains::NamedChain;

/// Decimals exponent of the staked token.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 9;

/// Configuration for a deployment of the staking system.
// NOTE: See https://github.com/clap-rs/clap/issues/5092#issuecomment-1703980717 about clap usage.
#[non_exhaustive]
#[derive(Clone, Debug, Builder, Args)]
#[group(requires = "staking_address", requires = "multicall_address")]
pub struct Deployment {
    /// EIP-155 chain ID of the network.
    #[clap(long, env)]
    #[builder(setter(into, strip_option), default)]
    pub chain_id: Option<u64>,

    /// Address of the staking contract.
    ///
    /// All event queries and position reads are scoped to this contract.
    #[clap(long, env, required = false, long_help = "Address of the staking contract")]
    #[builder(setter(into))]
    pub staking_address: Address,

    /// Address of the multicall aggregator contract.
    #[clap(long, env, required = false, long_help = "Address of the multicall aggregator contract")]
    #[builder(setter(into))]
    pub multicall_address: Address,

    /// Decimals exponent used to scale raw staked amounts.
    #[clap(skip = DEFAULT_TOKEN_DECIMALS)]
    #[builder(default = "DEFAULT_TOKEN_DECIMALS")]
    pub token_decimals: u8,

    /// First block to scan for stake events (the staking contract's creation block).
    #[clap(skip)]
    #[builder(default)]
    pub from_block: u64,
}

impl Deployment {
    /// Create a new [DeploymentBuilder].
    pub fn builder() -> DeploymentBuilder {
        Default::default()
    }

    /// Lookup the [Deployment] for a named chain.
    pub const fn from_chain(chain: NamedChain) -> Option<Deployment> {
        match chain {
            NamedChain::BinanceSmartChain => Some(BSC),
            _ => None,
        }
    }

    /// Lookup the [Deployment] by chain ID.
    pub fn from_chain_id(chain_id: impl Into<u64>) -> Option<Deployment> {
        let chain = NamedChain::try_from(chain_id.into()).ok()?;
        Self::from_chain(chain)
    }
}

/// [Deployment] for the BNB Smart Chain mainnet.
pub const BSC: Deployment = Deployment {
    chain_id: Some(NamedChain::BinanceSmartChain as u64),
    staking_address: address!("0x50c50569c9706A9a3034AFefa954CECa78859853"),
    multicall_address: address!("0xcA11bde05977b3631167028862bE2a173976CA11"),
    token_decimals: DEFAULT_TOKEN_DECIMALS,
    from_block: 16_969_877,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_by_chain_id() {
        let deployment = Deployment::from_chain_id(56u64).unwrap();
        assert_eq!(deployment.staking_address, BSC.staking_address);
        assert_eq!(deployment.token_decimals, DEFAULT_TOKEN_DECIMALS);
        assert!(Deployment::from_chain_id(1u64).is_none());
    }
}
