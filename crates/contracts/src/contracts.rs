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

//! Smart contract interfaces used by the scanner.

use alloy::sol;

sol! {
    /// Read side of the staking contract.
    #[sol(rpc, all_derives)]
    interface IStaking {
        /// Emitted when an account opens a new stake position.
        /// `positionIndex` is the 0-based sequence number of the position
        /// within `account`.
        event Stake(uint256 positionIndex, address account);

        /// Emitted when an account exits a stake position.
        event Unstake(uint256 positionIndex, address account);

        /// Detail of one stake position, addressed by account and 0-based index.
        function stakingInfoForAddress(address account, uint256 index)
            external
            view
            returns (uint256 stakingTime, uint256 timeToUnlock, uint256 tokensStaked, bool option);
    }
}

sol! {
    /// On-chain read aggregator. Executes a batch of calls in one round trip
    /// and returns their raw results in call order.
    #[sol(rpc, all_derives)]
    interface IMulticall {
        struct Call {
            address target;
            bytes callData;
        }

        function aggregate(Call[] calldata calls)
            external
            view
            returns (uint256 blockNumber, bytes[] memory returnData);
    }
}
