// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! Typed bindings for every call this crate encodes: token transfers, allowance
//! reads/writes and the batch executor entry point. Nothing is packed by hand.

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IERC721 {
        function getApproved(uint256 tokenId) external view returns (address);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
        function approve(address to, uint256 tokenId) external;
        function transferFrom(address from, address to, uint256 tokenId) external;
    }

    /// Delegate that replays a list of calls atomically; reverts the whole batch on any failure.
    #[derive(Debug, PartialEq, Eq)]
    interface IBatchExecutor {
        function executeBatch(
            address[] calldata targets,
            uint256[] calldata values,
            bytes[] calldata calldatas
        ) external payable;

        error CallFailed(uint256 index, bytes reason);
        error LengthMismatch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes, U256};
    use alloy_sol_types::SolCall;

    #[test]
    fn transfer_selectors_match_the_token_standards() {
        assert_eq!(hex::encode(IERC20::transferCall::SELECTOR), "a9059cbb");
        assert_eq!(hex::encode(IERC20::transferFromCall::SELECTOR), "23b872dd");
        assert_eq!(hex::encode(IERC721::transferFromCall::SELECTOR), "23b872dd");
        assert_eq!(hex::encode(IERC20::approveCall::SELECTOR), "095ea7b3");
        assert_eq!(hex::encode(IERC20::allowanceCall::SELECTOR), "dd62ed3e");
        assert_eq!(hex::encode(IERC721::getApprovedCall::SELECTOR), "081812fc");
        assert_eq!(hex::encode(IERC721::isApprovedForAllCall::SELECTOR), "e985e9c5");
    }

    #[test]
    fn execute_batch_call_roundtrips() {
        let call = IBatchExecutor::executeBatchCall {
            targets: vec![Address::from([4u8; 20]), Address::from([5u8; 20])],
            values: vec![U256::from(7u64), U256::ZERO],
            calldatas: vec![Bytes::new(), Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb])],
        };
        let encoded = call.abi_encode();
        let decoded =
            IBatchExecutor::executeBatchCall::abi_decode(&encoded).expect("decode batch call");
        assert_eq!(decoded.targets, call.targets);
        assert_eq!(decoded.values, call.values);
        assert_eq!(decoded.calldatas, call.calldatas);
    }
}
