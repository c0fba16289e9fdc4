// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, TxKind, U256, address};
use alloy::rpc::types::TransactionRequest;
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use mitander_migrate::data::abi::{IERC20, IERC721};
use mitander_migrate::domain::asset::Asset;
use mitander_migrate::domain::constants::{
    CHAIN_SEPOLIA, DEFAULT_GAS_LIMIT_MULTIPLIER_BPS, NetworkDescriptor, NetworkTable,
};
use mitander_migrate::network::session::{TxOutcome, WalletError, WalletSession};
use mitander_migrate::services::estimator::CostEstimator;
use mitander_migrate::services::execution::ExecutionEngine;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

pub const OWNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
pub const RECIPIENT: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
pub const EXECUTOR: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
pub const USDC: Address = address!("1c7d4b196cb0c7b01d743fbc6116a902379c7238");
pub const ART: Address = address!("e7f1725e7734ce288f8367e1bb143e90bb3f0512");
pub const ESTIMATED_GAS: u64 = 60_000;

/// Scripted wallet: chain switching, token approvals and per-send outcomes are all
/// driven by `MockState`.
pub struct MockWallet {
    pub account: Option<Address>,
    state: Mutex<MockState>,
}

#[derive(Default)]
pub struct MockState {
    pub chain: u64,
    /// Switch and add requests move the wallet; otherwise they report success and do nothing.
    pub accept_switch: bool,
    /// Switch requests fail with this code instead.
    pub switch_error: Option<i64>,
    pub switch_calls: usize,
    pub add_calls: usize,
    /// (token, spender) -> allowance.
    pub allowances: HashMap<(Address, Address), U256>,
    /// (collection, token id) -> approved address.
    pub nft_approved: HashMap<(Address, U256), Address>,
    /// (collection, operator) pairs approved for all.
    pub operators: HashSet<(Address, Address)>,
    pub nft_collections: HashSet<Address>,
    /// token -> owner balance reported by `balanceOf`.
    pub token_balances: HashMap<Address, U256>,
    /// Every broadcast transaction, in order.
    pub sent: Vec<TransactionRequest>,
    /// Send attempts (0-based) the user rejects.
    pub reject_attempts: HashSet<usize>,
    /// Broadcast indices (0-based) that revert.
    pub revert_sends: HashSet<usize>,
    /// After this many broadcasts the wallet jumps to the given chain.
    pub chain_after_sends: Option<(usize, u64)>,
    pub estimate_fails: bool,
    pub gas_price: Option<u128>,
    attempts: usize,
    outcomes: HashMap<B256, bool>,
}

impl MockWallet {
    pub fn on_chain(chain: u64) -> Self {
        Self {
            account: Some(OWNER),
            state: Mutex::new(MockState {
                chain,
                accept_switch: true,
                nft_collections: HashSet::from([ART]),
                gas_price: Some(1_000_000_000),
                ..Default::default()
            }),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state")
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state().sent.clone()
    }
}

fn target_of(request: &TransactionRequest) -> Address {
    match request.to {
        Some(TxKind::Call(addr)) => addr,
        _ => Address::ZERO,
    }
}

pub fn input_of(request: &TransactionRequest) -> Bytes {
    request.input.input().cloned().unwrap_or_default()
}

#[async_trait]
impl WalletSession for MockWallet {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.state().chain)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let mut state = self.state();
        state.switch_calls += 1;
        if let Some(code) = state.switch_error {
            return Err(WalletError::new(Some(code), "User rejected the request."));
        }
        if state.accept_switch {
            state.chain = chain_id;
        }
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError> {
        let mut state = self.state();
        state.add_calls += 1;
        if state.accept_switch {
            state.chain = network.chain_id;
        }
        Ok(())
    }

    async fn estimate_gas(&self, _request: &TransactionRequest) -> Result<u64, WalletError> {
        if self.state().estimate_fails {
            return Err(WalletError::new(Some(-32000), "execution reverted"));
        }
        Ok(ESTIMATED_GAS)
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, WalletError> {
        let state = self.state();
        let target = target_of(request);
        let data = input_of(request);
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| WalletError::msg("empty calldata"))?;

        let encoded = if selector == IERC20::allowanceCall::SELECTOR {
            let call = IERC20::allowanceCall::abi_decode(&data).map_err(|e| WalletError::msg(e.to_string()))?;
            state
                .allowances
                .get(&(target, call.spender))
                .copied()
                .unwrap_or_default()
                .abi_encode()
        } else if selector == IERC721::isApprovedForAllCall::SELECTOR {
            let call = IERC721::isApprovedForAllCall::abi_decode(&data)
                .map_err(|e| WalletError::msg(e.to_string()))?;
            state.operators.contains(&(target, call.operator)).abi_encode()
        } else if selector == IERC721::getApprovedCall::SELECTOR {
            let call =
                IERC721::getApprovedCall::abi_decode(&data).map_err(|e| WalletError::msg(e.to_string()))?;
            state
                .nft_approved
                .get(&(target, call.tokenId))
                .copied()
                .unwrap_or_default()
                .abi_encode()
        } else if selector == IERC20::balanceOfCall::SELECTOR {
            state
                .token_balances
                .get(&target)
                .copied()
                .unwrap_or_default()
                .abi_encode()
        } else {
            return Err(WalletError::new(Some(-32000), "execution reverted"));
        };
        Ok(Bytes::from(encoded))
    }

    async fn balance(&self, _address: Address) -> Result<U256, WalletError> {
        Ok(U256::from(10u64).pow(U256::from(18u64)))
    }

    async fn gas_price(&self) -> Result<u128, WalletError> {
        self.state()
            .gas_price
            .ok_or_else(|| WalletError::new(Some(-32601), "method not available"))
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, WalletError> {
        let mut state = self.state();
        let attempt = state.attempts;
        state.attempts += 1;
        if state.reject_attempts.contains(&attempt) {
            return Err(WalletError::new(Some(4001), "User denied transaction signature."));
        }

        let index = state.sent.len();
        let success = !state.revert_sends.contains(&index);
        let tx_hash = B256::with_last_byte(u8::try_from(index + 1).unwrap_or(u8::MAX));
        if success {
            apply_approval(&mut state, &request);
        }
        state.sent.push(request);
        state.outcomes.insert(tx_hash, success);
        if let Some((after, chain)) = state.chain_after_sends
            && state.sent.len() == after
        {
            state.chain = chain;
        }
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxOutcome, WalletError> {
        let success = self
            .state()
            .outcomes
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| WalletError::msg("receipt not found"))?;
        Ok(TxOutcome {
            tx_hash,
            success,
            block_number: Some(100),
            gas_used: ESTIMATED_GAS,
        })
    }
}

fn apply_approval(state: &mut MockState, request: &TransactionRequest) {
    let target = target_of(request);
    let data = input_of(request);
    if !data.starts_with(&IERC20::approveCall::SELECTOR) {
        return;
    }
    if state.nft_collections.contains(&target) {
        if let Ok(call) = IERC721::approveCall::abi_decode(&data) {
            state.nft_approved.insert((target, call.tokenId), call.to);
        }
    } else if let Ok(call) = IERC20::approveCall::abi_decode(&data) {
        state.allowances.insert((target, call.spender), call.amount);
    }
}

pub fn networks(with_executor: bool) -> NetworkTable {
    let mut table = NetworkTable::builtin();
    if with_executor {
        table.set_batch_executor(CHAIN_SEPOLIA, EXECUTOR);
    }
    table
}

pub fn engine(wallet: &Arc<MockWallet>, networks: NetworkTable) -> ExecutionEngine {
    let session: Arc<dyn WalletSession> = wallet.clone();
    ExecutionEngine::new(
        session,
        networks,
        CostEstimator::offline(),
        CHAIN_SEPOLIA,
        DEFAULT_GAS_LIMIT_MULTIPLIER_BPS,
    )
}

/// Native, fungible and non-fungible, all selected.
pub fn mixed_assets() -> Vec<Asset> {
    vec![
        Asset::native("ETH", "0.1").with_selected(true),
        Asset::fungible(USDC, "USD Coin", "USDC", "2.5", 6).with_selected(true),
        Asset::non_fungible(ART, "7", "Art Blocks", "ART").with_selected(true),
    ]
}

pub fn owner_str() -> String {
    format!("{OWNER:#x}")
}

pub fn recipient_str() -> String {
    format!("{RECIPIENT:#x}")
}
