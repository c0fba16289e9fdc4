// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, B256, Bytes, U256};
use serde::Serialize;

/// What a sub-operation moves; kept beside the encoded call so later stages never re-decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferKind {
    Native {
        amount: U256,
    },
    Fungible {
        token: Address,
        amount: U256,
    },
    NonFungible {
        collection: Address,
        token_id: U256,
    },
}

/// One compiled instruction: a call (or plain value transfer) to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubOperation {
    pub target: Address,
    pub value: U256,
    /// Empty for a plain value transfer.
    pub calldata: Bytes,
    pub gas_hint: Option<u64>,
    pub transfer: TransferKind,
    /// Symbol or `symbol #id` of the originating asset, for logs and errors.
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GasPriceSource {
    PrimaryRpc,
    Wallet,
    PublicEndpoint,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum EstimateFidelity {
    /// Every gas figure came from the network.
    NetworkAware,
    /// Some figures are static fallbacks.
    Degraded {
        static_gas_ops: usize,
        default_gas_price: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostEstimate {
    /// Sum of per-operation gas with the safety margin applied.
    pub aggregate_gas: u64,
    pub gas_price_wei: u128,
    pub gas_price_source: GasPriceSource,
    pub cost_wei: U256,
    /// `cost_wei` in native units, six decimals.
    pub cost_native: String,
    pub fidelity: EstimateFidelity,
}

impl CostEstimate {
    pub fn is_degraded(&self) -> bool {
        matches!(self.fidelity, EstimateFidelity::Degraded { .. })
    }
}

/// Ordered sub-operations for one owner → recipient migration on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    pub chain_id: u64,
    pub owner: Address,
    pub recipient: Address,
    pub operations: Vec<SubOperation>,
    pub estimate: Option<CostEstimate>,
    /// Chain the wallet was on when the preview was computed.
    pub previewed_chain: Option<u64>,
    pub execution_id: Option<B256>,
}

impl Bundle {
    pub fn new(
        chain_id: u64,
        owner: Address,
        recipient: Address,
        operations: Vec<SubOperation>,
    ) -> Self {
        Self {
            chain_id,
            owner,
            recipient,
            operations,
            estimate: None,
            previewed_chain: None,
            execution_id: None,
        }
    }

    pub fn total_value(&self) -> U256 {
        self.operations
            .iter()
            .fold(U256::ZERO, |acc, op| acc.saturating_add(op.value))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
