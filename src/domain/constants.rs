// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, B256};
use lazy_static::lazy_static;
use std::collections::BTreeMap;

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_OPTIMISM: u64 = 10;
pub const CHAIN_BSC: u64 = 56;
pub const CHAIN_POLYGON: u64 = 137;
pub const CHAIN_BASE: u64 = 8453;
pub const CHAIN_ARBITRUM: u64 = 42161;
pub const CHAIN_HOLESKY: u64 = 17000;
pub const CHAIN_SEPOLIA: u64 = 11155111;

// =============================================================================
// GAS CONSTANTS
// =============================================================================

/// Intrinsic cost of a plain value transfer.
pub const GAS_NATIVE_TRANSFER: u64 = 21_000;
/// Empirical ERC-20 `transfer` cost (cold recipient slot).
pub const GAS_FUNGIBLE_TRANSFER: u64 = 65_000;
/// Empirical ERC-721 `transferFrom` cost.
pub const GAS_NON_FUNGIBLE_TRANSFER: u64 = 85_000;
/// Anything we cannot classify.
pub const GAS_GENERIC_CALL: u64 = 100_000;
/// `approve` on either token standard.
pub const GAS_APPROVAL: u64 = 70_000;
/// Fixed overhead of entering the batch executor (dispatch + loop).
pub const GAS_BATCH_OVERHEAD: u64 = 50_000;

pub const DEFAULT_GAS_MARGIN_BPS: u64 = 500;
pub const DEFAULT_GAS_LIMIT_MULTIPLIER_BPS: u64 = 20_000;
pub const DEFAULT_GAS_PRICE_GWEI: u64 = 20;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;
pub const BPS_DENOMINATOR: u64 = 10_000;
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// How the inventory for a network is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// Native balance plus `balanceOf` over the reference token list.
    TokenList,
    /// Native balance only.
    NativeOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub chain_id: u64,
    pub name: &'static str,
    pub native_symbol: &'static str,
    pub rpc_endpoints: Vec<String>,
    pub explorer: Option<&'static str>,
    /// Atomic-bundle (batch executor) deployment, when one is known.
    pub batch_executor: Option<Address>,
    pub discovery: DiscoveryStrategy,
}

fn network(
    chain_id: u64,
    name: &'static str,
    native_symbol: &'static str,
    rpc_endpoints: &[&str],
    explorer: Option<&'static str>,
    discovery: DiscoveryStrategy,
) -> NetworkDescriptor {
    NetworkDescriptor {
        chain_id,
        name,
        native_symbol,
        rpc_endpoints: rpc_endpoints.iter().map(|s| s.to_string()).collect(),
        explorer,
        batch_executor: None,
        discovery,
    }
}

impl NetworkDescriptor {
    /// Block explorer page for a transaction on this network.
    pub fn tx_url(&self, tx_hash: B256) -> Option<String> {
        self.explorer.map(|base| format!("{base}/tx/{tx_hash:#x}"))
    }
}

lazy_static! {
    /// Built-in networks. Batch executor deployments are supplied by configuration.
    pub static ref KNOWN_NETWORKS: BTreeMap<u64, NetworkDescriptor> = {
        use DiscoveryStrategy::*;
        let mut m = BTreeMap::new();
        for n in [
            network(
                CHAIN_ETHEREUM,
                "Ethereum",
                "ETH",
                &["https://ethereum-rpc.publicnode.com", "https://cloudflare-eth.com"],
                Some("https://etherscan.io"),
                TokenList,
            ),
            network(
                CHAIN_SEPOLIA,
                "Sepolia",
                "ETH",
                &["https://ethereum-sepolia-rpc.publicnode.com", "https://rpc.sepolia.org"],
                Some("https://sepolia.etherscan.io"),
                TokenList,
            ),
            network(
                CHAIN_HOLESKY,
                "Holesky",
                "ETH",
                &["https://ethereum-holesky-rpc.publicnode.com"],
                Some("https://holesky.etherscan.io"),
                NativeOnly,
            ),
            network(
                CHAIN_OPTIMISM,
                "OP Mainnet",
                "ETH",
                &["https://mainnet.optimism.io"],
                Some("https://optimistic.etherscan.io"),
                TokenList,
            ),
            network(
                CHAIN_BASE,
                "Base",
                "ETH",
                &["https://mainnet.base.org"],
                Some("https://basescan.org"),
                TokenList,
            ),
            network(
                CHAIN_ARBITRUM,
                "Arbitrum One",
                "ETH",
                &["https://arb1.arbitrum.io/rpc"],
                Some("https://arbiscan.io"),
                TokenList,
            ),
            network(
                CHAIN_POLYGON,
                "Polygon",
                "POL",
                &["https://polygon-rpc.com"],
                Some("https://polygonscan.com"),
                TokenList,
            ),
            network(
                CHAIN_BSC,
                "BNB Smart Chain",
                "BNB",
                &["https://bsc-dataseed.bnbchain.org"],
                Some("https://bscscan.com"),
                TokenList,
            ),
        ] {
            m.insert(n.chain_id, n);
        }
        m
    };
}

/// Known networks merged with configured endpoints and executor deployments.
#[derive(Debug, Clone, Default)]
pub struct NetworkTable {
    networks: BTreeMap<u64, NetworkDescriptor>,
}

impl NetworkTable {
    pub fn builtin() -> Self {
        Self {
            networks: KNOWN_NETWORKS.clone(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a batch executor; unknown chains get a bare descriptor.
    pub fn set_batch_executor(&mut self, chain_id: u64, executor: Address) {
        self.entry(chain_id).batch_executor = Some(executor);
    }

    /// Put `url` first in the chain's endpoint list.
    pub fn prefer_endpoint(&mut self, chain_id: u64, url: &str) {
        let entry = self.entry(chain_id);
        entry.rpc_endpoints.retain(|u| u != url);
        entry.rpc_endpoints.insert(0, url.to_string());
    }

    pub fn get(&self, chain_id: u64) -> Option<&NetworkDescriptor> {
        self.networks.get(&chain_id)
    }

    pub fn batch_executor(&self, chain_id: u64) -> Option<Address> {
        self.networks.get(&chain_id).and_then(|n| n.batch_executor)
    }

    pub fn endpoints(&self, chain_id: u64) -> &[String] {
        self.networks
            .get(&chain_id)
            .map(|n| n.rpc_endpoints.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkDescriptor> {
        self.networks.values()
    }

    fn entry(&mut self, chain_id: u64) -> &mut NetworkDescriptor {
        self.networks.entry(chain_id).or_insert_with(|| NetworkDescriptor {
            chain_id,
            name: "Custom",
            native_symbol: "ETH",
            rpc_endpoints: Vec::new(),
            explorer: None,
            batch_executor: None,
            discovery: DiscoveryStrategy::NativeOnly,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_ships_without_executors() {
        let table = NetworkTable::builtin();
        assert!(table.get(CHAIN_SEPOLIA).is_some());
        assert!(table.iter().all(|n| n.batch_executor.is_none()));
    }

    #[test]
    fn configured_executor_and_endpoint_take_effect() {
        let mut table = NetworkTable::builtin();
        let exec = Address::repeat_byte(0x42);
        table.set_batch_executor(CHAIN_SEPOLIA, exec);
        table.prefer_endpoint(CHAIN_SEPOLIA, "http://localhost:8545");
        assert_eq!(table.batch_executor(CHAIN_SEPOLIA), Some(exec));
        assert_eq!(table.endpoints(CHAIN_SEPOLIA)[0], "http://localhost:8545");

        table.set_batch_executor(31337, exec);
        assert_eq!(table.get(31337).map(|n| n.name), Some("Custom"));
    }

    #[test]
    fn explorer_links_exist_only_for_known_explorers() {
        let table = NetworkTable::builtin();
        let hash = B256::with_last_byte(1);
        let url = table.get(CHAIN_SEPOLIA).and_then(|n| n.tx_url(hash));
        assert_eq!(
            url.as_deref(),
            Some("https://sepolia.etherscan.io/tx/0x0000000000000000000000000000000000000000000000000000000000000001")
        );

        let mut table = NetworkTable::empty();
        table.set_batch_executor(31337, Address::repeat_byte(0x42));
        assert_eq!(table.get(31337).and_then(|n| n.tx_url(hash)), None);
    }
}
