// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;

use alloy::primitives::{Address, address};
use serde::Deserialize;

use crate::domain::constants::{CHAIN_ETHEREUM, CHAIN_SEPOLIA};
use crate::domain::error::AppError;

/// Reference metadata for a token we trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub tags: Vec<String>,
}

/// Static per-chain list of legitimate tokens. Feeds impersonation checks and
/// token-list inventory discovery; never touches the network.
#[derive(Debug, Clone, Default)]
pub struct TokenManager {
    tokens_by_chain: HashMap<u64, BTreeMap<Address, TokenInfo>>,
    /// Upper-cased symbols that name a well-known asset on any chain.
    protected_symbols: HashSet<String>,
}

#[derive(Deserialize)]
struct TokenEntry {
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    decimals: u8,
    #[serde(default)]
    addresses: HashMap<String, String>,
}

/// Symbols of native coins; no ERC-20 should ever carry them.
const NATIVE_SYMBOLS: [&str; 5] = ["ETH", "BNB", "POL", "MATIC", "AVAX"];

impl TokenManager {
    fn is_native_token(info: &TokenInfo) -> bool {
        info.tags
            .iter()
            .any(|tag| tag.trim().eq_ignore_ascii_case("native"))
    }

    /// Canonical stablecoins and wrapped majors.
    pub fn builtin() -> Self {
        let mut tm = Self::empty();
        let mainnet = [
            (address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), "USDC", "USD Coin", 6),
            (address!("dAC17F958D2ee523a2206206994597C13D831ec7"), "USDT", "Tether USD", 6),
            (address!("6B175474E89094C44Da98b954EedeAC495271d0F"), "DAI", "Dai Stablecoin", 18),
            (address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), "WETH", "Wrapped Ether", 18),
            (address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"), "WBTC", "Wrapped BTC", 8),
        ];
        for (addr, symbol, name, decimals) in mainnet {
            tm.insert(CHAIN_ETHEREUM, addr, symbol, name, decimals);
        }
        tm.insert(
            CHAIN_SEPOLIA,
            address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
            "USDC",
            "USDC",
            6,
        );
        tm
    }

    pub fn empty() -> Self {
        Self {
            tokens_by_chain: HashMap::new(),
            protected_symbols: NATIVE_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn insert(&mut self, chain_id: u64, addr: Address, symbol: &str, name: &str, decimals: u8) {
        self.protected_symbols.insert(symbol.trim().to_uppercase());
        self.tokens_by_chain.entry(chain_id).or_default().insert(
            addr,
            TokenInfo {
                symbol: symbol.to_string(),
                name: name.to_string(),
                decimals,
                tags: Vec::new(),
            },
        );
    }

    /// Built-in entries extended by a JSON token list.
    pub fn load_from_file(path: &str) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read tokenlist {path}: {e}")))?;
        let mut tm = Self::builtin();
        tm.extend_from_json(&raw)
            .map_err(|e| AppError::Config(format!("Invalid tokenlist JSON {path}: {e}")))?;
        Ok(tm)
    }

    pub fn extend_from_json(&mut self, raw: &str) -> Result<usize, serde_json::Error> {
        let entries: Vec<TokenEntry> = serde_json::from_str(raw)?;
        let mut added = 0usize;
        for entry in entries {
            let info = TokenInfo {
                name: entry.name.clone().unwrap_or_else(|| entry.symbol.clone()),
                symbol: entry.symbol.clone(),
                decimals: entry.decimals,
                tags: entry.tags.clone(),
            };
            if Self::is_native_token(&info) {
                self.protected_symbols.insert(info.symbol.to_uppercase());
                continue;
            }
            for (chain_str, addr_str) in &entry.addresses {
                if let Ok(chain_id) = chain_str.parse::<u64>()
                    && let Ok(addr) = addr_str.parse::<Address>()
                {
                    self.protected_symbols.insert(info.symbol.to_uppercase());
                    self.tokens_by_chain
                        .entry(chain_id)
                        .or_default()
                        .insert(addr, info.clone());
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    pub fn info(&self, chain_id: u64, address: Address) -> Option<&TokenInfo> {
        self.tokens_by_chain
            .get(&chain_id)
            .and_then(|m| m.get(&address))
    }

    pub fn is_known(&self, chain_id: u64, address: Address) -> bool {
        self.info(chain_id, address).is_some()
    }

    pub fn is_protected_symbol(&self, symbol: &str) -> bool {
        self.protected_symbols.contains(&symbol.trim().to_uppercase())
    }

    /// Reference tokens for one chain, in address order.
    pub fn tokens_for_chain(&self, chain_id: u64) -> Vec<(Address, &TokenInfo)> {
        self.tokens_by_chain
            .get(&chain_id)
            .map(|m| m.iter().map(|(a, i)| (*a, i)).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens_by_chain.is_empty()
    }
}
