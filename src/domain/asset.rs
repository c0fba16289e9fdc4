// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_DECIMALS: u8 = 18;
pub const UNKNOWN_NAME: &str = "Unknown Token";
pub const UNKNOWN_SYMBOL: &str = "???";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Native,
    Fungible,
    NonFungible,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Native => "native",
            AssetKind::Fungible => "erc20",
            AssetKind::NonFungible => "erc721",
        }
    }
}

/// Why the classifier distrusts an asset. Order of declaration is reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScamReason {
    /// Name or symbol contains a phishing keyword ("claim", "reward", ...).
    ScamKeyword,
    /// Name or symbol embeds a URL or domain.
    EmbeddedUrl,
    /// Zero-width or lookalike characters in the metadata.
    SuspiciousCharacters,
    /// Symbol of a well-known asset at a contract that is not that asset.
    ImpersonatesKnownAsset,
    /// Balance far beyond anything a real holding would show (airdrop spam).
    ImplausibleBalance,
    /// No name and no symbol from any source.
    MissingMetadata,
}

impl fmt::Display for ScamReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ScamReason::ScamKeyword => "name contains known scam keyword",
            ScamReason::EmbeddedUrl => "name or symbol contains a URL",
            ScamReason::SuspiciousCharacters => "name contains invisible or lookalike characters",
            ScamReason::ImpersonatesKnownAsset => {
                "symbol duplicates a well-known asset at an unexpected contract address"
            }
            ScamReason::ImplausibleBalance => "implausibly large unsolicited balance",
            ScamReason::MissingMetadata => "token has no name or symbol",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub is_scam: bool,
    /// Non-empty and sorted whenever `is_scam` is set.
    #[serde(default)]
    pub reasons: Vec<ScamReason>,
}

/// A unit of value under the owner's control, as reported by an inventory source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub kind: AssetKind,
    /// Zero address for `Native`.
    #[serde(default)]
    pub contract: Address,
    /// Decimal token id, `NonFungible` only.
    #[serde(default)]
    pub token_id: Option<String>,
    /// Human-readable decimal balance; `"1"` for `NonFungible`.
    #[serde(default = "default_balance")]
    pub balance: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub risk: Option<RiskFlag>,
}

fn default_balance() -> String {
    "0".to_string()
}
fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}
fn default_name() -> String {
    UNKNOWN_NAME.to_string()
}
fn default_symbol() -> String {
    UNKNOWN_SYMBOL.to_string()
}

/// Identity of an asset within one network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKey {
    Native,
    Fungible(Address),
    NonFungible(Address, U256),
    /// NFT whose token id could not be parsed; keyed by the raw text.
    NonFungibleRaw(Address, String),
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKey::Native => f.write_str("native"),
            AssetKey::Fungible(addr) => write!(f, "erc20:{addr:#x}"),
            AssetKey::NonFungible(addr, id) => write!(f, "erc721:{addr:#x}:{id}"),
            AssetKey::NonFungibleRaw(addr, id) => write!(f, "erc721:{addr:#x}:{id}"),
        }
    }
}

impl Asset {
    pub fn native(symbol: &str, balance: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Native,
            contract: Address::ZERO,
            token_id: None,
            balance: balance.into(),
            decimals: DEFAULT_DECIMALS,
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            selected: false,
            risk: None,
        }
    }

    pub fn fungible(
        contract: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        balance: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            kind: AssetKind::Fungible,
            contract,
            token_id: None,
            balance: balance.into(),
            decimals,
            name: name.into(),
            symbol: symbol.into(),
            selected: false,
            risk: None,
        }
    }

    pub fn non_fungible(
        contract: Address,
        token_id: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            kind: AssetKind::NonFungible,
            contract,
            token_id: Some(token_id.into()),
            balance: "1".to_string(),
            decimals: 0,
            name: name.into(),
            symbol: symbol.into(),
            selected: false,
            risk: None,
        }
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Deterministic identity: contract for fungibles, (contract, token id) for NFTs.
    pub fn key(&self) -> AssetKey {
        match self.kind {
            AssetKind::Native => AssetKey::Native,
            AssetKind::Fungible => AssetKey::Fungible(self.contract),
            AssetKind::NonFungible => match self.token_id_value() {
                Some(id) => AssetKey::NonFungible(self.contract, id),
                None => AssetKey::NonFungibleRaw(
                    self.contract,
                    self.token_id.as_deref().unwrap_or_default().trim().to_string(),
                ),
            },
        }
    }

    /// Token id as an integer; decimal or `0x` hex.
    pub fn token_id_value(&self) -> Option<U256> {
        let raw = self.token_id.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
            Some(_) => None,
            None => U256::from_str_radix(raw, 10).ok(),
        }
    }

    pub fn is_scam(&self) -> bool {
        self.risk.as_ref().is_some_and(|r| r.is_scam)
    }

    pub fn label(&self) -> String {
        match (&self.kind, &self.token_id) {
            (AssetKind::NonFungible, Some(id)) => format!("{} #{}", self.symbol, id),
            _ => self.symbol.clone(),
        }
    }
}
