// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::retry::with_timeout;
use crate::data::abi::IERC20;
use crate::domain::amount::{ScaledAmount, format_base_units, scale_to_base_units};
use crate::domain::asset::{Asset, AssetKey};
use crate::domain::constants::{DiscoveryStrategy, NetworkDescriptor};
use crate::domain::error::AppError;
use crate::infrastructure::data::token_manager::TokenManager;
use crate::network::session::WalletSession;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Source of the owner's unclassified holdings on one network.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn assets(&self, owner: Address, network: &NetworkDescriptor)
    -> Result<Vec<Asset>, AppError>;
}

/// Discovery through the wallet session itself: native balance, plus `balanceOf`
/// over the reference token list when the network uses the token-list strategy.
pub struct SessionInventory {
    session: Arc<dyn WalletSession>,
    tokens: TokenManager,
    probe_timeout: Duration,
}

impl SessionInventory {
    pub fn new(session: Arc<dyn WalletSession>, tokens: TokenManager, probe_timeout: Duration) -> Self {
        Self {
            session,
            tokens,
            probe_timeout,
        }
    }

    async fn native(&self, owner: Address, network: &NetworkDescriptor) -> Result<Asset, AppError> {
        let balance = with_timeout(self.probe_timeout, self.session.balance(owner))
            .await
            .map_err(|e| AppError::Connection(format!("native balance on {}: {e}", network.name)))?;
        Ok(Asset::native(
            network.native_symbol,
            format_base_units(balance, 18),
        ))
    }

    async fn token_list(&self, owner: Address, chain_id: u64) -> Vec<Asset> {
        let mut out = Vec::new();
        for (token, info) in self.tokens.tokens_for_chain(chain_id) {
            let req = TransactionRequest {
                to: Some(TxKind::Call(token)),
                input: TransactionInput::new(Bytes::from(
                    IERC20::balanceOfCall { owner }.abi_encode(),
                )),
                ..Default::default()
            };
            let raw = match with_timeout(self.probe_timeout, self.session.call(&req)).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!(target: "inventory", token = %token, error = %e, "balanceOf failed");
                    continue;
                }
            };
            let balance = match IERC20::balanceOfCall::abi_decode_returns(&raw) {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(target: "inventory", token = %token, error = %e, "balanceOf undecodable");
                    continue;
                }
            };
            if balance.is_zero() {
                continue;
            }
            out.push(Asset::fungible(
                token,
                info.name.clone(),
                info.symbol.clone(),
                format_base_units(balance, info.decimals),
                info.decimals,
            ));
        }
        out
    }
}

#[async_trait]
impl InventoryProvider for SessionInventory {
    async fn assets(
        &self,
        owner: Address,
        network: &NetworkDescriptor,
    ) -> Result<Vec<Asset>, AppError> {
        let live_chain = self
            .session
            .chain_id()
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;
        if live_chain != network.chain_id {
            return Err(AppError::Validation {
                field: "chain_id".into(),
                message: format!(
                    "wallet is on chain {live_chain}, inventory requested for {}",
                    network.chain_id
                ),
            });
        }

        let mut assets = vec![self.native(owner, network).await?];
        match network.discovery {
            DiscoveryStrategy::TokenList => {
                assets.extend(self.token_list(owner, network.chain_id).await)
            }
            DiscoveryStrategy::NativeOnly => {}
        }
        tracing::info!(
            target: "inventory",
            chain_id = network.chain_id,
            owner = %owner,
            assets = assets.len(),
            "Inventory discovered"
        );
        Ok(assets)
    }
}

/// Assets from a JSON array on disk; the owner is not consulted.
pub struct JsonFileInventory {
    path: PathBuf,
}

impl JsonFileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InventoryProvider for JsonFileInventory {
    async fn assets(&self, _owner: Address, _network: &NetworkDescriptor) -> Result<Vec<Asset>, AppError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Config(format!("Failed to read assets {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("Invalid assets JSON {}: {e}", self.path.display()))
        })
    }
}

fn is_positive(asset: &Asset) -> bool {
    matches!(
        scale_to_base_units(&asset.balance, asset.decimals),
        Ok(ScaledAmount::Positive(_))
    )
}

/// Dedupe by asset key in first-seen order; a later non-zero balance replaces an earlier zero one.
pub fn merge_inventories(sources: Vec<Vec<Asset>>) -> Vec<Asset> {
    let mut merged: Vec<Asset> = Vec::new();
    let mut index: HashMap<AssetKey, usize> = HashMap::new();
    for asset in sources.into_iter().flatten() {
        match index.get(&asset.key()) {
            Some(&pos) => {
                if !is_positive(&merged[pos]) && is_positive(&asset) {
                    merged[pos] = asset;
                }
            }
            None => {
                index.insert(asset.key(), merged.len());
                merged.push(asset);
            }
        }
    }
    merged
}

fn matches_selector(asset: &Asset, selector: &str) -> bool {
    let sel = selector.trim();
    if sel.is_empty() {
        return false;
    }
    if sel.eq_ignore_ascii_case(&asset.key().to_string()) || sel.eq_ignore_ascii_case(&asset.label()) {
        return true;
    }
    match asset.key() {
        AssetKey::Native => sel.eq_ignore_ascii_case("native") || sel.eq_ignore_ascii_case(&asset.symbol),
        AssetKey::Fungible(addr) => {
            sel.eq_ignore_ascii_case(&format!("{addr:#x}")) || sel.eq_ignore_ascii_case(&asset.symbol)
        }
        AssetKey::NonFungible(addr, id) => sel.eq_ignore_ascii_case(&format!("{addr:#x}:{id}")),
        AssetKey::NonFungibleRaw(..) => false,
    }
}

/// Mark the assets to migrate. With no selectors every positive, unflagged asset is
/// chosen; otherwise only assets matching a selector (symbol, `native`, contract,
/// `contract:id` or asset key). Flagged assets stay deselected unless `include_flagged`.
pub fn apply_selection(assets: Vec<Asset>, selectors: &[String], include_flagged: bool) -> Vec<Asset> {
    assets
        .into_iter()
        .map(|asset| {
            let wanted = if selectors.is_empty() {
                is_positive(&asset)
            } else {
                selectors.iter().any(|s| matches_selector(&asset, s))
            };
            let allowed = include_flagged || !asset.is_scam();
            if wanted && !allowed {
                tracing::warn!(target: "inventory", asset = %asset.label(), "Skipping flagged asset");
            }
            asset.with_selected(wanted && allowed)
        })
        .collect()
}
