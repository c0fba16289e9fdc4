// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Heuristic scam flags for inventory assets.
//!
//! Classification reads only the asset's own fields and the static token list, so the
//! same input always yields the same flags.

use crate::domain::amount::{ScaledAmount, pow10, scale_to_base_units};
use crate::domain::asset::{Asset, AssetKind, RiskFlag, ScamReason, UNKNOWN_NAME, UNKNOWN_SYMBOL};
use crate::infrastructure::data::token_manager::TokenManager;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Whole-unit balance above which an unknown token is treated as airdrop spam.
const IMPLAUSIBLE_BALANCE_DIGITS: u64 = 15;

lazy_static! {
    static ref SCAM_KEYWORDS: Option<Regex> = Regex::new(
        r"(?i)(claim|reward|airdrop|voucher|giveaway|redeem|bonus|free\s*(mint|token|money)|visit\b|\$\s*\d)"
    )
    .ok();
    static ref EMBEDDED_URL: Option<Regex> = Regex::new(
        r"(?i)(https?://|www\.|t\.me/|\.(com|io|org|net|xyz|app|finance|gift|site|live|top|fi|cc)\b)"
    )
    .ok();
    static ref SUSPICIOUS_CHARS: Option<Regex> =
        Regex::new(r"[\x{200B}-\x{200D}\x{2060}\x{FEFF}\x{00A0}\x{0400}-\x{04FF}\x{0370}-\x{03FF}]").ok();
}

fn matches(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(text))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub total: usize,
    pub scam_count: usize,
    /// 0.0 – 100.0; zero for an empty list.
    pub scam_percentage: f64,
}

#[derive(Debug, Clone)]
pub struct AssetClassifier {
    tokens: TokenManager,
}

impl AssetClassifier {
    pub fn new(tokens: TokenManager) -> Self {
        Self { tokens }
    }

    /// Sorted reasons to distrust `asset`; empty means clean. Native assets are never flagged.
    pub fn reasons_for(&self, asset: &Asset, chain_id: u64) -> Vec<ScamReason> {
        if asset.kind == AssetKind::Native {
            return Vec::new();
        }
        let name = asset.name.trim();
        let symbol = asset.symbol.trim();
        let mut reasons = Vec::new();

        if matches(&SCAM_KEYWORDS, name) || matches(&SCAM_KEYWORDS, symbol) {
            reasons.push(ScamReason::ScamKeyword);
        }
        if matches(&EMBEDDED_URL, name) || matches(&EMBEDDED_URL, symbol) {
            reasons.push(ScamReason::EmbeddedUrl);
        }
        if matches(&SUSPICIOUS_CHARS, name) || matches(&SUSPICIOUS_CHARS, symbol) {
            reasons.push(ScamReason::SuspiciousCharacters);
        }
        if asset.kind == AssetKind::Fungible && self.impersonates_known(asset, chain_id) {
            reasons.push(ScamReason::ImpersonatesKnownAsset);
        }
        if asset.kind == AssetKind::Fungible
            && !self.tokens.is_known(chain_id, asset.contract)
            && implausible_balance(&asset.balance)
        {
            reasons.push(ScamReason::ImplausibleBalance);
        }
        let no_name = name.is_empty() || name == UNKNOWN_NAME;
        let no_symbol = symbol.is_empty() || symbol == UNKNOWN_SYMBOL;
        if no_name && no_symbol {
            reasons.push(ScamReason::MissingMetadata);
        }

        reasons.sort();
        reasons.dedup();
        reasons
    }

    /// Symbol of a reference token (or a native coin) at a contract that is not that token.
    fn impersonates_known(&self, asset: &Asset, chain_id: u64) -> bool {
        let symbol = asset.symbol.trim();
        if symbol.is_empty() || !self.tokens.is_protected_symbol(symbol) {
            return false;
        }
        match self.tokens.info(chain_id, asset.contract) {
            Some(info) => !info.symbol.eq_ignore_ascii_case(symbol),
            None => true,
        }
    }

    /// Annotate every asset with a risk flag; order and all other fields are preserved.
    pub fn classify(&self, assets: Vec<Asset>, chain_id: u64) -> Vec<Asset> {
        let classified: Vec<Asset> = assets
            .into_iter()
            .map(|mut asset| {
                let reasons = self.reasons_for(&asset, chain_id);
                asset.risk = Some(RiskFlag {
                    is_scam: !reasons.is_empty(),
                    reasons,
                });
                asset
            })
            .collect();
        let summary = summarize(&classified);
        tracing::debug!(
            target: "classifier",
            chain_id,
            total = summary.total,
            flagged = summary.scam_count,
            "Assets classified"
        );
        classified
    }

    pub fn classify_with_summary(
        &self,
        assets: Vec<Asset>,
        chain_id: u64,
    ) -> (Vec<Asset>, ClassificationSummary) {
        let classified = self.classify(assets, chain_id);
        let summary = summarize(&classified);
        (classified, summary)
    }
}

pub fn summarize(assets: &[Asset]) -> ClassificationSummary {
    let total = assets.len();
    let scam_count = assets.iter().filter(|a| a.is_scam()).count();
    let scam_percentage = if total == 0 {
        0.0
    } else {
        (scam_count as f64) * 100.0 / (total as f64)
    };
    ClassificationSummary {
        total,
        scam_count,
        scam_percentage,
    }
}

fn implausible_balance(balance: &str) -> bool {
    let Some(threshold) = pow10(IMPLAUSIBLE_BALANCE_DIGITS) else {
        return false;
    };
    match scale_to_base_units(balance, 0) {
        Ok(ScaledAmount::Positive(units)) => units >= threshold,
        _ => false,
    }
}
