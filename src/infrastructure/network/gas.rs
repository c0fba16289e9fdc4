// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::parse_u128_hex;
use crate::common::retry::with_timeout;
use crate::domain::bundle::GasPriceSource;
use crate::domain::constants::{DEFAULT_GAS_PRICE_GWEI, DEFAULT_PROBE_TIMEOUT_MS, WEI_PER_GWEI};
use crate::network::provider::HttpProvider;
use crate::network::session::WalletSession;
use alloy::providers::Provider;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    pub price_wei: u128,
    pub source: GasPriceSource,
}

/// Gas price with a fixed fallback order: primary client, wallet, raw `eth_gasPrice`
/// against public endpoints, then a constant. The last tier cannot fail.
#[derive(Clone)]
pub struct GasPriceOracle {
    primary: Option<HttpProvider>,
    endpoints: Vec<String>,
    http: reqwest::Client,
    probe_timeout: Duration,
    default_price_wei: u128,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<serde_json::Value>,
}

impl GasPriceOracle {
    pub fn new(
        primary: Option<HttpProvider>,
        endpoints: Vec<String>,
        probe_timeout: Duration,
        default_gas_price_gwei: u64,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(probe_timeout)
            .build()
            .unwrap_or_default();
        Self {
            primary,
            endpoints,
            http,
            probe_timeout,
            default_price_wei: u128::from(default_gas_price_gwei).saturating_mul(WEI_PER_GWEI),
        }
    }

    /// No network tiers at all; always answers with the default price.
    pub fn offline() -> Self {
        Self::new(
            None,
            Vec::new(),
            Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            DEFAULT_GAS_PRICE_GWEI,
        )
    }

    pub async fn gas_price(&self, wallet: Option<&dyn WalletSession>) -> GasQuote {
        if let Some(provider) = &self.primary {
            match with_timeout(self.probe_timeout, provider.get_gas_price()).await {
                Ok(price) => return Self::quote(price, GasPriceSource::PrimaryRpc),
                Err(e) => tracing::debug!(target: "gas", error = %e, "Primary gas price failed"),
            }
        }

        if let Some(wallet) = wallet {
            match with_timeout(self.probe_timeout, wallet.gas_price()).await {
                Ok(price) => return Self::quote(price, GasPriceSource::Wallet),
                Err(e) => tracing::debug!(target: "gas", error = %e, "Wallet gas price failed"),
            }
        }

        for url in &self.endpoints {
            match with_timeout(self.probe_timeout, self.raw_gas_price(url)).await {
                Ok(price) => return Self::quote(price, GasPriceSource::PublicEndpoint),
                Err(e) => {
                    tracing::debug!(target: "gas", endpoint = %url, error = %e, "eth_gasPrice failed")
                }
            }
        }

        tracing::warn!(
            target: "gas",
            price_wei = self.default_price_wei,
            "All gas price sources failed; using default"
        );
        Self::quote(self.default_price_wei, GasPriceSource::Default)
    }

    fn quote(price_wei: u128, source: GasPriceSource) -> GasQuote {
        GasQuote { price_wei, source }
    }

    async fn raw_gas_price(&self, url: &str) -> Result<u128, String> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_gasPrice",
            "params": [],
        });
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status().as_u16()));
        }
        let parsed: JsonRpcResponse = resp.json().await.map_err(|e| e.to_string())?;
        if let Some(err) = parsed.error {
            return Err(err.to_string());
        }
        parsed
            .result
            .as_deref()
            .and_then(parse_u128_hex)
            .ok_or_else(|| "missing or malformed result".to_string())
    }
}
