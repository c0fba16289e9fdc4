// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::data_path::existing_data_path;
use crate::domain::constants::{
    self, CHAIN_SEPOLIA, DEFAULT_GAS_LIMIT_MULTIPLIER_BPS, DEFAULT_GAS_MARGIN_BPS,
    DEFAULT_GAS_PRICE_GWEI, DEFAULT_PROBE_TIMEOUT_MS, NetworkTable,
};
use crate::domain::error::AppError;
use crate::infrastructure::data::token_manager::TokenManager;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,
    /// Chain every bundle targets.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    // Identity
    pub wallet_key: String,
    /// Optional consistency check against `wallet_key`.
    pub wallet_address: Option<Address>,

    // Per-chain maps (chain id -> value)
    pub http_providers: Option<HashMap<String, String>>,
    pub batch_executors: Option<HashMap<String, String>>,

    // Gas / estimation
    #[serde(default = "default_gas_margin_bps")]
    pub gas_margin_bps: u64,
    #[serde(default = "default_gas_limit_multiplier_bps")]
    pub gas_limit_multiplier_bps: u64,
    #[serde(default = "default_gas_price_gwei")]
    pub default_gas_price_gwei: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    // Receipts
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    // Data files
    pub tokenlist_path: Option<String>,
    pub data_dir: Option<String>,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_chain_id() -> u64 {
    CHAIN_SEPOLIA
}
fn default_gas_margin_bps() -> u64 {
    DEFAULT_GAS_MARGIN_BPS
}
fn default_gas_limit_multiplier_bps() -> u64 {
    DEFAULT_GAS_LIMIT_MULTIPLIER_BPS
}
fn default_gas_price_gwei() -> u64 {
    DEFAULT_GAS_PRICE_GWEI
}
fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}
fn default_receipt_poll_ms() -> u64 {
    1_000
}
fn default_receipt_timeout_ms() -> u64 {
    600_000
}

const DEFAULT_TOKENLIST_PATH: &str = "data/tokenlist.json";

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = Config::builder();

        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.wallet_key.trim().is_empty() {
            return Err(AppError::Config("WALLET_KEY is missing".to_string()));
        }
        if self.chain_id == 0 {
            return Err(AppError::Config("chain_id must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Signer for `wallet_key`, checked against `wallet_address` when one is configured.
    pub fn signer(&self) -> Result<PrivateKeySigner, AppError> {
        let signer = PrivateKeySigner::from_str(self.wallet_key.trim())
            .map_err(|e| AppError::Config(format!("Invalid wallet key: {e}")))?;
        if let Some(expected) = self.wallet_address
            && expected != signer.address()
        {
            return Err(AppError::Validation {
                field: "wallet_address".into(),
                message: format!(
                    "{expected:#x} does not match wallet key address {:#x}",
                    signer.address()
                ),
            });
        }
        Ok(signer)
    }

    /// Built-in networks with configured endpoints preferred and executors attached.
    pub fn network_table(&self) -> Result<NetworkTable, AppError> {
        let mut table = NetworkTable::builtin();
        if let Some(map) = &self.http_providers {
            for (chain_id, url) in parse_chain_map(map, "http_providers")? {
                Url::parse(&url).map_err(|e| AppError::Validation {
                    field: format!("http_providers.{chain_id}"),
                    message: e.to_string(),
                })?;
                table.prefer_endpoint(chain_id, &url);
            }
        }
        if let Some(map) = &self.batch_executors {
            for (chain_id, raw) in parse_chain_map(map, "batch_executors")? {
                let addr = Address::from_str(raw.trim()).map_err(|_| AppError::Validation {
                    field: format!("batch_executors.{chain_id}"),
                    message: format!("invalid address {raw}"),
                })?;
                table.set_batch_executor(chain_id, addr);
            }
        }
        Ok(table)
    }

    /// Configured RPC URL for `chain_id`, if any.
    pub fn http_provider(&self, chain_id: u64) -> Option<String> {
        self.http_providers
            .as_ref()
            .and_then(|m| m.get(&chain_id.to_string()))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn data_dir(&self) -> Option<String> {
        std::env::var("DATA_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.data_dir
                    .as_ref()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
    }

    /// Reference token list: the configured file when present, built-in entries otherwise.
    pub fn token_manager(&self) -> Result<TokenManager, AppError> {
        let raw = self
            .tokenlist_path
            .as_deref()
            .unwrap_or(DEFAULT_TOKENLIST_PATH);
        let data_dir = self.data_dir();
        match existing_data_path(raw, data_dir.as_deref()) {
            Some(path) => TokenManager::load_from_file(&path.to_string_lossy()),
            None if self.tokenlist_path.is_some() => Err(AppError::Config(format!(
                "tokenlist_path {raw} does not exist"
            ))),
            None => {
                tracing::debug!(target: "config", path = raw, "No token list file; using built-in tokens");
                Ok(TokenManager::builtin())
            }
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.max(100))
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms.max(100))
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms.max(1_000))
    }

    /// Limit multiplier, never below 1x.
    pub fn gas_limit_multiplier_bps_value(&self) -> u64 {
        self.gas_limit_multiplier_bps
            .max(constants::BPS_DENOMINATOR)
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

fn parse_chain_map(
    raw: &HashMap<String, String>,
    field: &str,
) -> Result<Vec<(u64, String)>, AppError> {
    let mut out = raw
        .iter()
        .map(|(k, v)| {
            k.trim()
                .parse::<u64>()
                .map(|id| (id, v.clone()))
                .map_err(|_| AppError::Config(format!("{field}: invalid chain id '{k}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    out.sort_by_key(|(id, _)| *id);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn base_settings() -> GlobalSettings {
        GlobalSettings {
            debug: default_false(),
            log_json: default_false(),
            chain_id: default_chain_id(),
            wallet_key: ANVIL_KEY.to_string(),
            wallet_address: None,
            http_providers: None,
            batch_executors: None,
            gas_margin_bps: default_gas_margin_bps(),
            gas_limit_multiplier_bps: default_gas_limit_multiplier_bps(),
            default_gas_price_gwei: default_gas_price_gwei(),
            probe_timeout_ms: default_probe_timeout_ms(),
            receipt_poll_ms: default_receipt_poll_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
            tokenlist_path: None,
            data_dir: None,
        }
    }

    #[test]
    fn configured_executor_and_endpoint_reach_network_table() {
        let mut settings = base_settings();
        settings.http_providers = Some(HashMap::from([(
            "11155111".to_string(),
            "http://localhost:8545".to_string(),
        )]));
        settings.batch_executors = Some(HashMap::from([(
            "11155111".to_string(),
            "0x0000000000000000000000000000000000000042".to_string(),
        )]));
        let table = settings.network_table().expect("table");
        assert_eq!(table.endpoints(CHAIN_SEPOLIA)[0], "http://localhost:8545");
        assert_eq!(
            table.batch_executor(CHAIN_SEPOLIA),
            Some(Address::with_last_byte(0x42))
        );
        assert_eq!(
            settings.http_provider(CHAIN_SEPOLIA).as_deref(),
            Some("http://localhost:8545")
        );
    }

    #[test]
    fn malformed_executor_address_is_rejected() {
        let mut settings = base_settings();
        settings.batch_executors = Some(HashMap::from([("1".to_string(), "0x1234".to_string())]));
        assert!(matches!(
            settings.network_table(),
            Err(AppError::Validation { field, .. }) if field == "batch_executors.1"
        ));

        settings.batch_executors = Some(HashMap::from([(
            "mainnet".to_string(),
            "0x0000000000000000000000000000000000000042".to_string(),
        )]));
        assert!(matches!(settings.network_table(), Err(AppError::Config(_))));
    }

    #[test]
    fn wallet_address_must_match_key() {
        let mut settings = base_settings();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            .parse()
            .expect("address");
        settings.wallet_address = Some(expected);
        assert_eq!(settings.signer().expect("signer").address(), expected);

        settings.wallet_address = Some(Address::with_last_byte(1));
        assert!(matches!(
            settings.signer(),
            Err(AppError::Validation { field, .. }) if field == "wallet_address"
        ));
    }

    #[test]
    fn timing_values_have_safe_floor() {
        let mut settings = base_settings();
        settings.receipt_poll_ms = 0;
        settings.receipt_timeout_ms = 0;
        settings.probe_timeout_ms = 0;
        settings.gas_limit_multiplier_bps = 5_000;
        assert_eq!(settings.receipt_poll(), Duration::from_millis(100));
        assert_eq!(settings.receipt_timeout(), Duration::from_millis(1_000));
        assert_eq!(settings.probe_timeout(), Duration::from_millis(100));
        assert_eq!(settings.gas_limit_multiplier_bps_value(), 10_000);
    }

    #[test]
    fn explicit_missing_tokenlist_is_an_error() {
        let _env_lock = env_lock_guard();
        let mut settings = base_settings();
        settings.tokenlist_path = Some("/nonexistent/tokenlist.json".to_string());
        assert!(matches!(settings.token_manager(), Err(AppError::Config(_))));

        settings.tokenlist_path = None;
        settings.data_dir = Some("/nonexistent".to_string());
        assert!(!settings.token_manager().expect("builtin").is_empty());
    }

    #[test]
    fn env_overrides_config_file_values() {
        let _env_lock = env_lock_guard();
        let tmp = std::env::temp_dir().join(format!(
            "migrate-config-env-override-{}-{}.toml",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let body = r#"
wallet_key = "file_wallet_key"
chain_id = 1
gas_margin_bps = 800
"#;
        std::fs::write(&tmp, body).expect("write temp config");
        let old_wallet_key = std::env::var("WALLET_KEY").ok();
        unsafe {
            std::env::set_var("WALLET_KEY", "env_wallet_key");
        }

        let loaded = GlobalSettings::load_with_path(Some(tmp.to_str().expect("utf8 path")))
            .expect("load settings");
        assert_eq!(loaded.wallet_key, "env_wallet_key");
        assert_eq!(loaded.chain_id, 1);
        assert_eq!(loaded.gas_margin_bps, 800);
        assert_eq!(loaded.gas_limit_multiplier_bps, DEFAULT_GAS_LIMIT_MULTIPLIER_BPS);

        std::fs::remove_file(&tmp).ok();
        if let Some(v) = old_wallet_key {
            unsafe { std::env::set_var("WALLET_KEY", v) };
        } else {
            unsafe { std::env::remove_var("WALLET_KEY") };
        }
    }

    #[test]
    fn empty_wallet_key_fails_validation() {
        let mut settings = base_settings();
        settings.wallet_key = "  ".to_string();
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));
    }
}
