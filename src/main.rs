// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use mitander_migrate::app::config::GlobalSettings;
use mitander_migrate::app::logging::setup_logging;
use mitander_migrate::common::parsing::require_address;
use mitander_migrate::domain::asset::Asset;
use mitander_migrate::domain::constants::NetworkTable;
use mitander_migrate::domain::error::AppError;
use mitander_migrate::infrastructure::data::token_manager::TokenManager;
use mitander_migrate::infrastructure::network::gas::GasPriceOracle;
use mitander_migrate::infrastructure::network::provider::ConnectionFactory;
use mitander_migrate::infrastructure::network::session::WalletSession;
use mitander_migrate::infrastructure::network::wallet::{RpcWallet, WalletTimings};
use mitander_migrate::services::classifier::AssetClassifier;
use mitander_migrate::services::estimator::CostEstimator;
use mitander_migrate::services::execution::ExecutionEngine;
use mitander_migrate::services::inventory::{
    InventoryProvider, JsonFileInventory, SessionInventory, apply_selection, merge_inventories,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "mitander migrate")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Target chain (overrides config/env)
    #[arg(long)]
    chain_id: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether the target chain supports atomic bundles
    Capability,
    /// Discover and classify the owner's holdings
    Inventory {
        /// Owner to inspect (default: wallet account)
        #[arg(long)]
        owner: Option<String>,
        /// Extra assets as a JSON array
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Compile and estimate a migration without signing anything
    Preview(TransferArgs),
    /// Compile and execute a migration
    Execute {
        #[command(flatten)]
        transfer: TransferArgs,
        /// Submit without stopping after the preview
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct TransferArgs {
    /// Destination account
    #[arg(long)]
    recipient: String,
    /// Extra assets as a JSON array
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Assets to move: symbol, `native`, contract or `contract:id`. Default: all positive balances
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,
    /// Allow assets the classifier flagged
    #[arg(long, default_value_t = false)]
    include_flagged: bool,
}

struct Runtime {
    settings: GlobalSettings,
    networks: NetworkTable,
    tokens: TokenManager,
    session: Arc<dyn WalletSession>,
    owner: Address,
}

impl Runtime {
    async fn connect(settings: GlobalSettings) -> Result<Self, AppError> {
        let signer = settings.signer()?;
        let owner = signer.address();
        let networks = settings.network_table()?;
        let tokens = settings.token_manager()?;
        let timings = WalletTimings {
            probe_timeout: settings.probe_timeout(),
            receipt_poll: settings.receipt_poll(),
            receipt_timeout: settings.receipt_timeout(),
        };
        let wallet = RpcWallet::connect(signer, &networks, settings.chain_id, timings).await?;
        Ok(Self {
            settings,
            networks,
            tokens,
            session: Arc::new(wallet),
            owner,
        })
    }

    fn estimator(&self) -> Result<CostEstimator, AppError> {
        let chain_id = self.settings.chain_id;
        let primary = self
            .settings
            .http_provider(chain_id)
            .map(|url| ConnectionFactory::http(&url))
            .transpose()?;
        let oracle = GasPriceOracle::new(
            primary,
            self.networks.endpoints(chain_id).to_vec(),
            self.settings.probe_timeout(),
            self.settings.default_gas_price_gwei,
        );
        Ok(CostEstimator::new(
            oracle,
            self.settings.gas_margin_bps,
            self.settings.probe_timeout(),
        ))
    }

    fn engine(&self) -> Result<ExecutionEngine, AppError> {
        Ok(ExecutionEngine::new(
            Arc::clone(&self.session),
            self.networks.clone(),
            self.estimator()?,
            self.settings.chain_id,
            self.settings.gas_limit_multiplier_bps_value(),
        ))
    }

    async fn inventory(
        &self,
        owner: Address,
        extra: Option<&PathBuf>,
    ) -> Result<Vec<Asset>, AppError> {
        let chain_id = self.settings.chain_id;
        let network = self.networks.get(chain_id).ok_or_else(|| {
            AppError::Config(format!("chain {chain_id} is not a known network"))
        })?;
        let live = SessionInventory::new(
            Arc::clone(&self.session),
            self.tokens.clone(),
            self.settings.probe_timeout(),
        );
        let mut sources = vec![live.assets(owner, network).await?];
        if let Some(path) = extra {
            sources.push(JsonFileInventory::new(path).assets(owner, network).await?);
        }
        let (assets, summary) = AssetClassifier::new(self.tokens.clone())
            .classify_with_summary(merge_inventories(sources), chain_id);
        tracing::info!(
            target: "inventory",
            chain_id,
            total = summary.total,
            flagged = summary.scam_count,
            flagged_pct = summary.scam_percentage,
            "Inventory classified"
        );
        Ok(assets)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Unknown(anyhow::anyhow!("serialize output: {e}")))?;
    println!("{body}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    if let Some(chain_id) = cli.chain_id {
        settings.chain_id = chain_id;
    }
    setup_logging(settings.log_level(), settings.log_json || cli.json_logs);

    let runtime = Runtime::connect(settings).await?;
    tracing::info!(
        target: "config",
        chain_id = runtime.settings.chain_id,
        account = %runtime.owner,
        "Wallet ready"
    );

    match cli.command {
        Command::Capability => {
            let capability = runtime.engine()?.check_capability().await;
            print_json(&capability)?;
        }
        Command::Inventory { owner, assets } => {
            let owner = match owner {
                Some(raw) => require_address("owner", &raw)?,
                None => runtime.owner,
            };
            let assets = runtime.inventory(owner, assets.as_ref()).await?;
            print_json(&assets)?;
        }
        Command::Preview(transfer) => {
            let assets = selected_assets(&runtime, &transfer).await?;
            let preview = runtime
                .engine()?
                .preview(&assets, &runtime.owner.to_string(), &transfer.recipient)
                .await?;
            print_json(&preview)?;
        }
        Command::Execute { transfer, yes } => {
            let assets = selected_assets(&runtime, &transfer).await?;
            let mut engine = runtime.engine()?;
            let preview = engine
                .preview(&assets, &runtime.owner.to_string(), &transfer.recipient)
                .await?;
            print_json(&preview)?;
            if !yes {
                tracing::warn!(target: "execution", "Preview only; rerun with --yes to submit");
                return Ok(());
            }
            let mut bundle = preview.bundle;
            let receipt = engine.execute(&mut bundle).await?;
            if let Some(url) = receipt
                .transaction_hash()
                .zip(runtime.networks.get(engine.target_chain()))
                .and_then(|(hash, network)| network.tx_url(hash))
            {
                tracing::info!(target: "execution", url = %url, "Bundle on explorer");
            }
            print_json(&receipt)?;
        }
    }
    Ok(())
}

async fn selected_assets(runtime: &Runtime, transfer: &TransferArgs) -> Result<Vec<Asset>, AppError> {
    let assets = runtime
        .inventory(runtime.owner, transfer.assets.as_ref())
        .await?;
    Ok(apply_selection(
        assets,
        &transfer.select,
        transfer.include_flagged,
    ))
}
