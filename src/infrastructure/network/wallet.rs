// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::{AttemptError, with_timeout};
use crate::domain::constants::{NetworkDescriptor, NetworkTable};
use crate::network::provider::{ConnectionFactory, SigningProvider};
use crate::network::session::{TxOutcome, WalletError, WalletSession};
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct WalletTimings {
    /// Bound on connecting to (and verifying) one endpoint.
    pub probe_timeout: Duration,
    pub receipt_poll: Duration,
    pub receipt_timeout: Duration,
}

#[derive(Clone)]
struct BoundProvider {
    chain_id: u64,
    endpoint: String,
    provider: SigningProvider,
}

/// Local-key session over HTTP RPC. "Switching chains" rebinds to an endpoint that
/// serves the requested chain.
pub struct RpcWallet {
    signer: PrivateKeySigner,
    endpoints: DashMap<u64, Vec<String>>,
    bound: RwLock<BoundProvider>,
    timings: WalletTimings,
}

impl RpcWallet {
    /// Bind to the first endpoint of `chain_id` that answers with that chain id.
    pub async fn connect(
        signer: PrivateKeySigner,
        networks: &NetworkTable,
        chain_id: u64,
        timings: WalletTimings,
    ) -> Result<Self, AppError> {
        let endpoints: DashMap<u64, Vec<String>> = DashMap::new();
        for net in networks.iter() {
            endpoints.insert(net.chain_id, net.rpc_endpoints.clone());
        }
        let candidates = networks.endpoints(chain_id).to_vec();
        let bound = Self::bind_any(&signer, &candidates, chain_id, timings.probe_timeout)
            .await
            .map_err(|e| AppError::Connection(format!("chain {chain_id}: {e}")))?;
        tracing::info!(
            target: "wallet",
            account = %signer.address(),
            chain_id,
            endpoint = %bound.endpoint,
            "Wallet session bound"
        );
        Ok(Self {
            signer,
            endpoints,
            bound: RwLock::new(bound),
            timings,
        })
    }

    async fn bind_any(
        signer: &PrivateKeySigner,
        candidates: &[String],
        chain_id: u64,
        probe_timeout: Duration,
    ) -> Result<BoundProvider, WalletError> {
        if candidates.is_empty() {
            return Err(WalletError::unrecognized_chain(chain_id));
        }
        let mut last_err = WalletError::unrecognized_chain(chain_id);
        for url in candidates {
            let attempt = with_timeout(
                probe_timeout,
                ConnectionFactory::signing_http_for_chain(url, signer.clone(), chain_id),
            )
            .await;
            match attempt {
                Ok(provider) => {
                    return Ok(BoundProvider {
                        chain_id,
                        endpoint: url.clone(),
                        provider,
                    });
                }
                Err(e) => {
                    tracing::debug!(target: "wallet", endpoint = %url, error = %e, "Endpoint rejected");
                    last_err = match e {
                        AttemptError::TimedOut(d) => {
                            WalletError::msg(format!("{url} timed out after {}ms", d.as_millis()))
                        }
                        AttemptError::Failed(err) => WalletError::msg(err.to_string()),
                    };
                }
            }
        }
        Err(last_err)
    }

    fn provider(&self) -> Result<SigningProvider, WalletError> {
        self.bound
            .read()
            .map(|b| b.provider.clone())
            .map_err(|_| WalletError::msg("wallet provider lock poisoned"))
    }

    /// Chain the session is currently bound to, without a network round trip.
    pub fn bound_chain(&self) -> Option<u64> {
        self.bound.read().ok().map(|b| b.chain_id)
    }
}

#[async_trait]
impl WalletSession for RpcWallet {
    fn account(&self) -> Option<Address> {
        Some(self.signer.address())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let provider = self.provider()?;
        Ok(provider.get_chain_id().await?)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        if self.bound_chain() == Some(chain_id) {
            return Ok(());
        }
        let candidates = self
            .endpoints
            .get(&chain_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        let bound =
            Self::bind_any(&self.signer, &candidates, chain_id, self.timings.probe_timeout).await?;
        tracing::info!(target: "wallet", chain_id, endpoint = %bound.endpoint, "Switched chain");
        let mut guard = self
            .bound
            .write()
            .map_err(|_| WalletError::msg("wallet provider lock poisoned"))?;
        *guard = bound;
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError> {
        {
            let mut entry = self.endpoints.entry(network.chain_id).or_default();
            for url in &network.rpc_endpoints {
                if !entry.contains(url) {
                    entry.push(url.clone());
                }
            }
        }
        self.switch_chain(network.chain_id).await
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, WalletError> {
        let provider = self.provider()?;
        Ok(provider.estimate_gas(request.clone()).await?)
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, WalletError> {
        let provider = self.provider()?;
        Ok(provider.call(request.clone()).await?)
    }

    async fn balance(&self, address: Address) -> Result<U256, WalletError> {
        let provider = self.provider()?;
        Ok(provider.get_balance(address).await?)
    }

    async fn gas_price(&self) -> Result<u128, WalletError> {
        let provider = self.provider()?;
        Ok(provider.get_gas_price().await?)
    }

    async fn send_transaction(&self, mut request: TransactionRequest) -> Result<B256, WalletError> {
        if request.from.is_none() {
            request.from = Some(self.signer.address());
        }
        let provider = self.provider()?;
        let pending = provider.send_transaction(request).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxOutcome, WalletError> {
        let provider = self.provider()?;
        let poll = self.timings.receipt_poll.max(Duration::from_millis(1));
        let limit = self.timings.receipt_timeout.max(Duration::from_millis(1));
        let started = Instant::now();

        while started.elapsed() < limit {
            match provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(rcpt)) => {
                    return Ok(TxOutcome {
                        tx_hash,
                        success: rcpt.status(),
                        block_number: rcpt.block_number,
                        gas_used: rcpt.gas_used,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "wallet",
                        error = %e,
                        tx_hash = %format!("{:#x}", tx_hash),
                        "Receipt lookup error; retrying"
                    );
                }
            }
            tokio::time::sleep(poll).await;
        }

        Err(WalletError::msg(format!(
            "receipt not available after {}ms",
            limit.as_millis()
        )))
    }
}
