// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::{Ethereum, EthereumWallet};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;
/// Provider with nonce/gas/chain-id fillers and a local signer.
pub type SigningProvider = DynProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    fn parse_url(rpc_url: &str) -> Result<Url, AppError> {
        Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))
    }

    /// Read-only provider.
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url = Self::parse_url(rpc_url)?;
        Ok(RootProvider::new_http(url))
    }

    /// Provider that signs and sends as `signer`.
    pub fn signing_http(
        rpc_url: &str,
        signer: PrivateKeySigner,
    ) -> Result<SigningProvider, AppError> {
        let url = Self::parse_url(rpc_url)?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        Ok(provider)
    }

    /// Connect and confirm the endpoint serves `expected_chain`.
    pub async fn signing_http_for_chain(
        rpc_url: &str,
        signer: PrivateKeySigner,
        expected_chain: u64,
    ) -> Result<SigningProvider, AppError> {
        let provider = Self::signing_http(rpc_url, signer)?;
        let reported = provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("{rpc_url}: {e}")))?;
        if reported != expected_chain {
            return Err(AppError::Validation {
                field: "chain_id".into(),
                message: format!("{rpc_url} serves chain {reported}, expected {expected_chain}"),
            });
        }
        Ok(provider)
    }
}
