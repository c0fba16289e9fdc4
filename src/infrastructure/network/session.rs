// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! The seam between this crate and whatever holds the owner's key.
//!
//! Every fallible wallet/RPC call crosses this boundary exactly once and comes back
//! as a [`WalletError`]; transport-specific error shapes stop here.

use crate::domain::constants::NetworkDescriptor;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{RpcError as TransportRpcError, TransportError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// EIP-1193: user rejected the request.
pub const CODE_USER_REJECTED: i64 = 4001;
/// EIP-3326: chain not added to the wallet.
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;

/// Normalized wallet / RPC failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletError {
    pub code: Option<i64>,
    pub message: String,
}

impl WalletError {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn disconnected() -> Self {
        Self::msg("wallet not connected")
    }

    pub fn unrecognized_chain(chain_id: u64) -> Self {
        Self::new(
            Some(CODE_UNRECOGNIZED_CHAIN),
            format!("Unrecognized chain ID {chain_id}"),
        )
    }

    pub fn from_transport(err: &TransportError) -> Self {
        match err {
            TransportRpcError::ErrorResp(payload) => {
                Self::new(Some(payload.code), payload.message.to_string())
            }
            TransportRpcError::DeserError { text, .. } => parse_rpc_error_from_text(text)
                .unwrap_or_else(|| Self::msg(err.to_string())),
            _ => Self::msg(err.to_string()),
        }
    }

    pub fn user_rejected(&self) -> bool {
        matches!(self.code, Some(CODE_USER_REJECTED))
            || self.message.to_lowercase().contains("user rejected")
            || self.message.to_lowercase().contains("user denied")
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        matches!(self.code, Some(CODE_UNRECOGNIZED_CHAIN))
            || self.message.to_lowercase().contains("unrecognized chain")
    }

    pub fn is_method_unavailable(&self) -> bool {
        if matches!(self.code, Some(CODE_METHOD_NOT_FOUND)) {
            return true;
        }
        let msg = self.message.to_lowercase();
        (msg.contains("method") && msg.contains("not found"))
            || msg.contains("does not exist/is not available")
    }
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&error_to_display_string(self))
    }
}

impl std::error::Error for WalletError {}

impl From<TransportError> for WalletError {
    fn from(err: TransportError) -> Self {
        Self::from_transport(&err)
    }
}

#[derive(Deserialize)]
struct RpcErrorEnvelope {
    error: RpcErrorBody,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

fn parse_rpc_error_from_text(text: &str) -> Option<WalletError> {
    let env: RpcErrorEnvelope = serde_json::from_str(text).ok()?;
    Some(WalletError::new(Some(env.error.code), env.error.message))
}

/// The one canonical reason string for a wallet failure.
///
/// Strips the wrapper prefixes nodes and wallets stack in front of the real reason and
/// appends the code when there is one.
pub fn error_to_display_string(err: &WalletError) -> String {
    let mut reason = err.message.trim();
    for prefix in [
        "server returned an error response:",
        "error code",
        "execution reverted:",
        "Error:",
    ] {
        if let Some(rest) = strip_prefix_ci(reason, prefix) {
            reason = rest.trim_start_matches(|c: char| c == ' ' || c == ':' || c.is_ascii_digit() || c == '-');
            reason = reason.trim();
        }
    }
    if reason.is_empty() {
        reason = "unknown error";
    }
    if err.user_rejected() {
        return "rejected by user".to_string();
    }
    match err.code {
        Some(code) => format!("{reason} (code {code})"),
        None => reason.to_string(),
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Mined transaction as the chain reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// A connected account plus its signing/request primitive.
#[async_trait]
pub trait WalletSession: Send + Sync {
    /// Connected account, `None` when the wallet is locked or disconnected.
    fn account(&self) -> Option<Address>;

    /// Reads the chain id fresh from the wallet on every call.
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// Standard switch request (`wallet_switchEthereumChain`).
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// Wallet-specific switch method, when the wallet exposes one.
    fn vendor_switch_method(&self) -> Option<String> {
        None
    }

    async fn vendor_switch_chain(&self, method: &str, _chain_id: u64) -> Result<(), WalletError> {
        Err(WalletError::new(
            Some(CODE_METHOD_NOT_FOUND),
            format!("{method} not supported"),
        ))
    }

    /// Register the network with the wallet and switch to it (`wallet_addEthereumChain`).
    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError>;

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, WalletError>;

    /// Read-only `eth_call`.
    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, WalletError>;

    async fn balance(&self, address: Address) -> Result<U256, WalletError>;

    async fn gas_price(&self) -> Result<u128, WalletError>;

    /// Sign and broadcast; returns once the node accepted the transaction.
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, WalletError>;

    /// Block until the transaction is mined (or the client gives up).
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxOutcome, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_string_strips_wrappers_and_keeps_code() {
        let err = WalletError::new(Some(3), "execution reverted: ERC20: transfer amount exceeds balance");
        assert_eq!(
            error_to_display_string(&err),
            "ERC20: transfer amount exceeds balance (code 3)"
        );
    }

    #[test]
    fn user_rejection_is_canonical() {
        let err = WalletError::new(Some(4001), "MetaMask Tx Signature: User denied transaction signature.");
        assert!(err.user_rejected());
        assert_eq!(error_to_display_string(&err), "rejected by user");
    }

    #[test]
    fn rpc_error_text_is_parsed() {
        let parsed = parse_rpc_error_from_text(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"the method eth_foo does not exist/is not available"}}"#,
        )
        .expect("parse");
        assert!(parsed.is_method_unavailable());
    }

    #[test]
    fn empty_messages_do_not_produce_empty_strings() {
        assert_eq!(error_to_display_string(&WalletError::msg("   ")), "unknown error");
    }
}
