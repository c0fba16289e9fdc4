// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::B256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// What a failed transfer left behind on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnChainEffect {
    /// Nothing was mined; retrying is free.
    None,
    /// At least one transaction was mined (approval, partial sequence or a reverted call).
    Confirmed,
    /// A transaction was broadcast but its fate is not known yet.
    Unknown,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Invalid {role} address: {value}")]
    InvalidAddress { role: &'static str, value: String },

    #[error("Owner and recipient are the same address")]
    SelfTransfer,

    #[error("No assets selected")]
    EmptySelection,

    #[error("Invalid balance {value:?} for asset {asset}: {reason}")]
    InvalidBalance {
        asset: String,
        value: String,
        reason: String,
    },

    #[error("Wallet unavailable for capability check: {0}")]
    CapabilityUnavailable(String),

    #[error("Wallet is on chain {actual}, bundle targets chain {expected}; switching failed: {reason}")]
    WrongNetwork {
        expected: u64,
        actual: u64,
        reason: String,
    },

    #[error("Network changed from {expected} to {actual} before submission")]
    NetworkChanged { expected: u64, actual: u64 },

    #[error("Approval for {asset} failed: {reason}")]
    AllowanceApprovalFailed {
        asset: String,
        reason: String,
        tx_hash: Option<B256>,
    },

    #[error("Transaction {tx_hash:#x} reverted on-chain")]
    RevertedOnChain { tx_hash: B256 },

    #[error(
        "Sequential transfer stopped at operation {failed_position} of {total} ({} succeeded): {reason}",
        .succeeded.len()
    )]
    PartialSequentialFailure {
        succeeded: Vec<B256>,
        /// 1-based position of the operation that failed.
        failed_position: usize,
        total: usize,
        failed_tx_hash: Option<B256>,
        reason: String,
    },

    #[error("Transaction was not submitted: {0}")]
    SubmissionRejected(String),

    #[error("No receipt for {tx_hash:#x}: {reason}")]
    ReceiptUnknown { tx_hash: B256, reason: String },
}

impl TransferError {
    pub fn on_chain_effect(&self) -> OnChainEffect {
        match self {
            TransferError::AllowanceApprovalFailed {
                tx_hash: Some(_), ..
            }
            | TransferError::RevertedOnChain { .. } => OnChainEffect::Confirmed,
            TransferError::PartialSequentialFailure {
                succeeded,
                failed_tx_hash,
                ..
            } => {
                if succeeded.is_empty() && failed_tx_hash.is_none() {
                    OnChainEffect::None
                } else {
                    OnChainEffect::Confirmed
                }
            }
            TransferError::ReceiptUnknown { .. } => OnChainEffect::Unknown,
            _ => OnChainEffect::None,
        }
    }

    /// Every hash this failure can point the user at.
    pub fn tx_hashes(&self) -> Vec<B256> {
        match self {
            TransferError::AllowanceApprovalFailed {
                tx_hash: Some(h), ..
            }
            | TransferError::RevertedOnChain { tx_hash: h }
            | TransferError::ReceiptUnknown { tx_hash: h, .. } => vec![*h],
            TransferError::PartialSequentialFailure {
                succeeded,
                failed_tx_hash,
                ..
            } => succeeded.iter().copied().chain(*failed_tx_hash).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_errors_leave_nothing_on_chain() {
        assert_eq!(TransferError::SelfTransfer.on_chain_effect(), OnChainEffect::None);
        assert_eq!(
            TransferError::WrongNetwork {
                expected: 1,
                actual: 5,
                reason: "rejected".into()
            }
            .on_chain_effect(),
            OnChainEffect::None
        );
        assert_eq!(
            TransferError::AllowanceApprovalFailed {
                asset: "USDC".into(),
                reason: "user rejected".into(),
                tx_hash: None,
            }
            .on_chain_effect(),
            OnChainEffect::None
        );
    }

    #[test]
    fn partial_failure_reports_all_hashes() {
        let err = TransferError::PartialSequentialFailure {
            succeeded: vec![B256::repeat_byte(1)],
            failed_position: 2,
            total: 3,
            failed_tx_hash: Some(B256::repeat_byte(2)),
            reason: "reverted".into(),
        };
        assert_eq!(err.on_chain_effect(), OnChainEffect::Confirmed);
        assert_eq!(
            err.tx_hashes(),
            vec![B256::repeat_byte(1), B256::repeat_byte(2)]
        );
        assert!(err.to_string().contains("operation 2 of 3 (1 succeeded)"));
    }
}
