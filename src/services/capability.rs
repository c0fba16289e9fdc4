// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::NetworkTable;
use crate::domain::error::TransferError;
use crate::network::session::WalletSession;
use alloy::primitives::Address;
use serde::Serialize;

/// Whether the wallet's current chain can run an atomic bundle, and through what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapabilityResult {
    Supported { contract: Address, chain_id: u64 },
    Unsupported { chain_id: u64 },
    Unavailable { reason: String },
}

impl CapabilityResult {
    pub fn is_supported(&self) -> bool {
        matches!(self, CapabilityResult::Supported { .. })
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            CapabilityResult::Supported { chain_id, .. }
            | CapabilityResult::Unsupported { chain_id } => Some(*chain_id),
            CapabilityResult::Unavailable { .. } => None,
        }
    }

    pub fn contract(&self) -> Option<Address> {
        match self {
            CapabilityResult::Supported { contract, .. } => Some(*contract),
            _ => None,
        }
    }

    /// `Unavailable` as a typed error, for callers that cannot proceed without a wallet.
    pub fn unavailable_error(&self) -> Option<TransferError> {
        match self {
            CapabilityResult::Unavailable { reason } => {
                Some(TransferError::CapabilityUnavailable(reason.clone()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckState {
    Unknown,
    Checking,
    Resolved,
}

impl CheckState {
    fn as_str(self) -> &'static str {
        match self {
            CheckState::Unknown => "unknown",
            CheckState::Checking => "checking",
            CheckState::Resolved => "resolved",
        }
    }
}

/// Maps the wallet's live chain id to a batch executor deployment. Holds no per-check state.
#[derive(Debug, Clone)]
pub struct CapabilityNegotiator {
    networks: NetworkTable,
}

impl CapabilityNegotiator {
    pub fn new(networks: NetworkTable) -> Self {
        Self { networks }
    }

    /// Never fails; wallet errors degrade to `Unavailable`. The chain id is read fresh every call.
    pub async fn check_support(&self, session: Option<&dyn WalletSession>) -> CapabilityResult {
        let mut state = CheckState::Unknown;
        let result = match session {
            None => CapabilityResult::Unavailable {
                reason: "no wallet session".to_string(),
            },
            Some(session) if session.account().is_none() => CapabilityResult::Unavailable {
                reason: "wallet not connected".to_string(),
            },
            Some(session) => {
                state = self.transition(state, CheckState::Checking);
                match session.chain_id().await {
                    Ok(chain_id) => match self.networks.batch_executor(chain_id) {
                        Some(contract) => CapabilityResult::Supported { contract, chain_id },
                        None => CapabilityResult::Unsupported { chain_id },
                    },
                    Err(e) => CapabilityResult::Unavailable {
                        reason: e.to_string(),
                    },
                }
            }
        };
        self.transition(state, CheckState::Resolved);
        tracing::info!(target: "capability", result = ?result, "Capability check complete");
        result
    }

    fn transition(&self, from: CheckState, to: CheckState) -> CheckState {
        tracing::trace!(target: "capability", from = from.as_str(), to = to.as_str(), "Capability state");
        to
    }
}
