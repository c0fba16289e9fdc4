// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Keeping the wallet on the bundle's chain.

use crate::domain::constants::NetworkTable;
use crate::domain::error::TransferError;
use crate::network::session::{WalletError, WalletSession, error_to_display_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchStrategy {
    Standard,
    Vendor,
    AddAndSwitch,
}

impl SwitchStrategy {
    fn as_str(self) -> &'static str {
        match self {
            SwitchStrategy::Standard => "wallet_switchEthereumChain",
            SwitchStrategy::Vendor => "vendor",
            SwitchStrategy::AddAndSwitch => "wallet_addEthereumChain",
        }
    }
}

/// Make sure the wallet is on `target`, switching if needed. Each strategy counts only if
/// a fresh chain read confirms it; a user rejection stops the sequence.
pub async fn ensure_chain(
    session: &dyn WalletSession,
    networks: &NetworkTable,
    target: u64,
) -> Result<(), TransferError> {
    let current = session
        .chain_id()
        .await
        .map_err(|e| TransferError::WrongNetwork {
            expected: target,
            actual: 0,
            reason: error_to_display_string(&e),
        })?;
    if current == target {
        return Ok(());
    }
    tracing::info!(target: "execution", from = current, to = target, "Wallet on wrong chain; switching");

    let mut reasons: Vec<String> = Vec::new();
    for strategy in [
        SwitchStrategy::Standard,
        SwitchStrategy::Vendor,
        SwitchStrategy::AddAndSwitch,
    ] {
        let attempt: Option<Result<(), WalletError>> = match strategy {
            SwitchStrategy::Standard => Some(session.switch_chain(target).await),
            SwitchStrategy::Vendor => match session.vendor_switch_method() {
                Some(method) => Some(session.vendor_switch_chain(&method, target).await),
                None => None,
            },
            SwitchStrategy::AddAndSwitch => match networks.get(target) {
                Some(descriptor) => Some(session.add_chain(descriptor).await),
                None => None,
            },
        };
        let Some(result) = attempt else {
            continue;
        };
        match result {
            Ok(()) => match session.chain_id().await {
                Ok(now) if now == target => {
                    tracing::info!(target: "execution", chain_id = target, strategy = strategy.as_str(), "Chain switched");
                    return Ok(());
                }
                Ok(now) => reasons.push(format!(
                    "{} reported success but wallet is on chain {now}",
                    strategy.as_str()
                )),
                Err(e) => reasons.push(format!("{}: {}", strategy.as_str(), error_to_display_string(&e))),
            },
            Err(e) => {
                let reason = format!("{}: {}", strategy.as_str(), error_to_display_string(&e));
                tracing::debug!(target: "execution", reason = %reason, "Switch strategy failed");
                reasons.push(reason);
                if e.user_rejected() {
                    break;
                }
            }
        }
    }

    let actual = session.chain_id().await.unwrap_or(current);
    Err(TransferError::WrongNetwork {
        expected: target,
        actual,
        reason: if reasons.is_empty() {
            "no switch strategy available".to_string()
        } else {
            reasons.join("; ")
        },
    })
}

/// Final check immediately before a signature is requested.
pub async fn assert_still_on(
    session: &dyn WalletSession,
    expected: u64,
) -> Result<(), TransferError> {
    match session.chain_id().await {
        Ok(actual) if actual == expected => Ok(()),
        Ok(actual) => {
            tracing::warn!(target: "execution", expected, actual, "Network changed before submission");
            Err(TransferError::NetworkChanged { expected, actual })
        }
        Err(e) => Err(TransferError::SubmissionRejected(format!(
            "chain id unavailable before submission: {}",
            error_to_display_string(&e)
        ))),
    }
}
