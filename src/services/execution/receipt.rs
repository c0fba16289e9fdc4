// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::network::session::{TxOutcome, WalletSession, error_to_display_string};
use alloy::primitives::B256;
use alloy::rpc::types::TransactionRequest;

/// Fate of one signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Mined; check `success`.
    Mined(TxOutcome),
    /// Refused before broadcast (user rejection, node rejection).
    NotSubmitted { reason: String },
    /// Broadcast, but no receipt could be obtained.
    Unknown { tx_hash: B256, reason: String },
}

/// Sign, broadcast and block until mined.
pub async fn send_and_confirm(
    session: &dyn WalletSession,
    request: TransactionRequest,
    label: &str,
) -> Confirmation {
    let tx_hash = match session.send_transaction(request).await {
        Ok(hash) => hash,
        Err(e) => {
            let reason = error_to_display_string(&e);
            tracing::warn!(target: "execution", label, reason = %reason, "Transaction not submitted");
            return Confirmation::NotSubmitted { reason };
        }
    };
    tracing::info!(
        target: "execution",
        label,
        tx_hash = %format!("{:#x}", tx_hash),
        "Transaction submitted"
    );

    match session.wait_for_receipt(tx_hash).await {
        Ok(outcome) => {
            if outcome.success {
                tracing::info!(
                    target: "execution",
                    label,
                    tx_hash = %format!("{:#x}", tx_hash),
                    block = ?outcome.block_number,
                    gas_used = outcome.gas_used,
                    "Transaction confirmed"
                );
            } else {
                tracing::warn!(
                    target: "execution",
                    label,
                    tx_hash = %format!("{:#x}", tx_hash),
                    "Transaction reverted"
                );
            }
            Confirmation::Mined(outcome)
        }
        Err(e) => {
            let reason = error_to_display_string(&e);
            tracing::warn!(
                target: "execution",
                label,
                tx_hash = %format!("{:#x}", tx_hash),
                reason = %reason,
                "Receipt unavailable"
            );
            Confirmation::Unknown { tx_hash, reason }
        }
    }
}
