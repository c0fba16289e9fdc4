// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::retry::retry_async;
use crate::data::abi::{IERC20, IERC721};
use crate::domain::bundle::{SubOperation, TransferKind};
use crate::domain::constants::GAS_APPROVAL;
use crate::domain::error::TransferError;
use crate::network::session::WalletSession;
use crate::services::estimator::apply_bps;
use crate::services::execution::network::assert_still_on;
use crate::services::execution::receipt::{Confirmation, send_and_confirm};
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use std::collections::HashMap;
use std::time::Duration;

const READ_ATTEMPTS: usize = 2;
const READ_BACKOFF: Duration = Duration::from_millis(100);
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// One approval the spender needs before the batch can move an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Fungible {
        token: Address,
        amount: U256,
        label: String,
    },
    NonFungible {
        collection: Address,
        token_id: U256,
        label: String,
    },
}

impl Requirement {
    fn label(&self) -> &str {
        match self {
            Requirement::Fungible { label, .. } | Requirement::NonFungible { label, .. } => label,
        }
    }
}

/// Exact requirements in first-seen order; fungible amounts are summed per token.
pub fn requirements(ops: &[SubOperation]) -> Vec<Requirement> {
    let mut out: Vec<Requirement> = Vec::new();
    let mut token_pos: HashMap<Address, usize> = HashMap::new();
    for op in ops {
        match &op.transfer {
            TransferKind::Fungible { token, amount } => match token_pos.get(token) {
                Some(&pos) => {
                    if let Requirement::Fungible { amount: total, .. } = &mut out[pos] {
                        *total = total.saturating_add(*amount);
                    }
                }
                None => {
                    token_pos.insert(*token, out.len());
                    out.push(Requirement::Fungible {
                        token: *token,
                        amount: *amount,
                        label: op.label.clone(),
                    });
                }
            },
            TransferKind::NonFungible {
                collection,
                token_id,
            } => out.push(Requirement::NonFungible {
                collection: *collection,
                token_id: *token_id,
                label: op.label.clone(),
            }),
            TransferKind::Native { .. } => {}
        }
    }
    out
}

fn view_request(target: Address, calldata: Vec<u8>) -> TransactionRequest {
    TransactionRequest {
        to: Some(TxKind::Call(target)),
        input: TransactionInput::new(Bytes::from(calldata)),
        ..Default::default()
    }
}

fn read_failed(req: &Requirement, what: &str, reason: String) -> TransferError {
    TransferError::AllowanceApprovalFailed {
        asset: req.label().to_string(),
        reason: format!("{what} read failed: {reason}"),
        tx_hash: None,
    }
}

/// Grants `spender` every approval `ops` need, skipping what is already in place.
pub struct AllowanceManager<'a> {
    session: &'a dyn WalletSession,
    owner: Address,
    spender: Address,
    chain_id: u64,
    gas_limit_multiplier_bps: u64,
    operator_cache: HashMap<Address, bool>,
}

impl<'a> AllowanceManager<'a> {
    pub fn new(
        session: &'a dyn WalletSession,
        owner: Address,
        spender: Address,
        chain_id: u64,
        gas_limit_multiplier_bps: u64,
    ) -> Self {
        Self {
            session,
            owner,
            spender,
            chain_id,
            gas_limit_multiplier_bps,
            operator_cache: HashMap::new(),
        }
    }

    /// Idempotent: with sufficient approvals already on-chain nothing is sent. Returns
    /// the hashes of approvals mined by this call.
    pub async fn ensure(&mut self, ops: &[SubOperation]) -> Result<Vec<B256>, TransferError> {
        let mut mined = Vec::new();
        for req in requirements(ops) {
            let approve_call = match &req {
                Requirement::Fungible { token, amount, .. } => {
                    let current = self.allowance(*token, &req).await?;
                    if current >= *amount {
                        tracing::debug!(target: "execution", asset = req.label(), "Allowance sufficient");
                        continue;
                    }
                    // Tokens such as USDT revert on a non-zero to non-zero approve.
                    if !current.is_zero() {
                        let reset = IERC20::approveCall {
                            spender: self.spender,
                            amount: U256::ZERO,
                        };
                        mined.push(self.approve(&req, *token, reset.abi_encode()).await?);
                    }
                    (
                        *token,
                        IERC20::approveCall {
                            spender: self.spender,
                            amount: *amount,
                        }
                        .abi_encode(),
                    )
                }
                Requirement::NonFungible {
                    collection,
                    token_id,
                    ..
                } => {
                    if self.approved_for_all(*collection, &req).await?
                        || self.approved_token(*collection, *token_id, &req).await?
                    {
                        tracing::debug!(target: "execution", asset = req.label(), "Approval already in place");
                        continue;
                    }
                    (
                        *collection,
                        IERC721::approveCall {
                            to: self.spender,
                            tokenId: *token_id,
                        }
                        .abi_encode(),
                    )
                }
            };
            mined.push(self.approve(&req, approve_call.0, approve_call.1).await?);
        }
        Ok(mined)
    }

    /// View call with a short retry; reads are side-effect free.
    async fn read(
        &self,
        target: Address,
        calldata: Vec<u8>,
        req: &Requirement,
        what: &str,
    ) -> Result<Bytes, TransferError> {
        let session = self.session;
        let request = &view_request(target, calldata);
        retry_async(
            move |_| session.call(request),
            READ_ATTEMPTS,
            READ_BACKOFF,
            READ_TIMEOUT,
        )
        .await
        .map_err(|e| read_failed(req, what, e.to_string()))
    }

    async fn allowance(&self, token: Address, req: &Requirement) -> Result<U256, TransferError> {
        let call = IERC20::allowanceCall {
            owner: self.owner,
            spender: self.spender,
        };
        let raw = self.read(token, call.abi_encode(), req, "allowance").await?;
        IERC20::allowanceCall::abi_decode_returns(&raw)
            .map_err(|e| read_failed(req, "allowance", e.to_string()))
    }

    async fn approved_for_all(
        &mut self,
        collection: Address,
        req: &Requirement,
    ) -> Result<bool, TransferError> {
        if let Some(&cached) = self.operator_cache.get(&collection) {
            return Ok(cached);
        }
        let call = IERC721::isApprovedForAllCall {
            owner: self.owner,
            operator: self.spender,
        };
        let raw = self
            .read(collection, call.abi_encode(), req, "isApprovedForAll")
            .await?;
        let approved = IERC721::isApprovedForAllCall::abi_decode_returns(&raw)
            .map_err(|e| read_failed(req, "isApprovedForAll", e.to_string()))?;
        self.operator_cache.insert(collection, approved);
        Ok(approved)
    }

    async fn approved_token(
        &self,
        collection: Address,
        token_id: U256,
        req: &Requirement,
    ) -> Result<bool, TransferError> {
        let call = IERC721::getApprovedCall { tokenId: token_id };
        let raw = self
            .read(collection, call.abi_encode(), req, "getApproved")
            .await?;
        let approved = IERC721::getApprovedCall::abi_decode_returns(&raw)
            .map_err(|e| read_failed(req, "getApproved", e.to_string()))?;
        Ok(approved == self.spender)
    }

    async fn approve(
        &self,
        req: &Requirement,
        target: Address,
        calldata: Vec<u8>,
    ) -> Result<B256, TransferError> {
        let mut request = view_request(target, calldata);
        request.from = Some(self.owner);
        let gas = self
            .session
            .estimate_gas(&request)
            .await
            .unwrap_or(GAS_APPROVAL);
        request.gas = Some(apply_bps(gas, self.gas_limit_multiplier_bps));

        assert_still_on(self.session, self.chain_id).await?;
        tracing::info!(
            target: "execution",
            asset = req.label(),
            spender = %self.spender,
            "Submitting approval"
        );
        let failed = |reason: String, tx_hash| TransferError::AllowanceApprovalFailed {
            asset: req.label().to_string(),
            reason,
            tx_hash,
        };
        match send_and_confirm(self.session, request, req.label()).await {
            Confirmation::Mined(outcome) if outcome.success => Ok(outcome.tx_hash),
            Confirmation::Mined(outcome) => {
                Err(failed("approval reverted".to_string(), Some(outcome.tx_hash)))
            }
            Confirmation::NotSubmitted { reason } => Err(failed(reason, None)),
            Confirmation::Unknown { tx_hash, reason } => Err(failed(
                format!("approval receipt unknown: {reason}"),
                Some(tx_hash),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fungible(token: u8, amount: u64) -> SubOperation {
        SubOperation {
            target: Address::repeat_byte(token),
            value: U256::ZERO,
            calldata: Bytes::new(),
            gas_hint: None,
            transfer: TransferKind::Fungible {
                token: Address::repeat_byte(token),
                amount: U256::from(amount),
            },
            label: format!("T{token}"),
        }
    }

    #[test]
    fn fungible_requirements_are_summed_per_token() {
        let nft = SubOperation {
            transfer: TransferKind::NonFungible {
                collection: Address::repeat_byte(9),
                token_id: U256::from(5u64),
            },
            ..fungible(9, 0)
        };
        let native = SubOperation {
            transfer: TransferKind::Native {
                amount: U256::from(1u64),
            },
            ..fungible(8, 0)
        };
        let reqs = requirements(&[fungible(1, 10), nft, native, fungible(2, 3), fungible(1, 5)]);
        assert_eq!(reqs.len(), 3);
        assert_eq!(
            reqs[0],
            Requirement::Fungible {
                token: Address::repeat_byte(1),
                amount: U256::from(15u64),
                label: "T1".into()
            }
        );
        assert!(matches!(reqs[1], Requirement::NonFungible { .. }));
        assert!(matches!(&reqs[2], Requirement::Fungible { amount, .. } if *amount == U256::from(3u64)));
    }
}
