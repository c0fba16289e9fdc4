// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::require_address;
use crate::domain::asset::Asset;
use crate::domain::bundle::Bundle;
use crate::domain::constants::{GAS_BATCH_OVERHEAD, NetworkTable};
use crate::domain::error::TransferError;
use crate::network::session::WalletSession;
use crate::services::capability::{CapabilityNegotiator, CapabilityResult};
use crate::services::compiler::{compile, encode_batch, lower_for_batch};
use crate::services::estimator::{CostEstimator, apply_bps, request_for, static_gas};
use crate::services::execution::allowance::AllowanceManager;
use crate::services::execution::network::{assert_still_on, ensure_chain};
use crate::services::execution::receipt::{Confirmation, send_and_confirm};
use alloy::primitives::{Address, B256, TxKind};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use serde::Serialize;
use std::sync::Arc;

/// What the engine is currently bound to. Rebuilt only by [`ExecutionEngine::rebind_to_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub bound_chain: u64,
    pub owner: Option<Address>,
    /// Batch executor for `bound_chain`, when the chain supports atomic bundles.
    pub contract: Option<Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionMode {
    Atomic { contract: Address },
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReceipt {
    pub chain_id: u64,
    pub mode: ExecutionMode,
    /// Approvals mined during this attempt.
    pub approvals: Vec<B256>,
    /// One hash for an atomic bundle, one per operation for a sequential run.
    pub tx_hashes: Vec<B256>,
}

impl ExecutionReceipt {
    pub fn transaction_hash(&self) -> Option<B256> {
        self.tx_hashes.last().copied()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub bundle: Bundle,
    pub capability: CapabilityResult,
}

pub struct ExecutionEngine {
    session: Arc<dyn WalletSession>,
    networks: NetworkTable,
    negotiator: CapabilityNegotiator,
    estimator: CostEstimator,
    target_chain: u64,
    gas_limit_multiplier_bps: u64,
    context: Option<ClientContext>,
}

impl ExecutionEngine {
    pub fn new(
        session: Arc<dyn WalletSession>,
        networks: NetworkTable,
        estimator: CostEstimator,
        target_chain: u64,
        gas_limit_multiplier_bps: u64,
    ) -> Self {
        Self {
            session,
            negotiator: CapabilityNegotiator::new(networks.clone()),
            networks,
            estimator,
            target_chain,
            gas_limit_multiplier_bps,
            context: None,
        }
    }

    pub fn set_target_chain(&mut self, chain_id: u64) {
        if chain_id != self.target_chain {
            tracing::info!(target: "execution", from = self.target_chain, to = chain_id, "Target chain changed");
            self.target_chain = chain_id;
            self.context = None;
        }
    }

    pub fn target_chain(&self) -> u64 {
        self.target_chain
    }

    pub fn context(&self) -> Option<&ClientContext> {
        self.context.as_ref()
    }

    pub async fn check_capability(&self) -> CapabilityResult {
        self.negotiator.check_support(Some(&*self.session)).await
    }

    /// Rebuild the client context for `chain_id` from a fresh capability check.
    pub async fn rebind_to_chain(&mut self, chain_id: u64) -> CapabilityResult {
        let capability = self.check_capability().await;
        let contract = capability
            .contract()
            .filter(|_| capability.chain_id() == Some(chain_id));
        let context = ClientContext {
            bound_chain: chain_id,
            owner: self.session.account(),
            contract,
        };
        tracing::debug!(target: "execution", context = ?context, "Client context rebound");
        self.context = Some(context);
        capability
    }

    /// Compile, move the wallet to the target chain, check capability and estimate.
    /// Nothing is signed. The bundle is stamped with the chain the preview saw.
    pub async fn preview(
        &mut self,
        assets: &[Asset],
        owner: &str,
        recipient: &str,
    ) -> Result<Preview, TransferError> {
        let operations = compile(assets, owner, recipient)?;
        let owner = require_address("owner", owner)?;
        let recipient = require_address("recipient", recipient)?;
        let target = self.target_chain;

        if let Ok(live) = self.session.chain_id().await
            && live != target
        {
            ensure_chain(&*self.session, &self.networks, target).await?;
        }
        let capability = self.check_capability().await;
        if let Some(live) = capability.chain_id()
            && live != target
        {
            return Err(TransferError::NetworkChanged {
                expected: target,
                actual: live,
            });
        }
        let estimate = self
            .estimator
            .estimate(&operations, owner, Some(&*self.session))
            .await;

        let degraded = estimate.is_degraded();
        let mut bundle = Bundle::new(target, owner, recipient, operations);
        bundle.estimate = Some(estimate);
        bundle.previewed_chain = capability.chain_id();
        tracing::info!(
            target: "execution",
            chain_id = bundle.chain_id,
            operations = bundle.len(),
            atomic = capability.is_supported(),
            degraded,
            "Preview ready"
        );
        Ok(Preview { bundle, capability })
    }

    /// Execute through the batch executor when the chain has one, otherwise one
    /// transaction per operation. A wallet that left the previewed chain is refused
    /// with `NetworkChanged`; a fresh preview is needed. Safe to call again after a
    /// failure: network, capability and allowances are re-checked every time.
    pub async fn execute(&mut self, bundle: &mut Bundle) -> Result<ExecutionReceipt, TransferError> {
        if bundle.is_empty() {
            return Err(TransferError::EmptySelection);
        }
        let target = bundle.chain_id;
        let session = Arc::clone(&self.session);

        match session.account() {
            Some(account) if account == bundle.owner => {}
            Some(account) => {
                return Err(TransferError::SubmissionRejected(format!(
                    "connected account {account:#x} is not the bundle owner {:#x}",
                    bundle.owner
                )));
            }
            None => {
                return Err(TransferError::CapabilityUnavailable(
                    "wallet not connected".to_string(),
                ));
            }
        }

        if let Some(previewed) = bundle.previewed_chain
            && let Ok(live) = session.chain_id().await
            && live != previewed
        {
            tracing::warn!(target: "execution", previewed, live, "Wallet chain changed since preview");
            return Err(TransferError::NetworkChanged {
                expected: previewed,
                actual: live,
            });
        }

        ensure_chain(&*session, &self.networks, target).await?;
        let capability = self.rebind_to_chain(target).await;

        let result = match capability {
            CapabilityResult::Supported { chain_id, .. }
            | CapabilityResult::Unsupported { chain_id }
                if chain_id != target =>
            {
                Err(TransferError::NetworkChanged {
                    expected: target,
                    actual: chain_id,
                })
            }
            CapabilityResult::Supported { contract, .. } => {
                self.execute_atomic(&*session, bundle, contract).await
            }
            CapabilityResult::Unsupported { .. } => self.execute_sequential(&*session, bundle).await,
            CapabilityResult::Unavailable { reason } => {
                tracing::warn!(target: "execution", reason = %reason, "Capability unavailable; assuming unsupported");
                self.execute_sequential(&*session, bundle).await
            }
        };

        match &result {
            Ok(receipt) => {
                bundle.execution_id = receipt.transaction_hash();
                tracing::info!(
                    target: "execution",
                    chain_id = target,
                    mode = ?receipt.mode,
                    transactions = receipt.tx_hashes.len(),
                    "Bundle executed"
                );
            }
            Err(e) => {
                tracing::error!(
                    target: "execution",
                    chain_id = target,
                    on_chain = ?e.on_chain_effect(),
                    error = %e,
                    "Bundle execution failed"
                );
            }
        }
        result
    }

    async fn gas_limit(
        &self,
        session: &dyn WalletSession,
        request: &TransactionRequest,
        fallback: u64,
    ) -> u64 {
        let gas = match session.estimate_gas(request).await {
            Ok(gas) => gas,
            Err(e) => {
                tracing::debug!(target: "execution", error = %e, fallback, "Gas estimate failed; using fallback");
                fallback
            }
        };
        apply_bps(gas, self.gas_limit_multiplier_bps)
    }

    async fn execute_atomic(
        &self,
        session: &dyn WalletSession,
        bundle: &Bundle,
        contract: Address,
    ) -> Result<ExecutionReceipt, TransferError> {
        let target = bundle.chain_id;
        let lowered = lower_for_batch(&bundle.operations, bundle.owner, bundle.recipient);

        let approvals = AllowanceManager::new(
            session,
            bundle.owner,
            contract,
            target,
            self.gas_limit_multiplier_bps,
        )
        .ensure(&bundle.operations)
        .await?;

        let fallback = lowered
            .iter()
            .map(|op| op.gas_hint.unwrap_or_else(|| static_gas(op)))
            .fold(GAS_BATCH_OVERHEAD, u64::saturating_add);
        let mut request = TransactionRequest {
            from: Some(bundle.owner),
            to: Some(TxKind::Call(contract)),
            value: Some(bundle.total_value()),
            input: TransactionInput::new(encode_batch(&lowered)),
            ..Default::default()
        };
        request.gas = Some(self.gas_limit(session, &request, fallback).await);

        assert_still_on(session, target).await?;
        tracing::info!(
            target: "execution",
            chain_id = target,
            contract = %contract,
            operations = lowered.len(),
            "Submitting atomic bundle"
        );
        match send_and_confirm(session, request, "batch").await {
            Confirmation::Mined(outcome) if outcome.success => Ok(ExecutionReceipt {
                chain_id: target,
                mode: ExecutionMode::Atomic { contract },
                approvals,
                tx_hashes: vec![outcome.tx_hash],
            }),
            Confirmation::Mined(outcome) => Err(TransferError::RevertedOnChain {
                tx_hash: outcome.tx_hash,
            }),
            Confirmation::NotSubmitted { reason } => Err(TransferError::SubmissionRejected(reason)),
            Confirmation::Unknown { tx_hash, reason } => {
                Err(TransferError::ReceiptUnknown { tx_hash, reason })
            }
        }
    }

    async fn execute_sequential(
        &self,
        session: &dyn WalletSession,
        bundle: &Bundle,
    ) -> Result<ExecutionReceipt, TransferError> {
        let target = bundle.chain_id;
        let total = bundle.len();
        let mut succeeded: Vec<B256> = Vec::with_capacity(total);

        for (index, op) in bundle.operations.iter().enumerate() {
            if let Err(e) = assert_still_on(session, target).await {
                if succeeded.is_empty() {
                    return Err(e);
                }
                return Err(TransferError::PartialSequentialFailure {
                    succeeded,
                    failed_position: index + 1,
                    total,
                    failed_tx_hash: None,
                    reason: e.to_string(),
                });
            }

            let mut request = request_for(op, bundle.owner);
            let fallback = op.gas_hint.unwrap_or_else(|| static_gas(op));
            request.gas = Some(self.gas_limit(session, &request, fallback).await);

            tracing::info!(
                target: "execution",
                index = index + 1,
                total,
                asset = %op.label,
                "Submitting sequential transfer"
            );
            match send_and_confirm(session, request, &op.label).await {
                Confirmation::Mined(outcome) if outcome.success => succeeded.push(outcome.tx_hash),
                failed => return Err(sequential_failure(succeeded, index, total, failed)),
            }
        }

        Ok(ExecutionReceipt {
            chain_id: target,
            mode: ExecutionMode::Sequential,
            approvals: Vec::new(),
            tx_hashes: succeeded,
        })
    }
}

fn sequential_failure(
    succeeded: Vec<B256>,
    index: usize,
    total: usize,
    failed: Confirmation,
) -> TransferError {
    if succeeded.is_empty() {
        return match failed {
            Confirmation::Mined(outcome) => TransferError::RevertedOnChain {
                tx_hash: outcome.tx_hash,
            },
            Confirmation::NotSubmitted { reason } => TransferError::SubmissionRejected(reason),
            Confirmation::Unknown { tx_hash, reason } => {
                TransferError::ReceiptUnknown { tx_hash, reason }
            }
        };
    }
    let (failed_tx_hash, reason) = match failed {
        Confirmation::Mined(outcome) => (Some(outcome.tx_hash), "reverted on-chain".to_string()),
        Confirmation::NotSubmitted { reason } => (None, reason),
        Confirmation::Unknown { tx_hash, reason } => {
            (Some(tx_hash), format!("receipt unknown: {reason}"))
        }
    };
    TransferError::PartialSequentialFailure {
        succeeded,
        failed_position: index + 1,
        total,
        failed_tx_hash,
        reason,
    }
}
