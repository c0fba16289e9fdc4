// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::retry::with_timeout;
use crate::domain::amount::format_fixed;
use crate::domain::bundle::{CostEstimate, EstimateFidelity, GasPriceSource, SubOperation, TransferKind};
use crate::domain::constants::{
    BPS_DENOMINATOR, DEFAULT_GAS_MARGIN_BPS, DEFAULT_PROBE_TIMEOUT_MS, GAS_FUNGIBLE_TRANSFER,
    GAS_GENERIC_CALL, GAS_NATIVE_TRANSFER, GAS_NON_FUNGIBLE_TRANSFER,
};
use crate::network::gas::GasPriceOracle;
use crate::network::session::WalletSession;
use alloy::primitives::{Address, TxKind, U256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use std::time::Duration;

const NATIVE_DECIMALS: u8 = 18;
const COST_PLACES: u8 = 6;

/// `gas * bps / 10_000`, rounded up.
pub fn apply_bps(gas: u64, bps: u64) -> u64 {
    let scaled = u128::from(gas) * u128::from(bps);
    let denom = u128::from(BPS_DENOMINATOR);
    u64::try_from(scaled.div_ceil(denom)).unwrap_or(u64::MAX)
}

/// Per-kind constant used whenever the network cannot estimate an operation.
pub fn static_gas(op: &SubOperation) -> u64 {
    match op.transfer {
        TransferKind::Native { .. } if op.calldata.is_empty() => GAS_NATIVE_TRANSFER,
        TransferKind::Native { .. } => GAS_GENERIC_CALL,
        TransferKind::Fungible { .. } => GAS_FUNGIBLE_TRANSFER,
        TransferKind::NonFungible { .. } => GAS_NON_FUNGIBLE_TRANSFER,
    }
}

/// Transaction request for `op` sent directly by `from`.
pub fn request_for(op: &SubOperation, from: Address) -> TransactionRequest {
    TransactionRequest {
        from: Some(from),
        to: Some(TxKind::Call(op.target)),
        value: Some(op.value),
        input: TransactionInput::new(op.calldata.clone()),
        ..Default::default()
    }
}

pub struct CostEstimator {
    oracle: GasPriceOracle,
    margin_bps: u64,
    probe_timeout: Duration,
}

impl CostEstimator {
    pub fn new(oracle: GasPriceOracle, margin_bps: u64, probe_timeout: Duration) -> Self {
        Self {
            oracle,
            margin_bps,
            probe_timeout,
        }
    }

    /// Default margin and timeout with only the static tiers.
    pub fn offline() -> Self {
        Self::new(
            GasPriceOracle::offline(),
            DEFAULT_GAS_MARGIN_BPS,
            Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
        )
    }

    /// Gas and cost for `ops` sent by `from`. Never fails: per-operation estimation falls
    /// back to static gas and the price oracle always answers.
    pub async fn estimate(
        &self,
        ops: &[SubOperation],
        from: Address,
        session: Option<&dyn WalletSession>,
    ) -> CostEstimate {
        let mut raw_gas: u64 = 0;
        let mut static_gas_ops = 0usize;
        for (index, op) in ops.iter().enumerate() {
            let network_gas = match session {
                Some(session) => {
                    let req = request_for(op, from);
                    match with_timeout(self.probe_timeout, session.estimate_gas(&req)).await {
                        Ok(gas) => Some(gas),
                        Err(e) => {
                            tracing::debug!(target: "estimator", index, error = %e, "Gas estimate failed; using static value");
                            None
                        }
                    }
                }
                None => None,
            };
            let gas = match network_gas {
                Some(gas) => gas,
                None => {
                    static_gas_ops += 1;
                    static_gas(op)
                }
            };
            raw_gas = raw_gas.saturating_add(gas);
        }

        let aggregate_gas = apply_bps(raw_gas, BPS_DENOMINATOR.saturating_add(self.margin_bps));
        let quote = self.oracle.gas_price(session).await;
        let cost_wei = U256::from(aggregate_gas) * U256::from(quote.price_wei);
        let cost_native = format_fixed(cost_wei, NATIVE_DECIMALS, COST_PLACES);

        let default_gas_price = quote.source == GasPriceSource::Default;
        let fidelity = if static_gas_ops > 0 || default_gas_price {
            tracing::warn!(
                target: "estimator",
                event = "EstimationDegraded",
                static_gas_ops,
                default_gas_price,
                operations = ops.len(),
                "Estimate uses fallback figures"
            );
            EstimateFidelity::Degraded {
                static_gas_ops,
                default_gas_price,
            }
        } else {
            EstimateFidelity::NetworkAware
        };

        CostEstimate {
            aggregate_gas,
            gas_price_wei: quote.price_wei,
            gas_price_source: quote.source,
            cost_wei,
            cost_native,
            fidelity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;

    fn native_op(amount: u64) -> SubOperation {
        SubOperation {
            target: Address::repeat_byte(2),
            value: U256::from(amount),
            calldata: Bytes::new(),
            gas_hint: Some(GAS_NATIVE_TRANSFER),
            transfer: TransferKind::Native {
                amount: U256::from(amount),
            },
            label: "ETH".into(),
        }
    }

    #[test]
    fn bps_rounds_up() {
        assert_eq!(apply_bps(21_000, 10_500), 22_050);
        assert_eq!(apply_bps(3, 10_500), 4);
        assert_eq!(apply_bps(100_000, 20_000), 200_000);
        assert_eq!(apply_bps(u64::MAX, 20_000), u64::MAX);
    }

    #[tokio::test]
    async fn offline_estimate_uses_documented_defaults() {
        let est = CostEstimator::offline()
            .estimate(&[native_op(1)], Address::repeat_byte(1), None)
            .await;
        assert_eq!(est.aggregate_gas, 22_050);
        assert_eq!(est.gas_price_wei, 20_000_000_000);
        assert_eq!(est.gas_price_source, GasPriceSource::Default);
        assert_eq!(est.cost_native, "0.000441");
        assert_eq!(
            est.fidelity,
            EstimateFidelity::Degraded {
                static_gas_ops: 1,
                default_gas_price: true
            }
        );
    }

    #[tokio::test]
    async fn empty_bundle_costs_nothing() {
        let est = CostEstimator::offline()
            .estimate(&[], Address::ZERO, None)
            .await;
        assert_eq!(est.aggregate_gas, 0);
        assert_eq!(est.cost_native, "0.000000");
    }
}
