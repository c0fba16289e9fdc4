// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Selected assets to ordered sub-operations, plus the batch-executor encoding.

use crate::common::parsing::require_address;
use crate::data::abi::{IBatchExecutor, IERC20, IERC721};
use crate::domain::amount::{ScaledAmount, scale_to_base_units};
use crate::domain::asset::{Asset, AssetKind};
use crate::domain::bundle::{SubOperation, TransferKind};
use crate::domain::constants::{
    GAS_FUNGIBLE_TRANSFER, GAS_NATIVE_TRANSFER, GAS_NON_FUNGIBLE_TRANSFER,
};
use crate::domain::error::TransferError;
use alloy::primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

/// Compile the selected assets, in selection order. Zero balances are skipped; every
/// other failure is an error.
pub fn compile(
    assets: &[Asset],
    owner: &str,
    recipient: &str,
) -> Result<Vec<SubOperation>, TransferError> {
    let owner = require_address("owner", owner)?;
    let recipient = require_address("recipient", recipient)?;
    compile_for(assets, owner, recipient)
}

pub fn compile_for(
    assets: &[Asset],
    owner: Address,
    recipient: Address,
) -> Result<Vec<SubOperation>, TransferError> {
    if owner == recipient {
        return Err(TransferError::SelfTransfer);
    }
    if recipient == Address::ZERO {
        return Err(TransferError::InvalidAddress {
            role: "recipient",
            value: format!("{recipient:#x}"),
        });
    }
    let selected: Vec<&Asset> = assets.iter().filter(|a| a.selected).collect();
    if selected.is_empty() {
        return Err(TransferError::EmptySelection);
    }

    let mut ops = Vec::with_capacity(selected.len());
    for asset in selected {
        match compile_asset(asset, owner, recipient)? {
            Some(op) => ops.push(op),
            None => {
                tracing::debug!(target: "compiler", asset = %asset.key(), "Skipping zero balance");
            }
        }
    }
    tracing::debug!(target: "compiler", operations = ops.len(), "Bundle compiled");
    Ok(ops)
}

fn scaled_amount(asset: &Asset) -> Result<Option<U256>, TransferError> {
    match scale_to_base_units(&asset.balance, asset.decimals) {
        Ok(ScaledAmount::Positive(v)) => Ok(Some(v)),
        Ok(ScaledAmount::NonPositive) => Ok(None),
        Err(reason) => Err(TransferError::InvalidBalance {
            asset: asset.label(),
            value: asset.balance.clone(),
            reason,
        }),
    }
}

fn require_contract(asset: &Asset) -> Result<Address, TransferError> {
    if asset.contract == Address::ZERO {
        return Err(TransferError::InvalidAddress {
            role: "asset contract",
            value: format!("{:#x} ({})", asset.contract, asset.label()),
        });
    }
    Ok(asset.contract)
}

fn parse_token_id(asset: &Asset) -> Result<U256, TransferError> {
    asset
        .token_id_value()
        .ok_or_else(|| TransferError::InvalidBalance {
            asset: asset.label(),
            value: asset.token_id.as_deref().unwrap_or_default().trim().to_string(),
            reason: "token id is not an integer".into(),
        })
}

fn compile_asset(
    asset: &Asset,
    owner: Address,
    recipient: Address,
) -> Result<Option<SubOperation>, TransferError> {
    let label = asset.label();
    let op = match asset.kind {
        AssetKind::Native => {
            let Some(amount) = scaled_amount(asset)? else {
                return Ok(None);
            };
            SubOperation {
                target: recipient,
                value: amount,
                calldata: Bytes::new(),
                gas_hint: Some(GAS_NATIVE_TRANSFER),
                transfer: TransferKind::Native { amount },
                label,
            }
        }
        AssetKind::Fungible => {
            let Some(amount) = scaled_amount(asset)? else {
                return Ok(None);
            };
            let token = require_contract(asset)?;
            let call = IERC20::transferCall {
                to: recipient,
                amount,
            };
            SubOperation {
                target: token,
                value: U256::ZERO,
                calldata: Bytes::from(call.abi_encode()),
                gas_hint: Some(GAS_FUNGIBLE_TRANSFER),
                transfer: TransferKind::Fungible { token, amount },
                label,
            }
        }
        AssetKind::NonFungible => {
            let collection = require_contract(asset)?;
            let token_id = parse_token_id(asset)?;
            let call = IERC721::transferFromCall {
                from: owner,
                to: recipient,
                tokenId: token_id,
            };
            SubOperation {
                target: collection,
                value: U256::ZERO,
                calldata: Bytes::from(call.abi_encode()),
                gas_hint: Some(GAS_NON_FUNGIBLE_TRANSFER),
                transfer: TransferKind::NonFungible {
                    collection,
                    token_id,
                },
                label,
            }
        }
    };
    Ok(Some(op))
}

/// Rewrite sub-operations for execution by the batch executor, which is `msg.sender` for
/// every inner call: token transfers pull from the owner through the allowance.
pub fn lower_for_batch(
    ops: &[SubOperation],
    owner: Address,
    recipient: Address,
) -> Vec<SubOperation> {
    ops.iter()
        .map(|op| match &op.transfer {
            TransferKind::Fungible { token, amount } => {
                let call = IERC20::transferFromCall {
                    from: owner,
                    to: recipient,
                    amount: *amount,
                };
                SubOperation {
                    target: *token,
                    calldata: Bytes::from(call.abi_encode()),
                    ..op.clone()
                }
            }
            TransferKind::Native { .. } | TransferKind::NonFungible { .. } => op.clone(),
        })
        .collect()
}

/// `executeBatch(targets, values, calldatas)` over `ops`, in order.
pub fn encode_batch(ops: &[SubOperation]) -> Bytes {
    let call = IBatchExecutor::executeBatchCall {
        targets: ops.iter().map(|op| op.target).collect(),
        values: ops.iter().map(|op| op.value).collect(),
        calldatas: ops.iter().map(|op| op.calldata.clone()).collect(),
    };
    Bytes::from(call.abi_encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::{UNKNOWN_NAME, UNKNOWN_SYMBOL};

    const OWNER: &str = "0x1111111111111111111111111111111111111111";
    const RECIPIENT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn token(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn single_native_asset_compiles_to_plain_transfer() {
        let assets = vec![Asset::native("ETH", "1.0").with_selected(true)];
        let ops = compile(&assets, OWNER, RECIPIENT).expect("compile");
        assert_eq!(ops.len(), 1);
        assert!(ops[0].calldata.is_empty());
        assert_eq!(ops[0].value, U256::from(1_000_000_000_000_000_000u128));
        assert_eq!(ops[0].gas_hint, Some(GAS_NATIVE_TRANSFER));
        assert_eq!(ops[0].target, require_address("r", RECIPIENT).expect("addr"));
    }

    #[test]
    fn fungible_calldata_is_selector_recipient_amount() {
        let assets = vec![Asset::fungible(token(0xaa), "Token", "TKN", "2.5", 6).with_selected(true)];
        let ops = compile(&assets, OWNER, RECIPIENT).expect("compile");
        let expected = format!(
            "a9059cbb{:0>64}{:0>64}",
            "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            format!("{:x}", 2_500_000u64)
        );
        assert_eq!(hex::encode(&ops[0].calldata), expected);
        assert_eq!(ops[0].value, U256::ZERO);
        assert_eq!(ops[0].target, token(0xaa));

        let decoded = IERC20::transferCall::abi_decode(&ops[0].calldata).expect("decode");
        assert_eq!(decoded.to, require_address("r", RECIPIENT).expect("addr"));
        assert_eq!(decoded.amount, U256::from(2_500_000u64));
    }

    #[test]
    fn nft_uses_transfer_from_owner() {
        let assets = vec![Asset::non_fungible(token(0xcc), "42", "Punk", "PUNK").with_selected(true)];
        let ops = compile(&assets, OWNER, RECIPIENT).expect("compile");
        let decoded = IERC721::transferFromCall::abi_decode(&ops[0].calldata).expect("decode");
        assert_eq!(decoded.from, require_address("o", OWNER).expect("addr"));
        assert_eq!(decoded.tokenId, U256::from(42u64));
        assert_eq!(ops[0].gas_hint, Some(GAS_NON_FUNGIBLE_TRANSFER));
    }

    #[test]
    fn zero_balances_are_skipped_and_order_is_stable() {
        let assets = vec![
            Asset::fungible(token(0x01), "A", "A", "3", 18).with_selected(true),
            Asset::native("ETH", "0").with_selected(true),
            Asset::fungible(token(0x02), "B", "B", "-1", 18).with_selected(true),
            Asset::fungible(token(0x03), "C", "C", "9", 18),
            Asset::non_fungible(token(0x04), "1", "N", "N").with_selected(true),
            Asset::fungible(token(0x05), "D", "D", "0.5", 0).with_selected(true),
        ];
        let ops = compile(&assets, OWNER, RECIPIENT).expect("compile");
        let targets: Vec<Address> = ops.iter().map(|o| o.target).collect();
        assert_eq!(targets, vec![token(0x01), token(0x04)]);
    }

    #[test]
    fn self_transfer_wins_over_every_other_check() {
        assert_eq!(compile(&[], OWNER, OWNER), Err(TransferError::SelfTransfer));
        let assets = vec![Asset::fungible(Address::ZERO, UNKNOWN_NAME, UNKNOWN_SYMBOL, "x", 18)];
        assert_eq!(compile(&assets, OWNER, OWNER), Err(TransferError::SelfTransfer));
    }

    #[test]
    fn construction_errors_are_typed() {
        assert!(matches!(
            compile(&[], "0x123", RECIPIENT),
            Err(TransferError::InvalidAddress { role: "owner", .. })
        ));
        assert_eq!(
            compile(&[Asset::native("ETH", "1")], OWNER, RECIPIENT),
            Err(TransferError::EmptySelection)
        );
        let bad_contract = vec![Asset::fungible(Address::ZERO, "T", "T", "1", 18).with_selected(true)];
        assert!(matches!(
            compile(&bad_contract, OWNER, RECIPIENT),
            Err(TransferError::InvalidAddress { role: "asset contract", .. })
        ));
        let bad_balance = vec![Asset::fungible(token(9), "T", "T", "lots", 18).with_selected(true)];
        assert!(matches!(
            compile(&bad_balance, OWNER, RECIPIENT),
            Err(TransferError::InvalidBalance { .. })
        ));
    }

    #[test]
    fn batch_lowering_pulls_tokens_from_owner() {
        let owner = require_address("o", OWNER).expect("addr");
        let recipient = require_address("r", RECIPIENT).expect("addr");
        let assets = vec![
            Asset::native("ETH", "0.25").with_selected(true),
            Asset::fungible(token(0xaa), "Token", "TKN", "7", 0).with_selected(true),
            Asset::non_fungible(token(0xcc), "3", "N", "N").with_selected(true),
        ];
        let ops = compile_for(&assets, owner, recipient).expect("compile");
        let lowered = lower_for_batch(&ops, owner, recipient);
        assert_eq!(lowered[0], ops[0]);
        assert_eq!(lowered[2], ops[2]);
        let pulled = IERC20::transferFromCall::abi_decode(&lowered[1].calldata).expect("decode");
        assert_eq!((pulled.from, pulled.to, pulled.amount), (owner, recipient, U256::from(7u64)));

        let batch = IBatchExecutor::executeBatchCall::abi_decode(&encode_batch(&lowered))
            .expect("decode batch");
        assert_eq!(batch.targets, vec![recipient, token(0xaa), token(0xcc)]);
        assert_eq!(batch.values[0], U256::from(250_000_000_000_000_000u128));
        assert_eq!(batch.calldatas[1], lowered[1].calldata);
    }
}
