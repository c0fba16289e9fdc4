// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::TransferError;
use alloy::primitives::Address;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_u128_hex(s: &str) -> Option<u128> {
    u128::from_str_radix(strip_0x(s.trim()), 16).ok()
}

/// Strict account identifier: `0x` followed by exactly 40 hex digits.
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lower and all-upper are accepted.
pub fn parse_account_address(raw: &str) -> Option<Address> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))?;
    if body.len() != 40 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{body}"), None).ok();
    }
    let bytes = hex::decode(body).ok()?;
    Some(Address::from_slice(&bytes))
}

pub fn require_address(role: &'static str, raw: &str) -> Result<Address, TransferError> {
    parse_account_address(raw).ok_or_else(|| TransferError::InvalidAddress {
        role,
        value: raw.to_string(),
    })
}
