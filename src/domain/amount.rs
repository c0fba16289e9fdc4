// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Decimal balance strings to integer base units and back.
//!
//! All arithmetic stays in `U256`; floats never touch an amount.

use alloy::primitives::U256;

/// Largest exponent for which `10^d` still fits a `U256`.
pub const MAX_SCALE_DECIMALS: u8 = 77;

/// Exponents beyond this magnitude are rejected before any shifting.
pub const MAX_EXPONENT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaledAmount {
    /// Zero, negative, or truncated to zero by the decimals count.
    NonPositive,
    Positive(U256),
}

/// `floor(balance * 10^decimals)`.
///
/// Accepts plain decimals (`"2.5"`, `".5"`, `"-1"`) and an optional exponent
/// (`"1.5e-3"`). Digits past `decimals` are truncated.
pub fn scale_to_base_units(balance: &str, decimals: u8) -> Result<ScaledAmount, String> {
    let raw = balance.trim();
    if raw.is_empty() {
        return Err("empty balance".into());
    }
    if decimals > MAX_SCALE_DECIMALS {
        return Err(format!("decimals {decimals} exceed {MAX_SCALE_DECIMALS}"));
    }

    let (negative, unsigned) = match raw.as_bytes()[0] {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(pos) => {
            let exp: i64 = unsigned[pos + 1..]
                .parse()
                .map_err(|_| format!("bad exponent in {raw:?}"))?;
            if exp.unsigned_abs() > MAX_EXPONENT.unsigned_abs() {
                return Err(format!("exponent in {raw:?} out of range"));
            }
            (&unsigned[..pos], exp)
        }
        None => (unsigned, 0),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(format!("no digits in {raw:?}"));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(format!("non-numeric balance {raw:?}"));
    }

    // Shift the decimal point: value = digits * 10^(shift), digits = int_part ++ frac_part.
    let digits = format!("{int_part}{frac_part}");
    let shift = i64::try_from(frac_part.len())
        .ok()
        .and_then(|frac_len| exponent.checked_add(i64::from(decimals))?.checked_sub(frac_len))
        .ok_or_else(|| format!("{raw:?} overflows the decimal shift"))?;

    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(ScaledAmount::NonPositive);
    }

    let kept: &str = if shift >= 0 {
        trimmed
    } else {
        let drop = usize::try_from(shift.unsigned_abs()).unwrap_or(usize::MAX);
        if drop >= trimmed.len() {
            return Ok(ScaledAmount::NonPositive);
        }
        &trimmed[..trimmed.len() - drop]
    };

    let mut value = U256::from_str_radix(kept, 10).map_err(|_| format!("{raw:?} overflows 256 bits"))?;
    if shift > 0 {
        let factor = pow10(shift.unsigned_abs()).ok_or_else(|| format!("{raw:?} overflows 256 bits"))?;
        value = value
            .checked_mul(factor)
            .ok_or_else(|| format!("{raw:?} overflows 256 bits"))?;
    }

    if negative || value.is_zero() {
        return Ok(ScaledAmount::NonPositive);
    }
    Ok(ScaledAmount::Positive(value))
}

/// Render base units as a decimal string without trailing zeros (`2500000`, 6 → `"2.5"`).
pub fn format_base_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let Some(scale) = pow10(u64::from(decimals.min(MAX_SCALE_DECIMALS))) else {
        return value.to_string();
    };
    let whole = value / scale;
    let frac = value % scale;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = usize::from(decimals));
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Render wei with exactly `places` fractional digits, truncating the rest.
pub fn format_fixed(value: U256, decimals: u8, places: u8) -> String {
    let places = places.min(decimals);
    let Some(scale) = pow10(u64::from(decimals)) else {
        return value.to_string();
    };
    let whole = value / scale;
    if places == 0 {
        return whole.to_string();
    }
    let Some(cut) = pow10(u64::from(decimals - places)) else {
        return value.to_string();
    };
    let frac = (value % scale) / cut;
    format!(
        "{whole}.{:0>width$}",
        frac.to_string(),
        width = usize::from(places)
    )
}

pub fn pow10(exp: u64) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}
