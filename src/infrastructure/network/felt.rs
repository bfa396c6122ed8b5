// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! Starknet field-element helpers used to build calldata.

use crate::common::error::InvokeError;
use crate::common::parsing::parse_u128_hex;
use starknet::core::types::Felt;
use starknet::core::utils::{cairo_short_string_to_felt, get_selector_from_name};

pub fn parse(field: &'static str, value: &str) -> Result<Felt, InvokeError> {
    Felt::from_hex(value.trim()).map_err(|_| InvokeError::InvalidFelt {
        field,
        value: value.to_string(),
    })
}

pub fn to_hex(value: &Felt) -> String {
    value.to_hex_string()
}

/// Entry-point selector (`sn_keccak` of the name).
pub fn selector(name: &str) -> Result<Felt, InvokeError> {
    get_selector_from_name(name).map_err(|_| InvokeError::Selector(name.to_string()))
}

/// Cairo short string: ASCII, at most 31 characters. Empty is rejected so a
/// blank recipe never encodes as zero.
pub fn short_string(value: &str) -> Result<Felt, InvokeError> {
    if value.is_empty() {
        return Err(InvokeError::ShortString(value.to_string()));
    }
    cairo_short_string_to_felt(value).map_err(|_| InvokeError::ShortString(value.to_string()))
}

/// Recombine a Cairo `u256` returned as `[low, high]` felts. Values above
/// `u128::MAX` saturate; no ETH balance comes close.
pub fn u256_from_felts(low: &str, high: &str) -> Option<u128> {
    let low = parse_u128_hex(low)?;
    let high = parse_u128_hex(high)?;
    if high > 0 {
        return Some(u128::MAX);
    }
    Some(low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::BALANCE_OF_SELECTOR;

    #[test]
    fn selector_matches_known_entry_point() {
        let balance_of = selector("balanceOf").expect("selector");
        assert_eq!(to_hex(&balance_of), BALANCE_OF_SELECTOR);
    }

    #[test]
    fn short_string_packs_ascii() {
        assert_eq!(
            short_string("REFINE").map(|f| to_hex(&f)),
            Ok("0x524546494e45".to_string())
        );
        assert!(short_string("").is_err());
        assert!(short_string(&"x".repeat(32)).is_err());
        assert!(short_string("Stahl\u{00e9}").is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert_eq!(parse("nonce", "0x7").map(|f| to_hex(&f)), Ok("0x7".to_string()));
        assert!(matches!(
            parse("sender_address", "wallet"),
            Err(InvokeError::InvalidFelt { field: "sender_address", .. })
        ));
    }

    #[test]
    fn u256_recombines_low_high() {
        assert_eq!(u256_from_felts("0x64", "0x0"), Some(100));
        assert_eq!(u256_from_felts("0x1", "0x1"), Some(u128::MAX));
        assert_eq!(u256_from_felts("nope", "0x0"), None);
    }
}
