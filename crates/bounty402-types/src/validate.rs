//! Field-level shape validation for caller-supplied hex values

use alloy_primitives::{Address, B256};

use crate::{Bounty402Error, Result};

fn is_hex_body(body: &str, len: usize) -> bool {
    body.len() == len && body.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Validate a `0x` + 40-hex address, returning the parsed value
pub fn require_address(field: &str, raw: &str) -> Result<Address> {
    let body = raw
        .strip_prefix("0x")
        .filter(|body| is_hex_body(body, 40))
        .ok_or_else(|| Bounty402Error::invalid_input(field, "expected 0x + 40 hex chars"))?;
    let mut bytes = [0u8; 20];
    hex::decode_to_slice(body, &mut bytes)
        .map_err(|e| Bounty402Error::invalid_input(field, e.to_string()))?;
    Ok(Address::from(bytes))
}

/// Validate a `0x` + 64-hex word (tx hash, artifact hash), returning the parsed value
pub fn require_b256(field: &str, raw: &str) -> Result<B256> {
    let body = raw
        .strip_prefix("0x")
        .filter(|body| is_hex_body(body, 64))
        .ok_or_else(|| Bounty402Error::invalid_input(field, "expected 0x + 64 hex chars"))?;
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(body, &mut bytes)
        .map_err(|e| Bounty402Error::invalid_input(field, e.to_string()))?;
    Ok(B256::from(bytes))
}

/// Validate a transaction hash (alias kept for call-site readability)
pub fn require_tx_hash(field: &str, raw: &str) -> Result<B256> {
    require_b256(field, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_shapes() {
        assert!(require_address("claimant", &format!("0x{}", "ab".repeat(20))).is_ok());
        assert!(require_address("claimant", "0x123").is_err());
        assert!(require_address("claimant", &"ab".repeat(20)).is_err());
        assert!(require_address("claimant", &format!("0x{}g", "ab".repeat(19))).is_err());
    }

    #[test]
    fn test_b256_shapes() {
        assert!(require_b256("artifactHash", &format!("0x{}", "0f".repeat(32))).is_ok());
        assert!(require_b256("artifactHash", &format!("0x{}", "0f".repeat(31))).is_err());
    }
}
