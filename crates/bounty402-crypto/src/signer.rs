//! Validator key and EIP-191 recoverable signing
//!
//! The escrow contract verifies attestations with `ecrecover` over the
//! personal-message hash of the digest, so the signature here must be the
//! 65-byte r || s || v form with v in {27, 28}.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};

use crate::{CryptoError, CryptoResult};

const EIP191_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Hash a 32-byte digest under the personal-message signing convention
pub fn eip191_message_hash(digest: &B256) -> B256 {
    let mut message = Vec::with_capacity(EIP191_PREFIX.len() + 32);
    message.extend_from_slice(EIP191_PREFIX);
    message.extend_from_slice(digest.as_slice());
    keccak256(message)
}

/// Derive the Ethereum address of a secp256k1 verifying key
pub fn address_of(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point marker.
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// A locally-held secp256k1 identity (validator, submitter or buyer key)
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish()
    }
}

impl LocalSigner {
    /// Load from a `0x` + 64-hex private key string
    pub fn from_hex(raw: &str) -> CryptoResult<Self> {
        let body = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(body).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        let address = address_of(key.verifying_key());
        Ok(Self { key, address })
    }

    /// Generate a fresh key (tests and local demos)
    pub fn random() -> Self {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest under the EIP-191 convention.
    ///
    /// Returns the 65-byte r || s || v signature the escrow contract's
    /// recovery check expects.
    pub fn sign_digest(&self, digest: &B256) -> CryptoResult<[u8; 65]> {
        let prehash = eip191_message_hash(digest);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(prehash.as_slice())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }

    /// Sign and hex-encode with 0x prefix
    pub fn sign_digest_hex(&self, digest: &B256) -> CryptoResult<String> {
        Ok(format!("0x{}", hex::encode(self.sign_digest(digest)?)))
    }

    /// Sign an arbitrary 32-byte prehash directly (EIP-712 payloads)
    pub fn sign_prehash(&self, prehash: &B256) -> CryptoResult<[u8; 65]> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(prehash.as_slice())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }

    /// Raw recoverable signature over a prehash (transaction signing)
    pub fn sign_prehash_raw(&self, prehash: &B256) -> CryptoResult<(EcdsaSignature, RecoveryId)> {
        self.key
            .sign_prehash_recoverable(prehash.as_slice())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))
    }
}

/// Recover the signer address of an EIP-191 digest signature
pub fn recover_digest_signer(digest: &B256, signature: &[u8]) -> CryptoResult<Address> {
    if signature.len() != 65 {
        return Err(CryptoError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            signature.len()
        )));
    }
    let v = signature[64];
    let recovery_id = RecoveryId::try_from(v.checked_sub(27).ok_or_else(|| {
        CryptoError::InvalidSignature(format!("v byte {v} below 27"))
    })?)
    .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let ecdsa = EcdsaSignature::from_slice(&signature[..64])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let prehash = eip191_message_hash(digest);
    let key = VerifyingKey::recover_from_prehash(prehash.as_slice(), &ecdsa, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    Ok(address_of(&key))
}
