// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::SECRET_SESSION_KEY;
use crate::common::error::{AppError, SessionKeyError, VaultError};
use crate::infrastructure::security::vault::Vault;
use rand::RngCore;
use rand::rngs::OsRng;
use starknet::core::crypto::Signature;
use starknet::core::types::Felt;
use starknet::signers::{SigningKey, VerifyingKey};
use std::fmt;
use zeroize::Zeroizing;

/// STARK-curve ECDSA signature over a transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSignature {
    r: Felt,
    s: Felt,
}

impl SessionSignature {
    /// `[r, s]` as 0x-prefixed felts, the layout account `__validate__` expects.
    pub fn to_felts(&self) -> Vec<String> {
        vec![self.r.to_hex_string(), self.s.to_hex_string()]
    }
}

pub struct SessionKeyPair {
    secret: Zeroizing<[u8; 32]>,
    public_key: Felt,
}

impl SessionKeyPair {
    pub fn generate() -> Self {
        let mut secret = Zeroizing::new([0u8; 32]);
        loop {
            OsRng.fill_bytes(&mut secret[..]);
            // Below 2^251, so always under the curve order.
            secret[0] &= 0x07;
            if check_scalar(&secret).is_ok() {
                return Self::from_secret(secret);
            }
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> Result<Self, SessionKeyError> {
        let secret = Zeroizing::new(seed);
        check_scalar(&secret)?;
        Ok(Self::from_secret(secret))
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, SessionKeyError> {
        let raw: [u8; 32] = bytes.try_into().map_err(|_| {
            SessionKeyError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_seed(raw)
    }

    fn from_secret(secret: Zeroizing<[u8; 32]>) -> Self {
        let public_key = signing_key(&secret).verifying_key().scalar();
        Self { secret, public_key }
    }

    /// Public key felt to register with the account.
    pub fn public_key(&self) -> String {
        self.public_key.to_hex_string()
    }

    pub fn sign(&self, hash: &Felt) -> Result<SessionSignature, SessionKeyError> {
        signing_key(&self.secret)
            .sign(hash)
            .map(|sig| SessionSignature { r: sig.r, s: sig.s })
            .map_err(|e| SessionKeyError::Signing(e.to_string()))
    }

    pub fn verify(&self, hash: &Felt, signature: &SessionSignature) -> bool {
        let sig = Signature {
            r: signature.r,
            s: signature.s,
        };
        VerifyingKey::from_scalar(self.public_key)
            .verify(hash, &sig)
            .unwrap_or(false)
    }
}

fn signing_key(secret: &[u8; 32]) -> SigningKey {
    SigningKey::from_secret_scalar(Felt::from_bytes_be(secret))
}

/// Non-zero and below 2^251.
fn check_scalar(secret: &[u8; 32]) -> Result<(), SessionKeyError> {
    if secret[0] > 0x07 {
        return Err(SessionKeyError::InvalidKey("scalar exceeds 251 bits".into()));
    }
    if secret.iter().all(|b| *b == 0) {
        return Err(SessionKeyError::InvalidKey("zero scalar".into()));
    }
    Ok(())
}

impl fmt::Debug for SessionKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Signing capability of the bot. Absent key means read-only mode.
#[derive(Debug, Default)]
pub struct SessionKey {
    pair: Option<SessionKeyPair>,
}

impl SessionKey {
    pub fn generate() -> Self {
        let pair = SessionKeyPair::generate();
        tracing::info!(target: "session_key", public_key = %pair.public_key(), "Session key generated");
        Self { pair: Some(pair) }
    }

    pub fn from_seed(seed: [u8; 32]) -> Result<Self, SessionKeyError> {
        SessionKeyPair::from_seed(seed).map(|pair| Self { pair: Some(pair) })
    }

    pub fn locked() -> Self {
        Self { pair: None }
    }

    /// Load the persisted session key, or a locked key when none was stored.
    pub fn load(vault: &Vault) -> Result<Self, AppError> {
        let Some(bytes) = vault.secret(SECRET_SESSION_KEY)? else {
            tracing::warn!(target: "session_key", "No session key in vault; running read-only");
            return Ok(Self::locked());
        };
        let pair = SessionKeyPair::from_slice(&bytes)?;
        tracing::info!(target: "session_key", public_key = %pair.public_key(), "Session key loaded");
        Ok(Self { pair: Some(pair) })
    }

    /// Returns `false` for a locked key; nothing is written in that case.
    pub fn store(&self, vault: &mut Vault) -> Result<bool, VaultError> {
        let Some(pair) = &self.pair else {
            return Ok(false);
        };
        vault.store_secret(SECRET_SESSION_KEY, pair.secret.as_slice())?;
        Ok(true)
    }

    pub fn is_locked(&self) -> bool {
        self.pair.is_none()
    }

    pub fn public_key(&self) -> Option<String> {
        self.pair.as_ref().map(SessionKeyPair::public_key)
    }

    pub fn sign(&self, hash: &Felt) -> Result<SessionSignature, SessionKeyError> {
        self.pair.as_ref().ok_or(SessionKeyError::Locked)?.sign(hash)
    }

    pub fn verify(&self, hash: &Felt, signature: &SessionSignature) -> bool {
        self.pair
            .as_ref()
            .is_some_and(|pair| pair.verify(hash, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::security::vault::KdfParams;

    const SEED: [u8; 32] = [7u8; 32];

    fn scalar_one() -> [u8; 32] {
        let mut seed = [0u8; 32];
        seed[31] = 1;
        seed
    }

    #[test]
    fn signatures_verify_against_own_public_half_only() {
        let key = SessionKey::from_seed(SEED).expect("seed");
        let other = SessionKey::generate();
        let hash = Felt::from(0x1234_5678u64);
        let sig = key.sign(&hash).expect("sign");

        assert!(key.verify(&hash, &sig));
        assert!(!key.verify(&Felt::from(0x1234_5679u64), &sig));
        assert!(!other.verify(&hash, &sig));
    }

    #[test]
    fn locked_key_refuses_to_sign() {
        let key = SessionKey::locked();
        assert!(key.is_locked());
        assert_eq!(key.sign(&Felt::ONE), Err(SessionKeyError::Locked));
        assert!(key.public_key().is_none());
    }

    #[test]
    fn generated_keys_are_independent() {
        let a = SessionKey::generate();
        let b = SessionKey::generate();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn public_key_of_scalar_one_is_the_generator() {
        let key = SessionKey::from_seed(scalar_one()).expect("seed");
        assert_eq!(
            key.public_key().as_deref(),
            Some("0x1ef15c18599971b7beced415a40f0c7deacfd9b0d1819e03d723d8bc943cfca")
        );
    }

    #[test]
    fn out_of_range_scalars_are_rejected() {
        assert!(matches!(
            SessionKey::from_seed([0xff; 32]),
            Err(SessionKeyError::InvalidKey(_))
        ));
        assert!(matches!(
            SessionKey::from_seed([0u8; 32]),
            Err(SessionKeyError::InvalidKey(_))
        ));
    }

    #[test]
    fn signature_is_two_felts() {
        let key = SessionKey::from_seed(SEED).expect("seed");
        let felts = key.sign(&Felt::from(42u8)).expect("sign").to_felts();
        assert_eq!(felts.len(), 2);
        for felt in &felts {
            assert!(felt.starts_with("0x"));
            assert!(felt.len() <= 2 + 63);
        }
    }

    #[test]
    fn debug_never_shows_private_bytes() {
        let key = SessionKey::from_seed(SEED).expect("seed");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains(&hex::encode(SEED)));
        assert!(!rendered.to_lowercase().contains("0707070707"));
    }

    #[test]
    fn store_and_load_through_vault() {
        let path = std::env::temp_dir().join(format!(
            "session-key-{}-{}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let params = KdfParams {
            m_cost_kib: 64,
            t_cost: 1,
            p_cost: 1,
        };
        let mut vault = Vault::create(&path, "pw", params).expect("create");
        assert!(SessionKey::load(&vault).expect("load").is_locked());

        let key = SessionKey::from_seed(SEED).expect("seed");
        assert!(key.store(&mut vault).expect("store"));
        assert!(!SessionKey::locked().store(&mut vault).expect("noop"));

        let reopened = Vault::unlock(&path, "pw").expect("unlock");
        let loaded = SessionKey::load(&reopened).expect("load");
        assert_eq!(loaded.public_key(), key.public_key());
        std::fs::remove_file(&path).ok();
    }
}
