// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Password-protected secret store.
//!
//! The key is derived with Argon2id from the operator password and a salt
//! that is generated once at provisioning and persisted in the vault file.
//! Records are sealed with ChaCha20-Poly1305 under a fresh random nonce; any
//! tampering surfaces as `VaultError::AuthenticationFailed`.

use crate::common::constants::{
    KDF_DEFAULT_M_COST_KIB, KDF_DEFAULT_P_COST, KDF_DEFAULT_T_COST, VAULT_FORMAT_VERSION,
    VAULT_KEY_LEN, VAULT_NONCE_LEN, VAULT_SALT_LEN,
};
use crate::common::error::VaultError;
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce, Tag};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

const RECORD_AAD: &[u8] = b"stark-refiner/vault/v1";
const CHECK_CONTEXT: &str = "\0check";
const CHECK_PLAINTEXT: &[u8] = b"stark-refiner vault check";
const TAG_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost_kib: KDF_DEFAULT_M_COST_KIB,
            t_cost: KDF_DEFAULT_T_COST,
            p_cost: KDF_DEFAULT_P_COST,
        }
    }
}

/// One sealed secret as it exists on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    #[serde(with = "hex::serde")]
    pub nonce: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub tag: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VaultFile {
    version: u32,
    kdf: KdfParams,
    #[serde(with = "hex::serde")]
    salt: Vec<u8>,
    check: SealedRecord,
    #[serde(default)]
    secrets: BTreeMap<String, SealedRecord>,
}

pub struct Vault {
    path: PathBuf,
    key: Zeroizing<[u8; VAULT_KEY_LEN]>,
    file: VaultFile,
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("path", &self.path)
            .field("secrets", &self.file.secrets.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Provision a new vault at `path`. Refuses to overwrite an existing file.
    pub fn create(
        path: impl AsRef<Path>,
        password: &str,
        params: KdfParams,
    ) -> Result<Self, VaultError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            return Err(VaultError::AlreadyExists(path.display().to_string()));
        }

        let mut salt = vec![0u8; VAULT_SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let key = derive_key(password, &salt, params)?;

        let placeholder = SealedRecord {
            nonce: Vec::new(),
            ciphertext: Vec::new(),
            tag: Vec::new(),
        };
        let mut vault = Self {
            path,
            key,
            file: VaultFile {
                version: VAULT_FORMAT_VERSION,
                kdf: params,
                salt,
                check: placeholder,
                secrets: BTreeMap::new(),
            },
        };
        vault.file.check = vault.seal(CHECK_PLAINTEXT, CHECK_CONTEXT)?;
        vault.persist()?;
        tracing::info!(target: "vault", path = %vault.path.display(), "Vault provisioned");
        Ok(vault)
    }

    /// Re-derive the key from `password` and the persisted salt.
    pub fn unlock(path: impl AsRef<Path>, password: &str) -> Result<Self, VaultError> {
        let path = path.as_ref().to_path_buf();
        let raw = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VaultError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let file: VaultFile =
            serde_json::from_slice(&raw).map_err(|e| VaultError::Corrupt(e.to_string()))?;
        if file.version != VAULT_FORMAT_VERSION {
            return Err(VaultError::Corrupt(format!(
                "unsupported vault version {}",
                file.version
            )));
        }
        if file.salt.len() < 8 {
            return Err(VaultError::Corrupt("salt too short".into()));
        }

        let key = derive_key(password, &file.salt, file.kdf)?;
        let vault = Self { path, key, file };
        let verified = matches!(
            vault.open(&vault.file.check, CHECK_CONTEXT),
            Ok(check) if check.as_slice() == CHECK_PLAINTEXT
        );
        if !verified {
            return Err(VaultError::InvalidPassword);
        }
        tracing::info!(
            target: "vault",
            path = %vault.path.display(),
            secrets = vault.file.secrets.len(),
            "Vault unlocked"
        );
        Ok(vault)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<SealedRecord, VaultError> {
        self.seal(plaintext, "")
    }

    pub fn decrypt(&self, record: &SealedRecord) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        self.open(record, "")
    }

    pub fn has_secret(&self, name: &str) -> bool {
        self.file.secrets.contains_key(name)
    }

    pub fn secret_names(&self) -> Vec<String> {
        self.file.secrets.keys().cloned().collect()
    }

    /// Seal `plaintext` under `name` and persist the vault file.
    pub fn store_secret(&mut self, name: &str, plaintext: &[u8]) -> Result<(), VaultError> {
        let record = self.seal(plaintext, name)?;
        self.file.secrets.insert(name.to_string(), record);
        self.persist()?;
        tracing::info!(target: "vault", secret = name, "Secret stored");
        Ok(())
    }

    pub fn secret(&self, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>, VaultError> {
        match self.file.secrets.get(name) {
            Some(record) => self.open(record, name).map(Some),
            None => Ok(None),
        }
    }

    pub fn remove_secret(&mut self, name: &str) -> Result<bool, VaultError> {
        if self.file.secrets.remove(name).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305, VaultError> {
        ChaCha20Poly1305::new_from_slice(self.key.as_slice())
            .map_err(|e| VaultError::Encryption(e.to_string()))
    }

    // Secrets bind their name into the associated data so records cannot be
    // swapped between entries.
    fn seal(&self, plaintext: &[u8], context: &str) -> Result<SealedRecord, VaultError> {
        let cipher = self.cipher()?;
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let aad = associated_data(context);
        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(&nonce, &aad, &mut buffer)
            .map_err(|e| VaultError::Encryption(e.to_string()))?;
        Ok(SealedRecord {
            nonce: nonce.to_vec(),
            ciphertext: buffer,
            tag: tag.to_vec(),
        })
    }

    fn open(&self, record: &SealedRecord, context: &str) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        if record.nonce.len() != VAULT_NONCE_LEN || record.tag.len() != TAG_LEN {
            return Err(VaultError::AuthenticationFailed);
        }
        let cipher = self.cipher()?;
        let aad = associated_data(context);
        let mut buffer = Zeroizing::new(record.ciphertext.clone());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&record.nonce),
                &aad,
                buffer.as_mut_slice(),
                Tag::from_slice(&record.tag),
            )
            .map_err(|_| VaultError::AuthenticationFailed)?;
        Ok(buffer)
    }

    fn persist(&self) -> Result<(), VaultError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(&self.file)
            .map_err(|e| VaultError::Corrupt(e.to_string()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, body)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn associated_data(context: &str) -> Vec<u8> {
    let mut aad = RECORD_AAD.to_vec();
    aad.extend_from_slice(context.as_bytes());
    aad
}

fn derive_key(
    password: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; VAULT_KEY_LEN]>, VaultError> {
    let argon_params = Params::new(
        params.m_cost_kib,
        params.t_cost,
        params.p_cost,
        Some(VAULT_KEY_LEN),
    )
    .map_err(|e| VaultError::Kdf(e.to_string()))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
    let mut key = Zeroizing::new([0u8; VAULT_KEY_LEN]);
    argon
        .hash_password_into(password.as_bytes(), salt, key.as_mut_slice())
        .map_err(|e| VaultError::Kdf(e.to_string()))?;
    Ok(key)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), VaultError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), VaultError> {
    Ok(())
}
