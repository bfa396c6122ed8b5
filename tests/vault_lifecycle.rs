// SPDX-License-Identifier: MIT
// Provision -> wizard -> restart flow for the vault and session key, on a
// throwaway file with a cheap KDF.

use stark_refiner::common::constants::{SECRET_INFLUENCE_API_KEY, SECRET_SESSION_KEY};
use stark_refiner::domain::error::VaultError;
use stark_refiner::security::{KdfParams, SessionKey, Vault};
use starknet::core::types::Felt;
use std::path::PathBuf;

const FAST_KDF: KdfParams = KdfParams {
    m_cost_kib: 64,
    t_cost: 1,
    p_cost: 1,
};

fn temp_vault_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "stark-refiner-{tag}-{}-{nanos}.json",
        std::process::id()
    ))
}

#[test]
fn session_key_survives_restart() {
    let path = temp_vault_path("restart");

    let mut vault = Vault::create(&path, "correct horse", FAST_KDF).expect("create");
    vault
        .store_secret(SECRET_INFLUENCE_API_KEY, b"influence-token")
        .expect("store api key");
    let key = SessionKey::generate();
    assert!(key.store(&mut vault).expect("store key"));
    let public_key = key.public_key().expect("public key");
    drop(vault);

    let reopened = Vault::unlock(&path, "correct horse").expect("unlock");
    assert_eq!(
        reopened.secret_names(),
        vec![
            SECRET_INFLUENCE_API_KEY.to_string(),
            SECRET_SESSION_KEY.to_string()
        ]
    );
    let api_key = reopened
        .secret(SECRET_INFLUENCE_API_KEY)
        .expect("read api key")
        .expect("api key present");
    assert_eq!(api_key.as_slice(), b"influence-token");

    let loaded = SessionKey::load(&reopened).expect("load key");
    assert_eq!(loaded.public_key().as_deref(), Some(public_key.as_str()));

    let tx_hash = Felt::from_hex("0x5ea1ed").expect("hash");
    let signature = loaded.sign(&tx_hash).expect("sign");
    assert!(key.verify(&tx_hash, &signature));

    std::fs::remove_file(&path).ok();
}

#[test]
fn wrong_password_never_yields_secrets() {
    let path = temp_vault_path("wrong-pw");
    let mut vault = Vault::create(&path, "right", FAST_KDF).expect("create");
    SessionKey::generate().store(&mut vault).expect("store key");
    drop(vault);

    let err = Vault::unlock(&path, "wrong").expect_err("wrong password must fail");
    assert!(matches!(err, VaultError::InvalidPassword));

    std::fs::remove_file(&path).ok();
}

#[test]
fn empty_vault_loads_locked_key() {
    let path = temp_vault_path("empty");
    let vault = Vault::create(&path, "pw", FAST_KDF).expect("create");
    let key = SessionKey::load(&vault).expect("load");
    assert!(key.is_locked());
    assert!(key.sign(&Felt::ONE).is_err());

    std::fs::remove_file(&path).ok();
}
