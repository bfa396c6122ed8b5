// SPDX-License-Identifier: MIT
// Fail CI if a committed config file carries a private key or another secret
// that belongs in the vault.

use regex::Regex;
use std::fs;
use std::path::Path;

// 64-hex values are legitimate for contract and wallet addresses, so only
// flag them when the key name says "secret".
#[test]
fn no_committed_secrets_in_configs() {
    let secret_key = Regex::new(r"(?i)^\s*[a-z_]*(private|secret|password|seed|api_key)[a-z_]*\s*=")
        .expect("key regex");
    let hex_value = Regex::new(r"0x?[a-fA-F0-9]{64}").expect("hex regex");
    let candidates = ["config.toml", "config.prod.toml", "config.dev.toml"];
    for file in candidates {
        if !Path::new(file).exists() {
            continue;
        }
        let body = fs::read_to_string(file).expect("read config");
        for (idx, line) in body.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                continue;
            }
            if secret_key.is_match(line) {
                panic!("Secret-looking key in {} at line {}", file, idx + 1);
            }
            if hex_value.is_match(line) && !line.contains("address") && !line.contains("contract") {
                panic!("Secret-looking hex in {} at line {}", file, idx + 1);
            }
        }
    }
}
