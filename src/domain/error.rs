// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

/// Process-level failures. Only these are allowed to terminate the binary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Session key error: {0}")]
    SessionKey(#[from] SessionKeyError),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<RpcError> for AppError {
    fn from(err: RpcError) -> Self {
        AppError::Connection(err.to_string())
    }
}

/// Transient chain-access failures. Never fatal; they drive failover inside the pool.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("Transport error from {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    Decode(String),

    #[error("Endpoint pool is empty")]
    NoEndpoints,

    #[error("All endpoints unavailable after {attempts} attempts; last error: {last_error}")]
    AllEndpointsUnavailable { attempts: usize, last_error: String },
}

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid vault password")]
    InvalidPassword,

    #[error("Authentication failed: record was tampered with or corrupted")]
    AuthenticationFailed,

    #[error("Vault file not found at {0}")]
    NotFound(String),

    #[error("Vault already exists at {0}")]
    AlreadyExists(String),

    #[error("Vault file is corrupt: {0}")]
    Corrupt(String),

    #[error("Key derivation failed: {0}")]
    Kdf(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Vault I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionKeyError {
    #[error("Session key is locked (read-only mode)")]
    Locked,

    #[error("Stored session key is invalid: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// A payload or chain value that does not fit the invoke transaction format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("Invalid felt for {field}: {value}")]
    InvalidFelt { field: &'static str, value: String },

    #[error("{0:?} is not a Cairo short string")]
    ShortString(String),

    #[error("Invalid entry point name {0:?}")]
    Selector(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("Missing price for {resource} required by recipe {recipe}")]
    MissingPrice { recipe: String, resource: String },
}

/// Failures of the external game-state and price collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Transient provider failure: {0}")]
    Transient(String),

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error("Provider response could not be decoded: {0}")]
    Decode(String),
}

/// Why a tick did not complete its intended action. Carried inside `TickResult`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Network read failed: {0}")]
    Network(RpcError),

    #[error("Crew state read failed: {0}")]
    GameState(ProviderError),

    #[error("Price read failed: {0}")]
    Prices(ProviderError),

    #[error("Profitability computation failed: {0}")]
    Graph(GraphError),

    #[error("Live execution requested without a loaded session key")]
    NoSigningKey,

    #[error("Live execution requested without a wallet address")]
    NoWalletAddress,

    #[error("Invoke could not be encoded: {0}")]
    Encoding(InvokeError),

    #[error("Signing failed: {0}")]
    Signing(SessionKeyError),

    #[error("Submission failed: {0}")]
    Submission(RpcError),

    #[error("Execution circuit breaker is open")]
    CircuitOpen,
}
