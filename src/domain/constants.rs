// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

/// ETH fee token on Starknet mainnet.
pub const STARKNET_ETH_TOKEN: &str =
    "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7";

/// `sn_keccak("balanceOf")`
pub const BALANCE_OF_SELECTOR: &str =
    "0x2e4263afad30923c891518314c3c95dbe830a16874e8abc5777a9a20b54c76e";

pub const WEI_PER_GWEI: f64 = 1e9;
pub const WEI_PER_ETH: f64 = 1e18;

// =============================================================================
// ENDPOINT POOL
// =============================================================================

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// GAME / STRATEGY
// =============================================================================

pub const DEFAULT_INFLUENCE_API_URL: &str = "https://api.influenceth.io";
pub const DEFAULT_INFLUENCE_RATE_LIMIT_RPS: u32 = 2;

pub const DEFAULT_CREW_ID: u64 = 1;
/// Engineers refine at full speed; every other class carries a 50% penalty.
pub const CLASS_ENGINEER: u32 = 1;
pub const DEFAULT_FOOD_FLOOR_KG: f64 = 550.0;
pub const DEFAULT_GAS_CEILING_GWEI: f64 = 30.0;
pub const DEFAULT_PROFIT_THRESHOLD: f64 = 100.0;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

pub const RECIPE_REFINE_STEEL: &str = "Refine Steel";
pub const RESOURCE_IRON_ORE: &str = "Iron Ore";
pub const RESOURCE_FUEL: &str = "Fuel";
pub const RESOURCE_STEEL: &str = "Steel";
pub const REFINE_ACTION: &str = "REFINE";

// =============================================================================
// SAFETY
// =============================================================================

pub const DEFAULT_CIRCUIT_MAX_FAILURES: usize = 5;
pub const DEFAULT_CIRCUIT_RESET_SECS: u64 = 300;

// =============================================================================
// VAULT
// =============================================================================

pub const VAULT_FORMAT_VERSION: u32 = 1;
pub const VAULT_SALT_LEN: usize = 16;
pub const VAULT_KEY_LEN: usize = 32;
pub const VAULT_NONCE_LEN: usize = 12;
pub const VAULT_DEFAULT_FILE: &str = "vault.json";
pub const SECRET_SESSION_KEY: &str = "session_key";
pub const SECRET_INFLUENCE_API_KEY: &str = "influence_api_key";

/// Argon2id defaults (19 MiB, 2 passes, 1 lane).
pub const KDF_DEFAULT_M_COST_KIB: u32 = 19_456;
pub const KDF_DEFAULT_T_COST: u32 = 2;
pub const KDF_DEFAULT_P_COST: u32 = 1;

// =============================================================================
// EXECUTION
// =============================================================================

/// Resource amounts budgeted for one refine invoke.
pub const INVOKE_L1_GAS_ESTIMATE: u64 = 0;
pub const INVOKE_L2_GAS_ESTIMATE: u64 = 3_000_000;
pub const INVOKE_L1_DATA_GAS_ESTIMATE: u64 = 256;
/// Bounds allow each unit price to double before inclusion.
pub const FEE_PRICE_MULTIPLIER: u128 = 2;

pub const SN_MAIN_CHAIN_ID: &str = "0x534e5f4d41494e";
