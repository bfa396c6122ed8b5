// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::data_path::resolve_data_path;
use crate::common::parsing::{is_felt_hex, split_list};
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::types::PriceMap;
use crate::network::endpoint_pool::PoolPolicy;
use crate::network::influence::InfluenceConfig;
use crate::services::strategy::guards::GateConfig;
use crate::services::strategy::{StrategyConfig, StrategyKind};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,
    pub data_dir: Option<String>,

    // Chain access, in failover order
    pub starknet_mainnet_url: Option<String>,
    pub starknet_lava_url: Option<String>,
    pub starknet_1rpc_url: Option<String>,
    pub starknet_rpc_url: Option<String>,
    /// Comma-separated extra fallbacks.
    pub rpc_urls: Option<String>,
    #[serde(default = "default_failure_threshold")]
    pub rpc_failure_threshold: u32,
    #[serde(default = "default_cooldown_secs")]
    pub rpc_cooldown_secs: u64,
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,

    // Identity
    pub starknet_wallet_address: Option<String>,
    pub vault_path: Option<String>,

    // Game API
    #[serde(default = "default_influence_api_url")]
    pub influence_api_url: String,
    #[serde(default = "default_influence_rate_limit_rps")]
    pub influence_rate_limit_rps: u32,
    #[serde(default = "default_price_source")]
    pub price_source: String,
    pub static_prices: Option<HashMap<String, f64>>,

    // Strategy
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default = "default_crew_id")]
    pub crew_id: u64,
    #[serde(default = "default_recipe_name")]
    pub recipe_name: String,
    #[serde(default)]
    pub refinery_overhead: f64,
    pub refinery_contract: Option<String>,
    #[serde(default = "default_batch_quantity")]
    pub batch_quantity: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    // Gates
    #[serde(default = "default_gas_ceiling_gwei")]
    pub gas_ceiling_gwei: f64,
    #[serde(default = "default_profit_threshold")]
    pub profit_threshold: f64,
    #[serde(default = "default_food_floor_kg")]
    pub food_floor_kg: f64,
    #[serde(default = "default_optimal_class_id")]
    pub optimal_class_id: u32,

    // Circuit breaker
    #[serde(default = "default_circuit_max_failures")]
    pub circuit_max_failures: usize,
    #[serde(default = "default_circuit_reset_secs")]
    pub circuit_reset_secs: u64,
}

// Defaults
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_failure_threshold() -> u32 {
    constants::DEFAULT_FAILURE_THRESHOLD
}
fn default_cooldown_secs() -> u64 {
    constants::DEFAULT_COOLDOWN_SECS
}
fn default_rpc_timeout_ms() -> u64 {
    constants::DEFAULT_RPC_TIMEOUT_MS
}
fn default_influence_api_url() -> String {
    constants::DEFAULT_INFLUENCE_API_URL.to_string()
}
fn default_influence_rate_limit_rps() -> u32 {
    constants::DEFAULT_INFLUENCE_RATE_LIMIT_RPS
}
fn default_price_source() -> String {
    "influence".to_string()
}
fn default_strategy() -> String {
    "refine".to_string()
}
fn default_crew_id() -> u64 {
    constants::DEFAULT_CREW_ID
}
fn default_recipe_name() -> String {
    constants::RECIPE_REFINE_STEEL.to_string()
}
fn default_batch_quantity() -> u32 {
    1
}
fn default_poll_interval_secs() -> u64 {
    constants::DEFAULT_POLL_INTERVAL_SECS
}
fn default_gas_ceiling_gwei() -> f64 {
    constants::DEFAULT_GAS_CEILING_GWEI
}
fn default_profit_threshold() -> f64 {
    constants::DEFAULT_PROFIT_THRESHOLD
}
fn default_food_floor_kg() -> f64 {
    constants::DEFAULT_FOOD_FLOOR_KG
}
fn default_optimal_class_id() -> u32 {
    constants::CLASS_ENGINEER
}
fn default_circuit_max_failures() -> usize {
    constants::DEFAULT_CIRCUIT_MAX_FAILURES
}
fn default_circuit_reset_secs() -> u64 {
    constants::DEFAULT_CIRCUIT_RESET_SECS
}

/// Where the profitability gate reads prices from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSourceKind {
    Influence,
    Static,
}

impl FromStr for PriceSourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "influence" | "market" | "live" => Ok(PriceSourceKind::Influence),
            "static" | "fixed" => Ok(PriceSourceKind::Static),
            other => Err(AppError::Config(format!("Unknown PRICE_SOURCE: {other}"))),
        }
    }
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(
            target: "config",
            endpoints = settings.rpc_urls().len(),
            strategy = %settings.strategy,
            dry_run = settings.dry_run,
            "Configuration loaded"
        );
        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    /// Fatal configuration problems. Anything reported here stops the process.
    pub fn validate(&self) -> Result<(), AppError> {
        let urls = self.rpc_urls();
        if urls.is_empty() {
            return Err(AppError::Config(
                "No RPC endpoint configured (set STARKNET_MAINNET_URL, STARKNET_RPC_URL or RPC_URLS)"
                    .into(),
            ));
        }
        for url in &urls {
            Url::parse(url).map_err(|e| AppError::Validation {
                field: "rpc_url".into(),
                message: format!("{url}: {e}"),
            })?;
        }

        self.strategy_kind()?;
        let price_source = self.price_source_kind()?;
        if price_source == PriceSourceKind::Static && self.static_price_map().is_empty() {
            return Err(AppError::Config(
                "PRICE_SOURCE=static requires a [static_prices] table".into(),
            ));
        }

        if let Some(address) = self.wallet_address()
            && !is_felt_hex(&address)
        {
            return Err(AppError::Validation {
                field: "STARKNET_WALLET_ADDRESS".into(),
                message: format!("not a felt: {address}"),
            });
        }
        if let Some(contract) = self.refinery_contract()
            && !is_felt_hex(&contract)
        {
            return Err(AppError::Validation {
                field: "REFINERY_CONTRACT".into(),
                message: format!("not a felt: {contract}"),
            });
        }
        if !self.dry_run {
            if self.refinery_contract().is_none() {
                return Err(AppError::Config(
                    "Live mode (DRY_RUN=false) requires REFINERY_CONTRACT".into(),
                ));
            }
            if self.wallet_address().is_none() {
                return Err(AppError::Config(
                    "Live mode (DRY_RUN=false) requires STARKNET_WALLET_ADDRESS".into(),
                ));
            }
        }

        if self.batch_quantity == 0 {
            return Err(AppError::Validation {
                field: "BATCH_QUANTITY".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.influence_rate_limit_rps == 0 {
            return Err(AppError::Validation {
                field: "INFLUENCE_RATE_LIMIT_RPS".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    /// Primary first, then the named fallbacks, then `RPC_URLS`.
    pub fn rpc_urls(&self) -> Vec<String> {
        let named = [
            &self.starknet_mainnet_url,
            &self.starknet_lava_url,
            &self.starknet_1rpc_url,
            &self.starknet_rpc_url,
        ];
        let mut urls: Vec<String> = named
            .into_iter()
            .filter_map(|u| non_empty(u.as_deref()))
            .collect();
        if let Some(extra) = &self.rpc_urls {
            urls.extend(split_list(extra));
        }
        let mut seen = Vec::with_capacity(urls.len());
        for url in urls {
            if !seen.contains(&url) {
                seen.push(url);
            }
        }
        seen
    }

    pub fn pool_policy(&self) -> PoolPolicy {
        PoolPolicy {
            failure_threshold: self.rpc_failure_threshold.max(1),
            cooldown: Duration::from_secs(self.rpc_cooldown_secs),
            request_timeout: Duration::from_millis(self.rpc_timeout_ms.max(1)),
        }
    }

    pub fn wallet_address(&self) -> Option<String> {
        non_empty(self.starknet_wallet_address.as_deref())
    }

    pub fn refinery_contract(&self) -> Option<String> {
        non_empty(self.refinery_contract.as_deref())
    }

    pub fn strategy_kind(&self) -> Result<StrategyKind, AppError> {
        self.strategy.parse()
    }

    pub fn price_source_kind(&self) -> Result<PriceSourceKind, AppError> {
        self.price_source.parse()
    }

    /// Keys may arrive lowercased from the config layer; known resources get
    /// their canonical spelling back.
    pub fn static_price_map(&self) -> PriceMap {
        let known = [
            constants::RESOURCE_IRON_ORE,
            constants::RESOURCE_FUEL,
            constants::RESOURCE_STEEL,
        ];
        self.static_prices
            .as_ref()
            .map(|m| {
                m.iter()
                    .map(|(name, price)| {
                        let name = known
                            .iter()
                            .find(|k| k.eq_ignore_ascii_case(name.trim()))
                            .map_or_else(|| name.trim().to_string(), |k| k.to_string());
                        (name, *price)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            food_floor_kg: self.food_floor_kg,
            optimal_class_id: self.optimal_class_id,
            gas_ceiling_gwei: self.gas_ceiling_gwei,
            profit_threshold: self.profit_threshold,
        }
    }

    pub fn strategy_config(&self) -> Result<StrategyConfig, AppError> {
        Ok(StrategyConfig {
            kind: self.strategy_kind()?,
            crew_id: self.crew_id,
            recipe_name: self.recipe_name.trim().to_string(),
            batch_quantity: self.batch_quantity,
            refinery_contract: self
                .refinery_contract()
                .unwrap_or_else(|| "0x0".to_string()),
            wallet_address: self.wallet_address(),
            dry_run: self.dry_run,
            gates: self.gate_config(),
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            circuit_max_failures: self.circuit_max_failures,
            circuit_reset_secs: self.circuit_reset_secs,
        })
    }

    /// API key is filled in later from the vault.
    pub fn influence_config(&self) -> InfluenceConfig {
        InfluenceConfig {
            base_url: self.influence_api_url.clone(),
            rate_limit_rps: self.influence_rate_limit_rps,
            timeout: Duration::from_millis(self.rpc_timeout_ms.max(1)),
            api_key: None,
        }
    }

    pub fn vault_path(&self) -> PathBuf {
        let raw = non_empty(self.vault_path.as_deref())
            .unwrap_or_else(|| format!("data/{}", constants::VAULT_DEFAULT_FILE));
        resolve_data_path(&raw, self.data_dir.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
