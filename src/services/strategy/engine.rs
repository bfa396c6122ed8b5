// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::constants::{
    DEFAULT_CIRCUIT_MAX_FAILURES, DEFAULT_CIRCUIT_RESET_SECS, DEFAULT_CREW_ID,
    DEFAULT_POLL_INTERVAL_SECS, RECIPE_REFINE_STEEL,
};
use crate::common::error::{AppError, GraphError, StrategyError};
use crate::common::logger::LogSink;
use crate::domain::types::{CrewState, NetworkStatus};
use crate::infrastructure::security::SessionKey;
use crate::network::influence::GameStateProvider;
use crate::network::price_feed::PriceSource;
use crate::network::provider::ChainClient;
use crate::services::strategy::executor::{ActionExecutor, build_payload};
use crate::services::strategy::guards::{GateConfig, GateOutcome};
use crate::services::strategy::safety::SafetyGuard;
use crate::services::strategy::supply_chain::SupplyChainGraph;
use crate::services::strategy::tick::{TickReason, TickResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Refine,
}

impl FromStr for StrategyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refine" | "refining" => Ok(StrategyKind::Refine),
            other => Err(AppError::Config(format!("Unknown strategy: {other}"))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Refine => f.write_str("refine"),
        }
    }
}

/// Immutable tick settings, built once from `GlobalSettings`.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub crew_id: u64,
    pub recipe_name: String,
    pub batch_quantity: u32,
    pub refinery_contract: String,
    pub wallet_address: Option<String>,
    pub dry_run: bool,
    pub gates: GateConfig,
    pub poll_interval: Duration,
    pub circuit_max_failures: usize,
    pub circuit_reset_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Refine,
            crew_id: DEFAULT_CREW_ID,
            recipe_name: RECIPE_REFINE_STEEL.to_string(),
            batch_quantity: 1,
            refinery_contract: "0x0".to_string(),
            wallet_address: None,
            dry_run: true,
            gates: GateConfig::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            circuit_max_failures: DEFAULT_CIRCUIT_MAX_FAILURES,
            circuit_reset_secs: DEFAULT_CIRCUIT_RESET_SECS,
        }
    }
}

/// Collaborators a strategy is constructed with.
#[derive(Clone)]
pub struct StrategyDeps {
    pub chain: Arc<dyn ChainClient>,
    pub game: Arc<dyn GameStateProvider>,
    pub prices: Arc<dyn PriceSource>,
    pub session_key: Arc<SessionKey>,
    pub log: Arc<dyn LogSink>,
}

/// Iron -> Steel refining loop.
pub struct RefiningStrategy {
    config: StrategyConfig,
    graph: SupplyChainGraph,
    chain: Arc<dyn ChainClient>,
    game: Arc<dyn GameStateProvider>,
    prices: Arc<dyn PriceSource>,
    log: Arc<dyn LogSink>,
    executor: ActionExecutor,
    // Serializes ticks so two submissions never race on the account nonce.
    tick_lock: Mutex<()>,
}

impl RefiningStrategy {
    pub fn new(config: StrategyConfig, graph: SupplyChainGraph, deps: StrategyDeps) -> Self {
        let executor = ActionExecutor::new(
            deps.chain.clone(),
            deps.session_key,
            SafetyGuard::new(config.circuit_max_failures, config.circuit_reset_secs),
            config.dry_run,
            config.wallet_address.clone(),
        );
        Self {
            config,
            graph,
            chain: deps.chain,
            game: deps.game,
            prices: deps.prices,
            log: deps.log,
            executor,
            tick_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    pub async fn tick(&self) -> TickResult {
        let _serial = self.tick_lock.lock().await;
        self.run_pipeline().await
    }

    fn log(&self, message: &str) {
        self.log.log(message);
    }

    async fn run_pipeline(&self) -> TickResult {
        let network = match self.chain.network_status().await {
            Ok(status) => status,
            Err(e) => {
                self.log(&format!("Failed to fetch network status: {e}"));
                return TickResult::failed(TickReason::Rpc, StrategyError::Network(e));
            }
        };

        let crew = match self.game.crew_metadata(self.config.crew_id).await {
            Ok(crew) => crew,
            Err(e) => {
                self.log(&format!("Failed to fetch crew {}: {e}", self.config.crew_id));
                let mut result =
                    TickResult::failed(TickReason::CrewRead, StrategyError::GameState(e));
                result.network = Some(network);
                return result;
            }
        };
        self.log_scan(&network, &crew);

        let gates = &self.config.gates;
        let mut ctx = TickContext {
            network,
            efficiency_warning: false,
            profit: None,
        };

        if let GateOutcome::Halt(decision, reason) = gates.crew(&crew) {
            match reason {
                TickReason::Busy => self.log("Crew busy - standing down."),
                _ => self.log(&format!(
                    "Crew hungry ({:.1}kg < {:.1}kg). Restock manually.",
                    crew.food_kg, gates.food_floor_kg
                )),
            }
            return ctx.finish(TickResult::new(decision, reason));
        }

        if gates.efficiency_warning(&crew) {
            ctx.efficiency_warning = true;
            self.log(&format!(
                "Efficiency warning: crew class {} is not the optimal class {}. -50% speed penalty active.",
                crew.class_id, gates.optimal_class_id
            ));
        }

        if let GateOutcome::Halt(decision, reason) = gates.gas(&network) {
            self.log(&format!(
                "High gas detected ({:.2} > {:.2} gwei). Yielding.",
                network.gas_price_gwei(),
                gates.gas_ceiling_gwei
            ));
            return ctx.finish(TickResult::new(decision, reason));
        }

        let prices = match self.prices.market_prices().await {
            Ok(prices) => prices,
            Err(e) => {
                self.log(&format!("Failed to fetch market prices: {e}"));
                return ctx.finish(TickResult::failed(
                    TickReason::Prices,
                    StrategyError::Prices(e),
                ));
            }
        };

        let recipe_name = &self.config.recipe_name;
        let profit = match self.graph.calculate_profitability(recipe_name, &prices) {
            Ok(profit) => profit,
            Err(e) => {
                self.log(&format!("Error calculating profit: {e}"));
                return ctx.finish(TickResult::failed(TickReason::Graph, StrategyError::Graph(e)));
            }
        };
        ctx.profit = Some(profit);
        self.log(&format!("Computed profitability: {profit:.2} SWAY"));

        if let GateOutcome::Halt(decision, reason) = gates.profit(profit) {
            self.log(&format!(
                "Profit too low ({profit:.2} < {:.2}). Waiting.",
                gates.profit_threshold
            ));
            return ctx.finish(TickResult::new(decision, reason));
        }

        let Some(recipe) = self.graph.recipe(recipe_name) else {
            let err = GraphError::UnknownRecipe(recipe_name.clone());
            return ctx.finish(TickResult::failed(TickReason::Graph, StrategyError::Graph(err)));
        };
        self.log(&format!("Opportunity detected! Profit: {profit:.2}"));
        let payload = build_payload(
            recipe,
            self.config.batch_quantity,
            self.config.crew_id,
            &self.config.refinery_contract,
            profit,
            network.block_height,
        );
        let result = self.executor.execute(payload, self.log.as_ref()).await;
        ctx.finish(result)
    }

    fn log_scan(&self, network: &NetworkStatus, crew: &CrewState) {
        self.log(&format!(
            "Scanning Adalia... [Block: {} | Gas: {:.2} gwei] [Status: {}]",
            network.block_height,
            network.gas_price_gwei(),
            if crew.is_busy { "BUSY" } else { "ACTIVE" }
        ));
        self.log(&format!(
            "   Health: [Food: {}kg | Class: {}]",
            crew.food_kg, crew.class_id
        ));
    }
}

/// State gathered by earlier phases, stamped onto whatever result ends the tick.
struct TickContext {
    network: NetworkStatus,
    efficiency_warning: bool,
    profit: Option<f64>,
}

impl TickContext {
    fn finish(&self, mut result: TickResult) -> TickResult {
        result.network = Some(self.network);
        result.efficiency_warning = self.efficiency_warning;
        result.computed_profit = self.profit;
        result
    }
}

/// Closed set of strategies behind one `tick()`.
pub enum Strategy {
    Refine(RefiningStrategy),
}

impl Strategy {
    pub fn build(
        config: StrategyConfig,
        graph: SupplyChainGraph,
        deps: StrategyDeps,
    ) -> Self {
        match config.kind {
            StrategyKind::Refine => Strategy::Refine(RefiningStrategy::new(config, graph, deps)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Refine(_) => StrategyKind::Refine,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        match self {
            Strategy::Refine(s) => s.config(),
        }
    }

    /// Chain client the tick reads and submits through.
    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        match self {
            Strategy::Refine(s) => s.chain(),
        }
    }

    pub async fn tick(&self) -> TickResult {
        match self {
            Strategy::Refine(s) => s.tick().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_kind_parses_known_names_only() {
        assert_eq!("refine".parse::<StrategyKind>().ok(), Some(StrategyKind::Refine));
        assert_eq!(" Refine ".parse::<StrategyKind>().ok(), Some(StrategyKind::Refine));
        assert!(matches!(
            "arbitrage".parse::<StrategyKind>(),
            Err(AppError::Config(_))
        ));
    }
}
