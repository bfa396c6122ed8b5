// SPDX-License-Identifier: MIT
// Scripted collaborators for driving the tick pipeline without a chain or the game API.

#![allow(dead_code)]

use async_trait::async_trait;
use stark_refiner::app::logging::{LogSink, MemorySink};
use stark_refiner::core::supply_chain::SupplyChainGraph;
use stark_refiner::core::{Strategy, StrategyConfig, StrategyDeps};
use stark_refiner::domain::error::{ProviderError, RpcError};
use stark_refiner::domain::constants::SN_MAIN_CHAIN_ID;
use stark_refiner::domain::types::{
    CrewState, GasPrices, InvokeContext, NetworkStatus, PriceMap, SignedAction,
};
use stark_refiner::network::influence::GameStateProvider;
use stark_refiner::network::price_feed::PriceSource;
use stark_refiner::network::provider::ChainClient;
use stark_refiner::security::SessionKey;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const GWEI: u128 = 1_000_000_000;

/// Fri unit prices the mock chain quotes for invoke fees.
pub const L1_GAS_FRI: u128 = 40_000;
pub const L2_GAS_FRI: u128 = 10;
pub const L1_DATA_GAS_FRI: u128 = 500;

pub struct MockChain {
    pub status: Result<NetworkStatus, RpcError>,
    pub context: Result<InvokeContext, RpcError>,
    pub submit_result: Result<String, RpcError>,
    pub status_calls: AtomicUsize,
    pub context_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub submitted: Mutex<Vec<SignedAction>>,
}

impl MockChain {
    pub fn healthy(gas_gwei: u128) -> Self {
        Self {
            status: Ok(NetworkStatus {
                block_height: 1_000,
                gas_price_wei: gas_gwei * GWEI,
            }),
            context: Ok(InvokeContext {
                chain_id: SN_MAIN_CHAIN_ID.to_string(),
                nonce: "0x7".to_string(),
                prices: GasPrices {
                    l1_gas: L1_GAS_FRI,
                    l2_gas: L2_GAS_FRI,
                    l1_data_gas: L1_DATA_GAS_FRI,
                },
            }),
            submit_result: Ok("0xabc".to_string()),
            status_calls: AtomicUsize::new(0),
            context_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_reads(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn network_status(&self) -> Result<NetworkStatus, RpcError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status.clone()
    }

    async fn eth_balance(&self, _address: &str) -> Result<u128, RpcError> {
        Ok(2_000_000_000_000_000_000)
    }

    async fn invoke_context(&self, _sender: &str) -> Result<InvokeContext, RpcError> {
        self.context_calls.fetch_add(1, Ordering::SeqCst);
        self.context.clone()
    }

    async fn submit(&self, action: &SignedAction) -> Result<String, RpcError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .expect("submitted lock")
            .push(action.clone());
        self.submit_result.clone()
    }
}

pub struct MockGame {
    pub crew: Result<CrewState, ProviderError>,
    pub calls: AtomicUsize,
}

impl MockGame {
    pub fn with_crew(is_busy: bool, food_kg: f64, class_id: u32) -> Self {
        Self {
            crew: Ok(CrewState {
                is_busy,
                busy_until: if is_busy { 4_102_444_800 } else { 0 },
                food_kg,
                location: 1,
                class_id,
            }),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GameStateProvider for MockGame {
    async fn crew_metadata(&self, _crew_id: u64) -> Result<CrewState, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.crew.clone()
    }
}

pub struct MockPrices {
    pub prices: PriceMap,
    pub calls: AtomicUsize,
}

impl MockPrices {
    pub fn new(pairs: &[(&str, f64)]) -> Self {
        Self {
            prices: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Refine Steel at these prices yields 710.
    pub fn reference() -> Self {
        Self::new(&[("Iron Ore", 5.0), ("Fuel", 2.0), ("Steel", 20.0)])
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPrices {
    async fn market_prices(&self) -> Result<PriceMap, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.prices.clone())
    }
}

pub struct Harness {
    pub chain: Arc<MockChain>,
    pub game: Arc<MockGame>,
    pub prices: Arc<MockPrices>,
    pub log: Arc<MemorySink>,
    pub strategy: Strategy,
}

impl Harness {
    pub fn new(
        config: StrategyConfig,
        chain: MockChain,
        game: MockGame,
        prices: MockPrices,
        session_key: SessionKey,
    ) -> Self {
        Self::with_shared_key(config, chain, game, prices, Arc::new(session_key))
    }

    pub fn with_shared_key(
        config: StrategyConfig,
        chain: MockChain,
        game: MockGame,
        prices: MockPrices,
        session_key: Arc<SessionKey>,
    ) -> Self {
        let chain = Arc::new(chain);
        let game = Arc::new(game);
        let prices = Arc::new(prices);
        let log = Arc::new(MemorySink::new(128));
        let log_sink: Arc<dyn LogSink> = log.clone();
        let deps = StrategyDeps {
            chain: chain.clone(),
            game: game.clone(),
            prices: prices.clone(),
            session_key,
            log: log_sink,
        };
        let strategy = Strategy::build(config, SupplyChainGraph::with_defaults(0.0), deps);
        Self {
            chain,
            game,
            prices,
            log,
            strategy,
        }
    }

    pub fn logged(&self, needle: &str) -> bool {
        self.log.recent().iter().any(|line| line.contains(needle))
    }
}

pub fn live_config() -> StrategyConfig {
    StrategyConfig {
        dry_run: false,
        refinery_contract: "0x0123".to_string(),
        wallet_address: Some("0x0456".to_string()),
        ..StrategyConfig::default()
    }
}
