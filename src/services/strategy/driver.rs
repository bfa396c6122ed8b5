// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::WEI_PER_ETH;
use crate::network::provider::ChainClient;
use crate::services::strategy::engine::Strategy;
use crate::services::strategy::tick::{Decision, TickResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Header line data for the `start` and `status` views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusLine {
    pub block_height: Option<u64>,
    pub gas_gwei: Option<f64>,
    pub eth_balance: Option<f64>,
}

impl StatusLine {
    pub fn render(&self) -> String {
        let block = self
            .block_height
            .map_or_else(|| "?".to_string(), |b| b.to_string());
        let gas = self
            .gas_gwei
            .map_or_else(|| "?".to_string(), |g| format!("{g:.2}"));
        let balance = self
            .eth_balance
            .map_or_else(|| "?".to_string(), |b| format!("{b:.6}"));
        format!("block {block} | gas {gas} gwei | balance {balance} ETH")
    }
}

/// Best-effort status read; failures leave fields empty.
pub async fn poll_status(chain: &dyn ChainClient, wallet: Option<&str>) -> StatusLine {
    let network = chain.network_status().await;
    let balance = match wallet {
        Some(address) => chain.eth_balance(address).await.ok(),
        None => None,
    };
    StatusLine {
        block_height: network.as_ref().ok().map(|n| n.block_height),
        gas_gwei: network.as_ref().ok().map(|n| n.gas_price_gwei()),
        eth_balance: balance.map(|wei| wei as f64 / WEI_PER_ETH),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    pub ticks: u64,
    pub executed: u64,
    pub waited: u64,
    pub stood_down: u64,
    pub failures: u64,
    pub last_profit: Option<f64>,
}

impl TickStats {
    pub fn record(&mut self, result: &TickResult) {
        self.ticks += 1;
        match result.decision {
            Decision::Execute => self.executed += 1,
            Decision::Wait => self.waited += 1,
            Decision::StandDown => self.stood_down += 1,
        }
        if result.failure.is_some() {
            self.failures += 1;
        }
        if result.computed_profit.is_some() {
            self.last_profit = result.computed_profit;
        }
    }
}

/// Periodic tick loop for the `start` command. The status line is polled
/// through the strategy's own chain client, so both share one endpoint pool.
pub struct Driver {
    strategy: Arc<Strategy>,
    wallet: Option<String>,
    interval: Duration,
}

impl Driver {
    pub fn new(strategy: Arc<Strategy>, wallet: Option<String>, interval: Duration) -> Self {
        Self {
            strategy,
            wallet,
            interval,
        }
    }

    /// Run ticks until `shutdown` fires. Cancellation is only observed between
    /// ticks, so an in-flight sign/submit always completes.
    pub async fn run(&self, shutdown: CancellationToken) -> TickStats {
        let mut stats = TickStats::default();
        tracing::info!(
            target: "strategy",
            strategy = %self.strategy.kind(),
            interval_secs = self.interval.as_secs(),
            dry_run = self.strategy.config().dry_run,
            "Strategy loop started"
        );
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            let (result, status) = tokio::join!(
                self.strategy.tick(),
                poll_status(self.strategy.chain().as_ref(), self.wallet.as_deref())
            );
            stats.record(&result);
            tracing::info!(
                target: "strategy",
                decision = %result.decision,
                reason = %result.reason,
                profit = ?result.computed_profit,
                status = %status.render(),
                "Tick complete"
            );

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }
        tracing::info!(target: "strategy", ticks = stats.ticks, executed = stats.executed, "Strategy loop stopped");
        stats
    }
}

/// One tick for cron-style invocation; the caller maps the result to an exit code.
pub async fn pulse(strategy: &Strategy) -> TickResult {
    let result = strategy.tick().await;
    tracing::info!(
        target: "strategy",
        decision = %result.decision,
        reason = %result.reason,
        exit_code = result.exit_code(),
        "Pulse complete"
    );
    result
}
