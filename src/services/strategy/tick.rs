// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::StrategyError;
use crate::domain::types::{ActionPayload, NetworkStatus};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    StandDown,
    Wait,
    Execute,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::StandDown => "STAND_DOWN",
            Decision::Wait => "WAIT",
            Decision::Execute => "EXECUTE",
        })
    }
}

/// Which gate or phase ended the tick. One distinct reason per gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickReason {
    Rpc,
    CrewRead,
    Busy,
    Food,
    Gas,
    Prices,
    Graph,
    LowProfit,
    DryRun,
    NoSigningKey,
    NoWalletAddress,
    CircuitOpen,
    Signing,
    Submission,
    Submitted,
}

impl TickReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickReason::Rpc => "rpc",
            TickReason::CrewRead => "crew_read",
            TickReason::Busy => "busy",
            TickReason::Food => "food",
            TickReason::Gas => "gas",
            TickReason::Prices => "prices",
            TickReason::Graph => "graph",
            TickReason::LowProfit => "low_profit",
            TickReason::DryRun => "dry_run",
            TickReason::NoSigningKey => "no_signing_key",
            TickReason::NoWalletAddress => "no_wallet_address",
            TickReason::CircuitOpen => "circuit_open",
            TickReason::Signing => "signing",
            TickReason::Submission => "submission",
            TickReason::Submitted => "submitted",
        }
    }

    /// Reasons caused by an error rather than by a gate rejecting healthy state.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TickReason::Rpc
                | TickReason::CrewRead
                | TickReason::Prices
                | TickReason::Graph
                | TickReason::NoSigningKey
                | TickReason::NoWalletAddress
                | TickReason::Signing
                | TickReason::Submission
        )
    }
}

impl fmt::Display for TickReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured outcome of one strategy cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    pub decision: Decision,
    pub reason: TickReason,
    pub computed_profit: Option<f64>,
    pub network: Option<NetworkStatus>,
    pub efficiency_warning: bool,
    pub payload: Option<ActionPayload>,
    pub tx_hash: Option<String>,
    pub failure: Option<StrategyError>,
}

impl TickResult {
    pub fn new(decision: Decision, reason: TickReason) -> Self {
        Self {
            decision,
            reason,
            computed_profit: None,
            network: None,
            efficiency_warning: false,
            payload: None,
            tx_hash: None,
            failure: None,
        }
    }

    pub fn failed(reason: TickReason, error: StrategyError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(Decision::StandDown, reason)
        }
    }

    /// `pulse` exit code: 0 execute, 3 wait, 4 gate stand-down, 1 failure.
    pub fn exit_code(&self) -> u8 {
        match self.decision {
            Decision::Execute => 0,
            Decision::Wait => 3,
            Decision::StandDown if self.reason.is_failure() => 1,
            Decision::StandDown => 4,
        }
    }
}
