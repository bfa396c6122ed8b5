// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Tick gates. Pure checks over state that was already fetched for the tick.

use crate::common::constants::{
    CLASS_ENGINEER, DEFAULT_FOOD_FLOOR_KG, DEFAULT_GAS_CEILING_GWEI, DEFAULT_PROFIT_THRESHOLD,
};
use crate::domain::types::{CrewState, NetworkStatus};
use crate::services::strategy::tick::{Decision, TickReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Proceed,
    Halt(Decision, TickReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateConfig {
    pub food_floor_kg: f64,
    pub optimal_class_id: u32,
    pub gas_ceiling_gwei: f64,
    pub profit_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            food_floor_kg: DEFAULT_FOOD_FLOOR_KG,
            optimal_class_id: CLASS_ENGINEER,
            gas_ceiling_gwei: DEFAULT_GAS_CEILING_GWEI,
            profit_threshold: DEFAULT_PROFIT_THRESHOLD,
        }
    }
}

impl GateConfig {
    /// Busy first, then food; restocking is manual so both stand down.
    pub fn crew(&self, crew: &CrewState) -> GateOutcome {
        if crew.is_busy {
            return GateOutcome::Halt(Decision::StandDown, TickReason::Busy);
        }
        if crew.food_kg < self.food_floor_kg {
            return GateOutcome::Halt(Decision::StandDown, TickReason::Food);
        }
        GateOutcome::Proceed
    }

    /// Informational only: a non-optimal class refines at a speed penalty.
    pub fn efficiency_warning(&self, crew: &CrewState) -> bool {
        crew.class_id != self.optimal_class_id
    }

    pub fn gas(&self, network: &NetworkStatus) -> GateOutcome {
        if network.gas_price_gwei() > self.gas_ceiling_gwei {
            GateOutcome::Halt(Decision::Wait, TickReason::Gas)
        } else {
            GateOutcome::Proceed
        }
    }

    pub fn profit(&self, profit: f64) -> GateOutcome {
        if profit < self.profit_threshold {
            GateOutcome::Halt(Decision::Wait, TickReason::LowProfit)
        } else {
            GateOutcome::Proceed
        }
    }
}
