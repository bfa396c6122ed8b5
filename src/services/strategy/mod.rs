// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod driver;
pub mod engine;
pub mod executor;
pub mod guards;
pub mod safety;
pub mod supply_chain;
pub mod tick;

pub use engine::{RefiningStrategy, Strategy, StrategyConfig, StrategyDeps, StrategyKind};
pub use tick::{Decision, TickReason, TickResult};
