// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource name -> unit price. Supplied fresh on every profitability query.
pub type PriceMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    pub block_height: u64,
    pub gas_price_wei: u128,
}

impl NetworkStatus {
    pub fn gas_price_gwei(&self) -> f64 {
        self.gas_price_wei as f64 / crate::domain::constants::WEI_PER_GWEI
    }
}

/// Snapshot of a crew as reported by the game-state provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewState {
    pub is_busy: bool,
    /// Unix seconds; 0 when idle.
    pub busy_until: u64,
    pub food_kg: f64,
    pub location: u64,
    pub class_id: u32,
}

/// The refine action the bot intends to perform. Encoded into account calldata
/// on the live path; shown as-is in dry-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub contract: String,
    pub action: String,
    pub recipe: String,
    pub quantity: u32,
    pub crew_id: u64,
    pub inputs: BTreeMap<String, u64>,
    pub outputs: BTreeMap<String, u64>,
    pub expected_profit: f64,
    pub block_height: u64,
}

/// Fee-token unit prices of the latest block, in fri.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GasPrices {
    pub l1_gas: u128,
    pub l2_gas: u128,
    pub l1_data_gas: u128,
}

/// Chain values an invoke signature commits to, read right before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvokeContext {
    pub chain_id: String,
    pub nonce: String,
    pub prices: GasPrices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResourceBound {
    pub max_amount: u64,
    pub max_price_per_unit: u128,
}

impl ResourceBound {
    pub fn max_cost(&self) -> u128 {
        u128::from(self.max_amount).saturating_mul(self.max_price_per_unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResourceBounds {
    pub l1_gas: ResourceBound,
    pub l2_gas: ResourceBound,
    pub l1_data_gas: ResourceBound,
}

impl ResourceBounds {
    /// Upper bound on the fee in fri.
    pub fn max_fee(&self) -> u128 {
        self.l1_gas
            .max_cost()
            .saturating_add(self.l2_gas.max_cost())
            .saturating_add(self.l1_data_gas.max_cost())
    }
}

/// An INVOKE v3 ready for `starknet_addInvokeTransaction`. Felts are 0x-hex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedAction {
    pub payload: ActionPayload,
    pub sender_address: String,
    pub calldata: Vec<String>,
    pub nonce: String,
    pub resource_bounds: ResourceBounds,
    /// Hash the signature covers.
    pub transaction_hash: String,
    /// `[r, s]` on the STARK curve.
    pub signature: Vec<String>,
    pub signer: String,
}
