// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! INVOKE v3 assembly for a single refine call and the transaction hash the
//! account's `__validate__` checks the session signature against.

use crate::common::constants::{
    FEE_PRICE_MULTIPLIER, INVOKE_L1_DATA_GAS_ESTIMATE, INVOKE_L1_GAS_ESTIMATE,
    INVOKE_L2_GAS_ESTIMATE,
};
use crate::common::error::InvokeError;
use crate::domain::types::{
    ActionPayload, GasPrices, InvokeContext, ResourceBound, ResourceBounds, SignedAction,
};
use crate::network::felt;
use starknet::core::types::Felt;
use starknet_crypto::PoseidonHasher;

/// `"invoke"` as a short string.
const INVOKE_PREFIX: u64 = 0x696e_766f_6b65;
const TX_VERSION: u64 = 3;

/// Fee bounds for one refine at the given unit prices.
pub fn resource_bounds(prices: &GasPrices) -> ResourceBounds {
    let bound = |max_amount: u64, price: u128| ResourceBound {
        max_amount,
        max_price_per_unit: price.saturating_mul(FEE_PRICE_MULTIPLIER),
    };
    ResourceBounds {
        l1_gas: bound(INVOKE_L1_GAS_ESTIMATE, prices.l1_gas),
        l2_gas: bound(INVOKE_L2_GAS_ESTIMATE, prices.l2_gas),
        l1_data_gas: bound(INVOKE_L1_DATA_GAS_ESTIMATE, prices.l1_data_gas),
    }
}

/// Account `__execute__` calldata for a single call into the refinery:
/// `[1, to, selector, 3, crew_id, recipe, quantity]`.
pub fn refine_calldata(payload: &ActionPayload) -> Result<Vec<Felt>, InvokeError> {
    Ok(vec![
        Felt::ONE,
        felt::parse("contract", &payload.contract)?,
        felt::selector(&payload.action.to_ascii_lowercase())?,
        Felt::from(3u8),
        Felt::from(payload.crew_id),
        felt::short_string(&payload.recipe)?,
        Felt::from(payload.quantity),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedInvoke {
    sender: Felt,
    calldata: Vec<Felt>,
    nonce: Felt,
    chain_id: Felt,
    resource_bounds: ResourceBounds,
}

impl UnsignedInvoke {
    pub fn build(
        payload: &ActionPayload,
        sender: &str,
        context: &InvokeContext,
    ) -> Result<Self, InvokeError> {
        Ok(Self {
            sender: felt::parse("sender_address", sender)?,
            calldata: refine_calldata(payload)?,
            nonce: felt::parse("nonce", &context.nonce)?,
            chain_id: felt::parse("chain_id", &context.chain_id)?,
            resource_bounds: resource_bounds(&context.prices),
        })
    }

    pub fn resource_bounds(&self) -> &ResourceBounds {
        &self.resource_bounds
    }

    /// Poseidon hash over the v3 fields. No tip, paymaster or deployment data;
    /// both data-availability modes are L1.
    pub fn hash(&self) -> Felt {
        let bounds = &self.resource_bounds;
        let fee_fields = poseidon(&[
            Felt::ZERO,
            pack_bound(b"L1_GAS", &bounds.l1_gas),
            pack_bound(b"L2_GAS", &bounds.l2_gas),
            pack_bound(b"L1_DATA", &bounds.l1_data_gas),
        ]);
        poseidon(&[
            Felt::from(INVOKE_PREFIX),
            Felt::from(TX_VERSION),
            self.sender,
            fee_fields,
            poseidon(&[]),
            self.chain_id,
            self.nonce,
            Felt::ZERO,
            poseidon(&[]),
            poseidon(&self.calldata),
        ])
    }

    pub fn into_signed(
        self,
        payload: ActionPayload,
        signature: Vec<String>,
        signer: String,
    ) -> SignedAction {
        SignedAction {
            transaction_hash: felt::to_hex(&self.hash()),
            payload,
            sender_address: felt::to_hex(&self.sender),
            calldata: self.calldata.iter().map(felt::to_hex).collect(),
            nonce: felt::to_hex(&self.nonce),
            resource_bounds: self.resource_bounds,
            signature,
            signer,
        }
    }
}

/// `name << 192 | max_amount << 128 | max_price_per_unit`
fn pack_bound(name: &[u8], bound: &ResourceBound) -> Felt {
    let mut word = [0u8; 32];
    word[8 - name.len()..8].copy_from_slice(name);
    word[8..16].copy_from_slice(&bound.max_amount.to_be_bytes());
    word[16..].copy_from_slice(&bound.max_price_per_unit.to_be_bytes());
    Felt::from_bytes_be(&word)
}

fn poseidon(items: &[Felt]) -> Felt {
    let mut hasher = PoseidonHasher::new();
    for item in items {
        hasher.update(*item);
    }
    hasher.finalize()
}
