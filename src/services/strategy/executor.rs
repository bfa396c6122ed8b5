// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::constants::REFINE_ACTION;
use crate::common::error::StrategyError;
use crate::common::logger::LogSink;
use crate::domain::types::ActionPayload;
use crate::infrastructure::security::SessionKey;
use crate::network::felt;
use crate::network::invoke::UnsignedInvoke;
use crate::network::provider::ChainClient;
use crate::services::strategy::safety::SafetyGuard;
use crate::services::strategy::supply_chain::Recipe;
use crate::services::strategy::tick::{Decision, TickReason, TickResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Payload for `quantity` runs of `recipe`; input and output amounts scale with it.
pub fn build_payload(
    recipe: &Recipe,
    quantity: u32,
    crew_id: u64,
    contract: &str,
    expected_profit: f64,
    block_height: u64,
) -> ActionPayload {
    let scale = |items: &BTreeMap<String, u64>| -> BTreeMap<String, u64> {
        items
            .iter()
            .map(|(resource, qty)| (resource.clone(), qty.saturating_mul(u64::from(quantity))))
            .collect()
    };
    ActionPayload {
        contract: contract.to_string(),
        action: REFINE_ACTION.to_string(),
        recipe: recipe.name.clone(),
        quantity,
        crew_id,
        inputs: scale(&recipe.inputs),
        outputs: scale(&recipe.outputs),
        expected_profit,
        block_height,
    }
}

/// Final phase of a tick: either show the payload or sign and submit it.
pub struct ActionExecutor {
    chain: Arc<dyn ChainClient>,
    session_key: Arc<SessionKey>,
    guard: SafetyGuard,
    dry_run: bool,
    sender_address: Option<String>,
}

impl ActionExecutor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        session_key: Arc<SessionKey>,
        guard: SafetyGuard,
        dry_run: bool,
        sender_address: Option<String>,
    ) -> Self {
        Self {
            chain,
            session_key,
            guard,
            dry_run,
            sender_address,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn guard(&self) -> &SafetyGuard {
        &self.guard
    }

    pub async fn execute(&self, payload: ActionPayload, log: &dyn LogSink) -> TickResult {
        if self.dry_run {
            let rendered =
                serde_json::to_string_pretty(&payload).unwrap_or_else(|e| format!("<{e}>"));
            log.log(&format!("[DRY RUN] Transaction payload:\n{rendered}"));
            log.log("Dry run complete. No transaction sent.");
            return TickResult {
                payload: Some(payload),
                ..TickResult::new(Decision::Execute, TickReason::DryRun)
            };
        }

        if self.session_key.is_locked() {
            log.log("Cannot execute: no session key loaded");
            return with_payload(
                TickResult::failed(TickReason::NoSigningKey, StrategyError::NoSigningKey),
                payload,
            );
        }
        let Some(sender) = self.sender_address.as_deref() else {
            log.log("Cannot execute: no wallet address configured");
            return with_payload(
                TickResult::failed(TickReason::NoWalletAddress, StrategyError::NoWalletAddress),
                payload,
            );
        };

        if let Err(e) = self.guard.check() {
            log.log("Circuit breaker open; skipping execution");
            return with_payload(TickResult::failed(TickReason::CircuitOpen, e), payload);
        }

        let context = match self.chain.invoke_context(sender).await {
            Ok(context) => context,
            Err(e) => {
                self.guard.report_failure();
                log.log(&format!("Could not read nonce and fee prices: {e}"));
                return with_payload(
                    TickResult::failed(TickReason::Submission, StrategyError::Submission(e)),
                    payload,
                );
            }
        };
        let tx = match UnsignedInvoke::build(&payload, sender, &context) {
            Ok(tx) => tx,
            Err(e) => {
                log.log(&format!("Cannot encode invoke: {e}"));
                return with_payload(
                    TickResult::failed(TickReason::Signing, StrategyError::Encoding(e)),
                    payload,
                );
            }
        };
        let hash = tx.hash();
        let signature = match self.session_key.sign(&hash) {
            Ok(sig) => sig,
            Err(e) => {
                log.log(&format!("Signing failed: {e}"));
                return with_payload(
                    TickResult::failed(TickReason::Signing, StrategyError::Signing(e)),
                    payload,
                );
            }
        };
        log.log(&format!(
            "Signed invoke {} (nonce {}, max fee {} fri)",
            felt::to_hex(&hash),
            context.nonce,
            tx.resource_bounds().max_fee()
        ));
        let action = tx.into_signed(
            payload.clone(),
            signature.to_felts(),
            self.session_key.public_key().unwrap_or_default(),
        );

        match self.chain.submit(&action).await {
            Ok(tx_hash) => {
                self.guard.report_success();
                log.log(&format!("Transaction submitted: {tx_hash}"));
                TickResult {
                    payload: Some(payload),
                    tx_hash: Some(tx_hash),
                    ..TickResult::new(Decision::Execute, TickReason::Submitted)
                }
            }
            Err(e) => {
                self.guard.report_failure();
                log.log(&format!("Submission failed: {e}"));
                with_payload(
                    TickResult::failed(TickReason::Submission, StrategyError::Submission(e)),
                    payload,
                )
            }
        }
    }
}

fn with_payload(mut result: TickResult, payload: ActionPayload) -> TickResult {
    result.payload = Some(payload);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_scales_with_quantity() {
        let recipe = Recipe::refine_steel(0.0);
        let payload = build_payload(&recipe, 3, 7, "0xabc", 2130.0, 99);
        assert_eq!(payload.recipe, "Refine Steel");
        assert_eq!(payload.action, "REFINE");
        assert_eq!(payload.inputs["Iron Ore"], 750);
        assert_eq!(payload.inputs["Fuel"], 60);
        assert_eq!(payload.outputs["Steel"], 300);
        assert_eq!(payload.crew_id, 7);
    }
}
