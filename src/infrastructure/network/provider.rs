// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::constants::{BALANCE_OF_SELECTOR, STARKNET_ETH_TOKEN};
use crate::common::error::{AppError, RpcError};
use crate::common::parsing::{is_felt_hex, parse_u128_hex};
use crate::domain::types::{GasPrices, InvokeContext, NetworkStatus, ResourceBound, SignedAction};
use crate::network::endpoint_pool::EndpointPool;
use crate::network::felt;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

const INVALID_PARAMS: i64 = -32602;

/// Chain access used by the strategy engine and the status view.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn network_status(&self) -> Result<NetworkStatus, RpcError>;
    async fn eth_balance(&self, address: &str) -> Result<u128, RpcError>;
    /// Chain id, account nonce and fee prices an invoke from `sender` signs over.
    async fn invoke_context(&self, sender: &str) -> Result<InvokeContext, RpcError>;
    /// Returns the transaction hash.
    async fn submit(&self, action: &SignedAction) -> Result<String, RpcError>;
}

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Starknet JSON-RPC client. Every request goes through the endpoint pool.
#[derive(Clone)]
pub struct StarknetClient {
    http: Client,
    pool: Arc<EndpointPool>,
}

impl StarknetClient {
    pub fn new(pool: Arc<EndpointPool>) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(pool.policy().request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))?;
        Ok(Self { http, pool })
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    async fn request(&self, method: &'static str, params: Value) -> Result<Value, RpcError> {
        self.pool
            .call(|url| {
                let http = self.http.clone();
                let params = params.clone();
                async move { rpc(&http, &url, method, params).await }
            })
            .await
    }
}

async fn rpc(http: &Client, url: &str, method: &str, params: Value) -> Result<Value, RpcError> {
    let payload = json!({
        "jsonrpc": "2.0",
        "id": 1u64,
        "method": method,
        "params": params,
    });
    let resp = http
        .post(url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| RpcError::Transport {
            url: url.to_string(),
            message: format!("{method}: {e}"),
        })?;
    if !resp.status().is_success() {
        return Err(RpcError::Transport {
            url: url.to_string(),
            message: format!("{method}: HTTP {}", resp.status()),
        });
    }
    let body: RpcEnvelope = resp
        .json()
        .await
        .map_err(|e| RpcError::Decode(format!("{method}: {e}")))?;
    if let Some(err) = body.error {
        return Err(RpcError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    body.result
        .ok_or_else(|| RpcError::Decode(format!("{method}: missing result")))
}

fn felt_u128(value: &Value, field: &str) -> Result<u128, RpcError> {
    match value {
        Value::String(s) => {
            parse_u128_hex(s).ok_or_else(|| RpcError::Decode(format!("{field}: bad felt {s}")))
        }
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| RpcError::Decode(format!("{field}: bad number {n}"))),
        other => Err(RpcError::Decode(format!("{field}: unexpected {other}"))),
    }
}

fn invalid_params(message: impl Into<String>) -> RpcError {
    RpcError::Rpc {
        code: INVALID_PARAMS,
        message: message.into(),
    }
}

fn fri_price(block: &Value, field: &str) -> Result<u128, RpcError> {
    let price = block
        .get(field)
        .and_then(|p| p.get("price_in_fri"))
        .ok_or_else(|| RpcError::Decode(format!("block: missing {field}.price_in_fri")))?;
    felt_u128(price, field)
}

fn bound_json(bound: &ResourceBound) -> Value {
    json!({
        "max_amount": format!("{:#x}", bound.max_amount),
        "max_price_per_unit": format!("{:#x}", bound.max_price_per_unit),
    })
}

#[async_trait]
impl ChainClient for StarknetClient {
    async fn network_status(&self) -> Result<NetworkStatus, RpcError> {
        let status = self
            .pool
            .call(|url| {
                let http = self.http.clone();
                async move {
                    let height = rpc(&http, &url, "starknet_blockNumber", json!([])).await?;
                    let block = rpc(
                        &http,
                        &url,
                        "starknet_getBlockWithTxHashes",
                        json!({ "block_id": "latest" }),
                    )
                    .await?;
                    let gas = block
                        .get("l1_gas_price")
                        .and_then(|p| p.get("price_in_wei"))
                        .ok_or_else(|| RpcError::Decode("block: missing l1_gas_price".into()))?;
                    Ok::<_, RpcError>(NetworkStatus {
                        block_height: felt_u128(&height, "block_number")? as u64,
                        gas_price_wei: felt_u128(gas, "price_in_wei")?,
                    })
                }
            })
            .await?;
        tracing::debug!(
            target: "rpc",
            block = status.block_height,
            gas_gwei = status.gas_price_gwei(),
            "Network status"
        );
        Ok(status)
    }

    async fn eth_balance(&self, address: &str) -> Result<u128, RpcError> {
        if !is_felt_hex(address) {
            return Err(invalid_params(format!("invalid address {address}")));
        }
        let result = self
            .request(
                "starknet_call",
                json!({
                    "request": {
                        "contract_address": STARKNET_ETH_TOKEN,
                        "entry_point_selector": BALANCE_OF_SELECTOR,
                        "calldata": [address],
                    },
                    "block_id": "latest",
                }),
            )
            .await?;
        let words = result
            .as_array()
            .filter(|w| w.len() >= 2)
            .ok_or_else(|| RpcError::Decode("balanceOf: expected [low, high]".into()))?;
        let (Some(low), Some(high)) = (words[0].as_str(), words[1].as_str()) else {
            return Err(RpcError::Decode("balanceOf: non-string felts".into()));
        };
        felt::u256_from_felts(low, high)
            .ok_or_else(|| RpcError::Decode(format!("balanceOf: bad u256 [{low}, {high}]")))
    }

    async fn invoke_context(&self, sender: &str) -> Result<InvokeContext, RpcError> {
        if !is_felt_hex(sender) {
            return Err(invalid_params(format!("invalid sender {sender}")));
        }
        // One endpoint answers all three so the nonce and prices agree.
        self.pool
            .call(|url| {
                let http = self.http.clone();
                let sender = sender.to_string();
                async move {
                    let chain_id = rpc(&http, &url, "starknet_chainId", json!([])).await?;
                    let nonce = rpc(
                        &http,
                        &url,
                        "starknet_getNonce",
                        json!({ "block_id": "latest", "contract_address": sender }),
                    )
                    .await?;
                    let block = rpc(
                        &http,
                        &url,
                        "starknet_getBlockWithTxHashes",
                        json!({ "block_id": "latest" }),
                    )
                    .await?;
                    let (Some(chain_id), Some(nonce)) = (chain_id.as_str(), nonce.as_str()) else {
                        return Err(RpcError::Decode("invoke context: non-string felts".into()));
                    };
                    Ok::<_, RpcError>(InvokeContext {
                        chain_id: chain_id.to_string(),
                        nonce: nonce.to_string(),
                        prices: GasPrices {
                            l1_gas: fri_price(&block, "l1_gas_price")?,
                            l2_gas: fri_price(&block, "l2_gas_price")?,
                            l1_data_gas: fri_price(&block, "l1_data_gas_price")?,
                        },
                    })
                }
            })
            .await
    }

    async fn submit(&self, action: &SignedAction) -> Result<String, RpcError> {
        let bounds = &action.resource_bounds;
        let result = self
            .request(
                "starknet_addInvokeTransaction",
                json!({
                    "invoke_transaction": {
                        "type": "INVOKE",
                        "version": "0x3",
                        "sender_address": action.sender_address,
                        "calldata": action.calldata,
                        "signature": action.signature,
                        "nonce": action.nonce,
                        "resource_bounds": {
                            "l1_gas": bound_json(&bounds.l1_gas),
                            "l2_gas": bound_json(&bounds.l2_gas),
                            "l1_data_gas": bound_json(&bounds.l1_data_gas),
                        },
                        "tip": "0x0",
                        "paymaster_data": [],
                        "account_deployment_data": [],
                        "nonce_data_availability_mode": "L1",
                        "fee_data_availability_mode": "L1",
                    }
                }),
            )
            .await?;
        let tx_hash = result
            .get("transaction_hash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RpcError::Decode("addInvoke: missing transaction_hash".into()))?;
        tracing::info!(
            target: "rpc",
            tx_hash = %tx_hash,
            signed_hash = %action.transaction_hash,
            sender = %action.sender_address,
            max_fee_fri = bounds.max_fee(),
            "Invoke submitted"
        );
        Ok(tx_hash)
    }
}
