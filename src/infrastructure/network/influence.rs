// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! Influence game API: crew state and market prices.

use crate::common::constants::{DEFAULT_INFLUENCE_API_URL, DEFAULT_INFLUENCE_RATE_LIMIT_RPS};
use crate::common::error::{AppError, ProviderError};
use crate::common::retry::retry_async;
use crate::domain::types::{CrewState, PriceMap};
use crate::network::price_feed::PriceSource;
use crate::network::rate_limiter::ApiRateLimiter;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

const RETRY_ATTEMPTS: usize = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
const PROVIDER: &str = "influence";

#[async_trait]
pub trait GameStateProvider: Send + Sync {
    async fn crew_metadata(&self, crew_id: u64) -> Result<CrewState, ProviderError>;
}

#[derive(Clone)]
pub struct InfluenceConfig {
    pub base_url: String,
    pub rate_limit_rps: u32,
    pub timeout: Duration,
    pub api_key: Option<Zeroizing<String>>,
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INFLUENCE_API_URL.to_string(),
            rate_limit_rps: DEFAULT_INFLUENCE_RATE_LIMIT_RPS,
            timeout: Duration::from_secs(10),
            api_key: None,
        }
    }
}

impl fmt::Debug for InfluenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluenceConfig")
            .field("base_url", &self.base_url)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Deserialize)]
struct CrewRecord {
    #[serde(default, alias = "busyUntil", alias = "readyAt")]
    busy_until: u64,
    #[serde(default, alias = "foodKg", alias = "food")]
    food_kg: f64,
    #[serde(default, alias = "locationId")]
    location: u64,
    #[serde(default, alias = "classId", alias = "crewClass")]
    class_id: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MarketResponse {
    Wrapped { prices: PriceMap },
    Flat(PriceMap),
}

pub struct InfluenceClient {
    http: Client,
    base_url: String,
    limiter: ApiRateLimiter,
    api_key: Option<Zeroizing<String>>,
}

impl InfluenceClient {
    pub fn new(config: InfluenceConfig) -> Result<Self, AppError> {
        url::Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("Invalid INFLUENCE_API_URL: {e}")))?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: ApiRateLimiter::per_second(config.rate_limit_rps)?,
            api_key: config.api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        retry_async(
            |_| self.get_once(path),
            RETRY_ATTEMPTS,
            RETRY_BASE_DELAY,
            |e: &ProviderError| matches!(e, ProviderError::Transient(_)),
        )
        .await
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        self.limiter.until_ready().await;
        let url = format!("{}{path}", self.base_url);
        let mut req = self.http.get(&url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key.as_str());
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ProviderError::Transient(format!("GET {path}: {e}")))?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(ProviderError::Transient(format!("GET {path}: HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ProviderError::ApiCall {
                provider: PROVIDER.into(),
                status: status.as_u16(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(format!("GET {path}: {e}")))
    }
}

#[async_trait]
impl GameStateProvider for InfluenceClient {
    async fn crew_metadata(&self, crew_id: u64) -> Result<CrewState, ProviderError> {
        let record: CrewRecord = self.get_json(&format!("/v2/crews/{crew_id}")).await?;
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let crew = CrewState {
            is_busy: record.busy_until > now,
            busy_until: record.busy_until,
            food_kg: record.food_kg,
            location: record.location,
            class_id: record.class_id,
        };
        tracing::debug!(target: "influence", crew_id, busy = crew.is_busy, food_kg = crew.food_kg, "Crew metadata");
        Ok(crew)
    }
}

#[async_trait]
impl PriceSource for InfluenceClient {
    async fn market_prices(&self) -> Result<PriceMap, ProviderError> {
        let response: MarketResponse = self.get_json("/v2/market/prices").await?;
        let raw = match response {
            MarketResponse::Wrapped { prices } | MarketResponse::Flat(prices) => prices,
        };
        let prices: PriceMap = raw
            .into_iter()
            .filter(|(name, price)| {
                let usable = price.is_finite() && *price >= 0.0;
                if !usable {
                    tracing::warn!(target: "influence", resource = %name, price, "Dropping unusable market price");
                }
                usable
            })
            .collect();
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const KEY: &str = "Bearer test-key";

    /// Crews 1 (busy) and 2 (idle) plus a market snapshot, all behind the key.
    async fn game_api() -> MockServer {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/crews/1").header("authorization", KEY);
                then.status(200).json_body(
                    json!({"busyUntil": 4_000_000_000u64, "foodKg": 812.5, "locationId": 7, "classId": 1}),
                );
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/crews/2").header("authorization", KEY);
                then.status(200)
                    .json_body(json!({"busy_until": 0, "food_kg": 100.0, "location": 3, "class_id": 4}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/market/prices").header("authorization", KEY);
                then.status(200).json_body(
                    json!({"prices": {"Iron Ore": 5.0, "Fuel": 2.0, "Steel": 20.0, "Junk": -1.0}}),
                );
            })
            .await;
        server
    }

    fn client(base_url: String, key: Option<&str>) -> InfluenceClient {
        InfluenceClient::new(InfluenceConfig {
            base_url,
            rate_limit_rps: 50,
            timeout: Duration::from_secs(5),
            api_key: key.map(|k| Zeroizing::new(k.to_string())),
        })
        .expect("client")
    }

    #[tokio::test]
    async fn crew_busy_is_derived_from_busy_until() {
        let server = game_api().await;
        let client = client(server.base_url(), Some("test-key"));

        let busy = client.crew_metadata(1).await.expect("crew 1");
        assert!(busy.is_busy);
        assert_eq!(busy.food_kg, 812.5);
        assert_eq!(busy.location, 7);

        let idle = client.crew_metadata(2).await.expect("crew 2");
        assert!(!idle.is_busy);
        assert_eq!(idle.class_id, 4);
    }

    #[tokio::test]
    async fn market_prices_drop_negative_entries() {
        let server = game_api().await;
        let client = client(server.base_url(), Some("test-key"));
        let prices = client.market_prices().await.expect("prices");
        assert_eq!(prices.len(), 3);
        assert_eq!(prices.get("Steel"), Some(&20.0));
        assert!(!prices.contains_key("Junk"));
    }

    #[tokio::test]
    async fn client_errors_surface_status_without_retry() {
        let server = MockServer::start_async().await;
        let unauthorized = server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/crews/1");
                then.status(401).json_body(json!({"error": "unauthorized"}));
            })
            .await;
        let client = client(server.base_url(), None);

        let err = client.crew_metadata(1).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::ApiCall {
                provider: "influence".into(),
                status: 401
            }
        );
        assert_eq!(unauthorized.hits_async().await, 1);
    }

    #[tokio::test]
    async fn overloaded_api_is_retried_then_reported_transient() {
        let server = MockServer::start_async().await;
        let overloaded = server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/market/prices");
                then.status(503);
            })
            .await;
        let client = client(server.base_url(), Some("test-key"));

        let err = client.market_prices().await.unwrap_err();
        assert!(matches!(err, ProviderError::Transient(_)));
        assert_eq!(overloaded.hits_async().await, RETRY_ATTEMPTS);
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = InfluenceConfig {
            api_key: Some(Zeroizing::new("super-secret".into())),
            ..InfluenceConfig::default()
        };
        assert!(!format!("{cfg:?}").contains("super-secret"));
    }
}
