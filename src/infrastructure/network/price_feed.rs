// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::ProviderError;
use crate::domain::types::PriceMap;
use async_trait::async_trait;

/// Where the profitability gate gets its prices. Consulted once per tick.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn market_prices(&self) -> Result<PriceMap, ProviderError>;
}

/// Fixed operator-supplied prices (`PRICE_SOURCE=static`).
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    prices: PriceMap,
}

impl StaticPriceSource {
    pub fn new(prices: PriceMap) -> Self {
        Self { prices }
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn market_prices(&self) -> Result<PriceMap, ProviderError> {
        if self.prices.is_empty() {
            return Err(ProviderError::Decode("static price map is empty".into()));
        }
        Ok(self.prices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_returns_configured_map() {
        let prices: PriceMap = [("Iron Ore".to_string(), 5.0), ("Steel".to_string(), 20.0)]
            .into_iter()
            .collect();
        let source = StaticPriceSource::new(prices.clone());
        assert_eq!(source.market_prices().await.expect("prices"), prices);
    }

    #[tokio::test]
    async fn empty_static_source_is_an_error() {
        let source = StaticPriceSource::default();
        assert!(source.market_prices().await.is_err());
    }
}
