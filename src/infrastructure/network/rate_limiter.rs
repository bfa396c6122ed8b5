// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Process-wide token bucket for an outbound API.
#[derive(Clone)]
pub struct ApiRateLimiter {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl ApiRateLimiter {
    pub fn per_second(requests: u32) -> Result<Self, AppError> {
        let rate = NonZeroU32::new(requests).ok_or_else(|| AppError::Validation {
            field: "INFLUENCE_RATE_LIMIT_RPS".into(),
            message: "must be greater than zero".into(),
        })?;
        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        })
    }

    pub async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }
}
