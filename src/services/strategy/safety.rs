// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::constants::{DEFAULT_CIRCUIT_MAX_FAILURES, DEFAULT_CIRCUIT_RESET_SECS};
use crate::common::error::StrategyError;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Circuit breaker over consecutive failed submissions.
pub struct SafetyGuard {
    consecutive_failures: AtomicUsize,
    last_failure_ts: AtomicU64,
    max_failures: usize,
    reset_interval_sec: u64,
}

impl Default for SafetyGuard {
    fn default() -> Self {
        Self::new(DEFAULT_CIRCUIT_MAX_FAILURES, DEFAULT_CIRCUIT_RESET_SECS)
    }
}

impl SafetyGuard {
    pub fn new(max_failures: usize, reset_interval_sec: u64) -> Self {
        Self {
            consecutive_failures: AtomicUsize::new(0),
            last_failure_ts: AtomicU64::new(0),
            max_failures: max_failures.max(1),
            reset_interval_sec,
        }
    }

    pub fn check(&self) -> Result<(), StrategyError> {
        self.check_at(current_unix())
    }

    fn check_at(&self, now: u64) -> Result<(), StrategyError> {
        let failures = self.consecutive_failures.load(Ordering::Relaxed);
        if failures < self.max_failures {
            return Ok(());
        }
        let last = self.last_failure_ts.load(Ordering::Relaxed);
        if now.saturating_sub(last) > self.reset_interval_sec {
            self.consecutive_failures.store(0, Ordering::Relaxed);
            tracing::info!(target: "strategy", "Safety guard: circuit breaker auto-reset");
            Ok(())
        } else {
            Err(StrategyError::CircuitOpen)
        }
    }

    pub fn report_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    pub fn report_failure(&self) {
        self.report_failure_at(current_unix());
    }

    fn report_failure_at(&self, now: u64) {
        let count = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        self.last_failure_ts.store(now, Ordering::Relaxed);
        if count >= self.max_failures {
            tracing::error!(target: "strategy", failures = count, "Safety guard: circuit breaker tripped");
        }
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}

fn current_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
