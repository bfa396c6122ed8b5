// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! Round-robin pool of RPC endpoints with per-endpoint health tracking.
//!
//! Every logical call is attempted at most once per configured endpoint. An
//! endpoint that fails `failure_threshold` times in a row is parked until its
//! cooldown expires; if every endpoint is parked the one that recovers first
//! is tried anyway, so the pool degrades instead of refusing work.

use crate::common::constants::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RPC_TIMEOUT_MS,
};
use crate::common::error::RpcError;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{Instant, timeout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPolicy {
    pub failure_threshold: u32,
    pub cooldown: Duration,
    pub request_timeout: Duration,
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            request_timeout: Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
        }
    }
}

#[derive(Debug)]
struct Endpoint {
    url: String,
    consecutive_failures: u32,
    cooldown_until: Option<Instant>,
}

/// Read-only view of one endpoint, for status display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSnapshot {
    pub url: String,
    pub consecutive_failures: u32,
    pub cooldown_remaining: Option<Duration>,
}

pub struct EndpointPool {
    // One lock per endpoint: health updates are serialized per endpoint while
    // calls against different endpoints proceed in parallel.
    endpoints: Vec<Mutex<Endpoint>>,
    cursor: AtomicUsize,
    policy: PoolPolicy,
}

impl EndpointPool {
    pub fn new<I, S>(urls: I, policy: PoolPolicy) -> Result<Self, RpcError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = Vec::new();
        for url in urls {
            let url: String = url.into();
            let url = url.trim().to_string();
            if url.is_empty() || seen.contains(&url) {
                continue;
            }
            seen.push(url);
        }
        if seen.is_empty() {
            return Err(RpcError::NoEndpoints);
        }
        let endpoints = seen
            .into_iter()
            .map(|url| {
                Mutex::new(Endpoint {
                    url,
                    consecutive_failures: 0,
                    cooldown_until: None,
                })
            })
            .collect();
        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
            policy,
        })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        let now = Instant::now();
        (0..self.endpoints.len())
            .map(|idx| {
                let ep = self.lock(idx);
                EndpointSnapshot {
                    url: ep.url.clone(),
                    consecutive_failures: ep.consecutive_failures,
                    cooldown_remaining: ep
                        .cooldown_until
                        .filter(|until| *until > now)
                        .map(|until| until - now),
                }
            })
            .collect()
    }

    /// Execute `op` against the selected endpoint, failing over on error or
    /// timeout. `op` receives the endpoint URL and may be invoked up to
    /// `len()` times for one logical call.
    pub async fn call<F, Fut, T>(&self, op: F) -> Result<T, RpcError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let attempts = self.endpoints.len();
        let mut last_error: Option<RpcError> = None;

        for attempt in 1..=attempts {
            let idx = self.select(Instant::now());
            let url = self.lock(idx).url.clone();

            let outcome = match timeout(self.policy.request_timeout, op(url.clone())).await {
                Ok(res) => res,
                Err(_) => Err(RpcError::Timeout {
                    url: url.clone(),
                    timeout_ms: self.policy.request_timeout.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(value) => {
                    self.record_success(idx);
                    return Ok(value);
                }
                Err(e) => {
                    tracing::debug!(target: "rpc", url = %url, attempt, error = %e, "RPC attempt failed");
                    self.record_failure(idx, Instant::now());
                    last_error = Some(e);
                }
            }
        }

        Err(RpcError::AllEndpointsUnavailable {
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt made".to_string()),
        })
    }

    fn lock(&self, idx: usize) -> MutexGuard<'_, Endpoint> {
        self.endpoints[idx]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// First healthy endpoint at or after the cursor; otherwise the parked
    /// endpoint whose cooldown ends soonest.
    fn select(&self, now: Instant) -> usize {
        let n = self.endpoints.len();
        let start = self.cursor.load(Ordering::Acquire) % n;
        let mut earliest: Option<(usize, Instant)> = None;

        for offset in 0..n {
            let idx = (start + offset) % n;
            let mut ep = self.lock(idx);
            match ep.cooldown_until {
                None => return idx,
                Some(until) if until <= now => {
                    ep.cooldown_until = None;
                    ep.consecutive_failures = 0;
                    tracing::info!(target: "rpc", url = %ep.url, "Endpoint cooldown expired; back in rotation");
                    return idx;
                }
                Some(until) => {
                    if earliest.is_none_or(|(_, best)| until < best) {
                        earliest = Some((idx, until));
                    }
                }
            }
        }

        let idx = earliest.map(|(idx, _)| idx).unwrap_or(start);
        tracing::warn!(target: "rpc", url = %self.lock(idx).url, "All endpoints cooling down; retrying earliest to recover");
        idx
    }

    fn record_success(&self, idx: usize) {
        {
            let mut ep = self.lock(idx);
            ep.consecutive_failures = 0;
            ep.cooldown_until = None;
        }
        self.cursor
            .store((idx + 1) % self.endpoints.len(), Ordering::Release);
    }

    fn record_failure(&self, idx: usize, now: Instant) {
        {
            let mut ep = self.lock(idx);
            ep.consecutive_failures = ep.consecutive_failures.saturating_add(1);
            if ep.consecutive_failures >= self.policy.failure_threshold {
                ep.cooldown_until = Some(now + self.policy.cooldown);
                tracing::warn!(
                    target: "rpc",
                    url = %ep.url,
                    failures = ep.consecutive_failures,
                    cooldown_secs = self.policy.cooldown.as_secs(),
                    "Endpoint entered cooldown"
                );
            }
        }
        self.cursor
            .store((idx + 1) % self.endpoints.len(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn policy() -> PoolPolicy {
        PoolPolicy {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
            request_timeout: Duration::from_millis(500),
        }
    }

    fn pool(urls: &[&str]) -> EndpointPool {
        EndpointPool::new(urls.iter().copied(), policy()).expect("pool")
    }

    /// Records which endpoint served each attempt; endpoints listed in `failing` error out.
    async fn record_call(
        pool: &EndpointPool,
        log: &Arc<Mutex<Vec<String>>>,
        failing: &[&str],
    ) -> Result<String, RpcError> {
        let failing: Vec<String> = failing.iter().map(|s| s.to_string()).collect();
        pool.call(|url| {
            let log = log.clone();
            let fail = failing.contains(&url);
            async move {
                log.lock().unwrap().push(url.clone());
                if fail {
                    Err(RpcError::Transport {
                        url,
                        message: "connection refused".into(),
                    })
                } else {
                    Ok(url)
                }
            }
        })
        .await
    }

    #[test]
    fn rejects_empty_and_dedupes() {
        assert_eq!(
            EndpointPool::new(Vec::<String>::new(), policy()).err(),
            Some(RpcError::NoEndpoints)
        );
        let p = pool(&["http://a", " http://a ", "http://b", ""]);
        assert_eq!(p.len(), 2);
    }

    #[tokio::test]
    async fn pure_round_robin_without_failures() {
        let p = pool(&["a", "b", "c"]);
        let log = Arc::new(Mutex::new(Vec::new()));
        for k in 0..9 {
            let served = record_call(&p, &log, &[]).await.unwrap();
            assert_eq!(served, ["a", "b", "c"][k % 3]);
        }
        assert_eq!(log.lock().unwrap().len(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_endpoint_is_parked_after_threshold() {
        let p = pool(&["a", "b", "c"]);
        let log = Arc::new(Mutex::new(Vec::new()));

        // Drive until "a" has failed three times; every call still succeeds via failover.
        let mut a_failures = 0;
        while a_failures < 3 {
            let served = record_call(&p, &log, &["a"]).await.unwrap();
            assert_ne!(served, "a");
            a_failures = log.lock().unwrap().iter().filter(|u| *u == "a").count();
        }
        let a_state = &p.snapshot()[0];
        assert_eq!(a_state.consecutive_failures, 3);
        assert!(a_state.cooldown_remaining.is_some());

        log.lock().unwrap().clear();
        for _ in 0..6 {
            record_call(&p, &log, &["a"]).await.unwrap();
        }
        assert!(
            log.lock().unwrap().iter().all(|u| u != "a"),
            "parked endpoint must be skipped"
        );

        tokio::time::advance(Duration::from_secs(31)).await;
        log.lock().unwrap().clear();
        for _ in 0..3 {
            record_call(&p, &log, &[]).await.unwrap();
        }
        assert!(
            log.lock().unwrap().iter().any(|u| u == "a"),
            "endpoint returns after cooldown"
        );
        assert_eq!(p.snapshot()[0].consecutive_failures, 0);
    }

    #[tokio::test]
    async fn success_resets_failure_counter() {
        let p = pool(&["a", "b"]);
        let log = Arc::new(Mutex::new(Vec::new()));
        record_call(&p, &log, &["a"]).await.unwrap();
        assert_eq!(p.snapshot()[0].consecutive_failures, 1);
        // cursor is back on "a" after "b" served
        let served = record_call(&p, &log, &[]).await.unwrap();
        assert_eq!(served, "a");
        assert_eq!(p.snapshot()[0].consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_all_unavailable_after_pool_size_attempts() {
        let p = pool(&["a", "b"]);
        let log = Arc::new(Mutex::new(Vec::new()));
        let err = record_call(&p, &log, &["a", "b"]).await.unwrap_err();
        match err {
            RpcError::AllEndpointsUnavailable { attempts, last_error } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn all_parked_degrades_to_earliest_cooldown() {
        let p = pool(&["a", "b"]);
        let log = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..3 {
            let _ = record_call(&p, &log, &["a", "b"]).await;
        }
        assert!(p.snapshot().iter().all(|s| s.cooldown_remaining.is_some()));

        // "a" was parked first, so it is retried first even though nothing is healthy.
        log.lock().unwrap().clear();
        let served = record_call(&p, &log, &[]).await.unwrap();
        assert_eq!(served, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_failure_and_fails_over() {
        let p = pool(&["slow", "fast"]);
        let served = p
            .call(|url| async move {
                if url == "slow" {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok::<_, RpcError>(url)
            })
            .await
            .unwrap();
        assert_eq!(served, "fast");
        assert_eq!(p.snapshot()[0].consecutive_failures, 1);
    }
}
