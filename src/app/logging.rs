// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Line-oriented log capability handed to the strategy engine at construction.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

/// Forwards every line to `tracing` under the `strategy` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str) {
        tracing::info!(target: "strategy", "{message}");
    }
}

/// Keeps the most recent lines in memory for the status view.
#[derive(Debug)]
pub struct MemorySink {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn recent(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, message: &str) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(message.to_string());
    }
}

/// Fans a line out to several sinks.
pub struct TeeSink(pub Vec<std::sync::Arc<dyn LogSink>>);

impl LogSink for TeeSink {
    fn log(&self, message: &str) {
        for sink in &self.0 {
            sink.log(message);
        }
    }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    // If user passes a bare level (e.g. "debug"), apply sane noisy-module defaults.
    // Custom directive strings (with ',' or '=') are respected as-is.
    let normalized = log_level.trim();
    let filter_spec = if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!(
            "{},h2=info,hyper=info,hyper_util=info,reqwest=info,rustls=info",
            normalized
        )
    };
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(false);
        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .compact();
        subscriber.with(fmt_layer).init();
    }

    let directives: Vec<&str> = filter_spec
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    let base = directives.first().copied().unwrap_or("info");
    let overrides = directives
        .iter()
        .skip(1)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    if overrides.is_empty() {
        tracing::info!(
            "Logging initialized\n  base: {base}\n  format: {}",
            if json_format { "json" } else { "compact" }
        );
    } else {
        tracing::info!(
            "Logging initialized\n  base: {base}\n  overrides: {overrides}\n  format: {}",
            if json_format { "json" } else { "compact" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_most_recent_lines() {
        let sink = MemorySink::new(2);
        sink.log("one");
        sink.log("two");
        sink.log("three");
        assert_eq!(sink.recent(), vec!["two".to_string(), "three".to_string()]);
    }

    #[test]
    fn tee_reaches_every_sink() {
        let a = std::sync::Arc::new(MemorySink::new(4));
        let b = std::sync::Arc::new(MemorySink::new(4));
        let sinks: Vec<std::sync::Arc<dyn LogSink>> = vec![a.clone(), b.clone()];
        let tee = TeeSink(sinks);
        tee.log("tick");
        assert_eq!(a.recent(), vec!["tick".to_string()]);
        assert_eq!(b.recent(), vec!["tick".to_string()]);
    }
}
