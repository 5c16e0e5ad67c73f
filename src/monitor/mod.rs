use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process usage counters surfaced by the monitoring dashboard.
#[derive(Debug)]
pub struct UsageStats {
    started_at: i64,
    chat_requests: AtomicU64,
    chat_answers: AtomicU64,
    chat_failures: AtomicU64,
    papers_served: AtomicU64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub uptime_secs: i64,
    pub chat_requests: u64,
    pub chat_answers: u64,
    pub chat_failures: u64,
    pub papers_served: u64,
}

impl UsageStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now().timestamp(),
            chat_requests: AtomicU64::new(0),
            chat_answers: AtomicU64::new(0),
            chat_failures: AtomicU64::new(0),
            papers_served: AtomicU64::new(0),
        }
    }

    pub fn record_chat_request(&self) {
        self.chat_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chat_answer(&self) {
        self.chat_answers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chat_failure(&self) {
        self.chat_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_papers_served(&self, count: u64) {
        self.papers_served.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            uptime_secs: Utc::now().timestamp() - self.started_at,
            chat_requests: self.chat_requests.load(Ordering::Relaxed),
            chat_answers: self.chat_answers.load(Ordering::Relaxed),
            chat_failures: self.chat_failures.load(Ordering::Relaxed),
            papers_served: self.papers_served.load(Ordering::Relaxed),
        }
    }
}

impl Default for UsageStats {
    fn default() -> Self {
        Self::new()
    }
}
