//! Application state management
//!
//! Author: hephaex@gmail.com

use chrono::{DateTime, Utc};
use locner_core::config::AppConfig;
use locner_extractor::LocationNer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Application state shared across handlers
///
/// Everything here is read-only after startup except the request counter.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Location recognizer with its loaded lexicons
    pub ner: LocationNer,
    /// Server start time
    pub start_time: Instant,
    /// Wall-clock start time, reported by /health
    pub started_at: DateTime<Utc>,
    /// Request counter
    pub request_count: AtomicU64,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, ner: LocationNer) -> Self {
        Self {
            config,
            ner,
            start_time: Instant::now(),
            started_at: Utc::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
