// Service configuration, read from the environment
use crate::cache::DEFAULT_TTL;
use crate::ratings::{RatingsConfig, DEFAULT_PLACES_BASE_URL};
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub ratings: RatingsConfig,
    pub ratings_cache_ttl: Duration,
    pub availability_latency: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            ratings: RatingsConfig::default(),
            ratings_cache_ttl: DEFAULT_TTL,
            availability_latency: Duration::ZERO,
        }
    }
}

impl ServiceConfig {
    /// Create ServiceConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `BIND_ADDR`: listen address (default: 0.0.0.0:3000)
    /// - `GOOGLE_PLACES_API_KEY`: ratings provider key (default: unset, every fetch degrades)
    /// - `GOOGLE_PLACES_BASE_URL`: provider base URL (default: https://maps.googleapis.com/maps/api)
    /// - `RATINGS_CACHE_TTL_SECS`: freshness window for cached ratings (default: 86400)
    /// - `RATINGS_TIMEOUT_MS`: bound on the provider call (default: unset, no timeout)
    /// - `AVAILABILITY_LATENCY_MS`: simulated booking backend latency (default: 0)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let parse_u64 = |name: &str| non_empty(name).and_then(|v| v.trim().parse::<u64>().ok());

        let defaults = Self::default();

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            ratings: RatingsConfig {
                base_url: non_empty("GOOGLE_PLACES_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PLACES_BASE_URL.to_string()),
                api_key: non_empty("GOOGLE_PLACES_API_KEY"),
                timeout: parse_u64("RATINGS_TIMEOUT_MS").map(Duration::from_millis),
            },
            ratings_cache_ttl: parse_u64("RATINGS_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ratings_cache_ttl),
            availability_latency: parse_u64("AVAILABILITY_LATENCY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.availability_latency),
        }
    }
}
