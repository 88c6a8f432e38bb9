// Ratings provider: cache-first lookup of third-party ratings with graceful degradation
// Upstream failures never reach the caller; they turn into stale or empty records

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::places::{PlaceDetailsResponse, DETAIL_FIELDS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MAX_REVIEWS: usize = 5;
pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

// Everything that can go wrong talking to the ratings provider
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Ratings provider credentials are not configured")]
    MissingCredentials,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Provider status {status}: {message}")]
    ProviderStatus { status: String, message: String },

    #[error("Provider response has no result")]
    EmptyResult,

    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author_name: String,
    pub text: String,
    pub rating: u32,
}

/// Ratings summary for one place, shaped the way the rendering layer reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingRecord {
    pub rating: f64,
    #[serde(rename = "user_ratings_total")]
    pub review_count: u32,
    pub reviews: Vec<Review>,
}

impl RatingRecord {
    // The documented "nothing known" record
    pub fn empty() -> Self {
        Self::default()
    }

    // Renderers hide the ratings section for this
    pub fn is_empty(&self) -> bool {
        self.review_count == 0 && self.reviews.is_empty() && self.rating == 0.0
    }
}

// Which branch of the decision tree answered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingsOutcome {
    CacheHit,
    UpstreamSuccess,
    StaleFallback,
    EmptyFallback,
}

// Upstream seam; the HTTP client in production, fakes in tests
#[async_trait]
pub trait RatingsSource: Send + Sync + 'static {
    async fn fetch(&self, place_id: &str) -> Result<RatingRecord, UpstreamError>;
}

#[async_trait]
impl<T: RatingsSource + ?Sized> RatingsSource for Arc<T> {
    async fn fetch(&self, place_id: &str) -> Result<RatingRecord, UpstreamError> {
        (**self).fetch(place_id).await
    }
}

#[derive(Debug, Clone)]
pub struct RatingsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Bound on the single outbound call. `None` leaves the request
    /// unbounded, which is the historical behaviour of this endpoint.
    pub timeout: Option<Duration>,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PLACES_BASE_URL.to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

/// `RatingsSource` backed by the Google Places details endpoint.
pub struct GooglePlacesSource {
    client: reqwest::Client,
    config: RatingsConfig,
}

impl GooglePlacesSource {
    pub fn new(config: RatingsConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn details_url(&self) -> String {
        format!(
            "{}/place/details/json",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn map_transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            let ms = self.config.timeout.map_or(0, |t| t.as_millis() as u64);
            UpstreamError::Timeout(ms)
        } else {
            UpstreamError::NetworkError(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl RatingsSource for GooglePlacesSource {
    async fn fetch(&self, place_id: &str) -> Result<RatingRecord, UpstreamError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(UpstreamError::MissingCredentials)?;

        debug!(place_id, "requesting place details");

        let response = self
            .client
            .get(self.details_url())
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::ApiResponseError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: PlaceDetailsResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidBody(e.without_url().to_string()))?;

        if !body.is_success() {
            return Err(UpstreamError::ProviderStatus {
                status: body.status,
                message: body.error_message.unwrap_or_default(),
            });
        }

        body.result
            .map(RatingRecord::from)
            .ok_or(UpstreamError::EmptyResult)
    }
}

/// Cache-first ratings lookup.
///
/// One call makes at most one upstream request and at most one cache write.
/// There are no retries: a failed request falls back to whatever the cache
/// last held for the place, however old, and otherwise to
/// [`RatingRecord::empty`].
pub struct RatingsProvider<S, C = SystemClock> {
    cache: Arc<TtlCache<RatingRecord, C>>,
    source: S,
}

impl<S: RatingsSource, C: Clock> RatingsProvider<S, C> {
    pub fn new(cache: Arc<TtlCache<RatingRecord, C>>, source: S) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &Arc<TtlCache<RatingRecord, C>> {
        &self.cache
    }

    pub async fn fetch_ratings(&self, place_id: &str) -> RatingRecord {
        self.fetch_ratings_with_outcome(place_id).await.0
    }

    pub async fn fetch_ratings_with_outcome(&self, place_id: &str) -> (RatingRecord, RatingsOutcome) {
        if let Some(record) = self.cache.get(place_id) {
            debug!(place_id, "ratings cache hit");
            return (record, RatingsOutcome::CacheHit);
        }

        info!(place_id, "ratings cache miss, calling provider");

        match self.source.fetch(place_id).await {
            Ok(record) => {
                self.cache.set(place_id, record.clone());
                info!(
                    place_id,
                    rating = record.rating,
                    reviews = record.reviews.len(),
                    "ratings fetched from provider"
                );
                (record, RatingsOutcome::UpstreamSuccess)
            }
            Err(err) => {
                warn!(place_id, error = %err, "ratings provider failed");
                match self.cache.get_stale(place_id) {
                    Some(record) => {
                        warn!(place_id, "serving expired ratings");
                        (record, RatingsOutcome::StaleFallback)
                    }
                    None => {
                        warn!(place_id, "no ratings available, returning empty record");
                        (RatingRecord::empty(), RatingsOutcome::EmptyFallback)
                    }
                }
            }
        }
    }
}
