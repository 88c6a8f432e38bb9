// HTTP surface: read-only availability and ratings endpoints with open CORS
use crate::availability::{AvailabilityQuery, AvailabilityService};
use crate::cache::TtlCache;
use crate::config::ServiceConfig;
use crate::params::{required_param, ValidationError};
use crate::ratings::{ClientError, GooglePlacesSource, RatingRecord, RatingsProvider, RatingsSource};
use crate::synth::{AvailabilityRecord, AvailabilitySynthesizer};
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => {
                warn!(error = %err, "rejected request");
                let body = json!({ "error": err.to_string(), "message": err.message() });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
        }
    }
}

/// Shared state for all handlers.
pub struct AppState {
    pub ratings: RatingsProvider<Arc<dyn RatingsSource>>,
    pub availability: AvailabilityService,
}

impl AppState {
    pub fn new(
        ratings: RatingsProvider<Arc<dyn RatingsSource>>,
        availability: AvailabilityService,
    ) -> Self {
        Self {
            ratings,
            availability,
        }
    }

    // Fresh, empty ratings cache per process
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ClientError> {
        let source: Arc<dyn RatingsSource> =
            Arc::new(GooglePlacesSource::new(config.ratings.clone())?);
        let cache = Arc::new(TtlCache::new(config.ratings_cache_ttl));
        let availability = AvailabilityService::new(AvailabilitySynthesizer::default())
            .with_latency(config.availability_latency);

        Ok(Self::new(RatingsProvider::new(cache, source), availability))
    }
}

/// GET /api/availability?entityId=..&checkIn=..[&checkOut=..]
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<AvailabilityRecord>, ApiError> {
    let query = AvailabilityQuery::from_pairs(&params)?;
    Ok(Json(state.availability.check(&query).await))
}

/// GET /api/google-ratings?placeId=..
///
/// Always 200 once the place id is valid; provider trouble shows up as a
/// stale or empty record, never as an error.
pub async fn get_ratings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<RatingRecord>, ApiError> {
    let place_id = required_param(&params, &["placeId"], ValidationError::MissingPlaceId)?;
    Ok(Json(state.ratings.fetch_ratings(place_id).await))
}

pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "ratings_cache_items": state.ratings.cache().len(),
    }))
}

// Plain OPTIONS without CORS request headers
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "handler panicked");
    ApiError::Internal.into_response()
}

pub fn build_router(state: AppState) -> Router {
    // Open to any origin, read-only
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/availability",
            get(get_availability)
                .head(method_not_allowed)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/google-ratings",
            get(get_ratings)
                .head(method_not_allowed)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route("/api/health", get(get_health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratings::mock_source::{sample_record, spawn_places_stub, MockSource};
    use crate::ratings::{RatingsConfig, Review};
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn make_app(source: Arc<MockSource>) -> Router {
        let source: Arc<dyn RatingsSource> = source;
        let provider = RatingsProvider::new(Arc::new(TtlCache::default()), source);
        build_router(AppState::new(provider, AvailabilityService::default()))
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Response) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ORIGIN, "https://www.example.com")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        (resp.status(), resp)
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_availability_defaults_check_out() {
        let app = make_app(Arc::new(MockSource::new(sample_record())));
        let (status, resp) = send(
            app,
            Method::GET,
            "/api/availability?entityId=demo-camp-1&checkIn=2024-01-15",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );

        let body = body_json(resp).await;
        assert_eq!(body["checkIn"], "2024-01-15");
        assert_eq!(body["checkOut"], "2024-01-16");

        let site_types = body["siteTypes"].as_array().unwrap();
        let any_available = site_types.iter().any(|s| s["available"] == true);
        assert_eq!(body["available"], any_available);
    }

    #[tokio::test]
    async fn test_availability_rejects_reversed_range() {
        let app = make_app(Arc::new(MockSource::new(sample_record())));
        let (status, resp) = send(
            app,
            Method::GET,
            "/api/availability?entityId=demo-camp-1&checkIn=2024-01-16&checkOut=2024-01-15",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Invalid date range");
        assert_eq!(body["message"], "Check-out date must be after check-in date");
    }

    #[tokio::test]
    async fn test_availability_requires_single_entity_id() {
        let app = make_app(Arc::new(MockSource::new(sample_record())));
        let (status, _) = send(
            app,
            Method::GET,
            "/api/availability?entityId=a&entityId=b&checkIn=2024-01-15",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ratings_sanitized_and_cached() {
        let mut record = sample_record();
        record.reviews.push(Review {
            author_name: "Anonymous".to_string(),
            text: String::new(),
            rating: 4,
        });
        let source = Arc::new(MockSource::new(record));
        let app = make_app(source.clone());

        let (status, resp) = send(
            app.clone(),
            Method::GET,
            "/api/google-ratings?placeId=place-xyz",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let first = body_json(resp).await;
        assert_eq!(first["reviews"][1]["author_name"], "Anonymous");
        assert_eq!(first["user_ratings_total"], 120);

        let (_, resp) = send(app, Method::GET, "/api/google-ratings?placeId=place-xyz").await;
        assert_eq!(body_json(resp).await, first);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_ratings_failure_is_still_ok() {
        let app = make_app(Arc::new(MockSource::failing()));
        let (status, resp) = send(app, Method::GET, "/api/google-ratings?placeId=place-xyz").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({"rating": 0.0, "user_ratings_total": 0, "reviews": []})
        );
    }

    #[tokio::test]
    async fn test_ratings_require_place_id() {
        let app = make_app(Arc::new(MockSource::new(sample_record())));
        let (status, resp) = send(app, Method::GET, "/api/google-ratings").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["error"],
            "Missing or invalid placeId parameter"
        );
    }

    #[tokio::test]
    async fn test_non_get_is_rejected() {
        let app = make_app(Arc::new(MockSource::new(sample_record())));
        let (status, resp) = send(app, Method::POST, "/api/google-ratings?placeId=p").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(resp).await["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_head_is_rejected() {
        let source = Arc::new(MockSource::new(sample_record()));
        let app = make_app(source.clone());

        for uri in [
            "/api/availability?entityId=demo-camp-1&checkIn=2024-01-15",
            "/api/google-ratings?placeId=place-xyz",
        ] {
            let (status, _) = send(app.clone(), Method::HEAD, uri).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
        }
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_ratings_from_places_fill_missing_author() {
        let base_url = spawn_places_stub(
            StatusCode::OK,
            json!({
                "status": "OK",
                "result": {
                    "rating": 4.2,
                    "user_ratings_total": 33,
                    "reviews": [{"text": "Lovely lake views", "rating": 5}]
                }
            }),
        )
        .await;
        let source: Arc<dyn RatingsSource> = Arc::new(
            GooglePlacesSource::new(RatingsConfig {
                base_url,
                api_key: Some("test_key".to_string()),
                timeout: Some(Duration::from_secs(5)),
            })
            .unwrap(),
        );
        let provider = RatingsProvider::new(Arc::new(TtlCache::default()), source);
        let app = build_router(AppState::new(provider, AvailabilityService::default()));

        let (status, resp) = send(app, Method::GET, "/api/google-ratings?placeId=place-xyz").await;

        assert_eq!(status, StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["rating"], 4.2);
        assert_eq!(body["user_ratings_total"], 33);
        assert_eq!(body["reviews"][0]["author_name"], "Anonymous");
        assert_eq!(body["reviews"][0]["text"], "Lovely lake views");
        assert_eq!(body["reviews"][0]["rating"], 5);
    }

    #[tokio::test]
    async fn test_options_answered_without_body() {
        let app = make_app(Arc::new(MockSource::new(sample_record())));
        let (status, resp) = send(app, Method::OPTIONS, "/api/availability").await;

        assert!(status.is_success());
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = make_app(Arc::new(MockSource::new(sample_record())));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/google-ratings")
            .header(header::ORIGIN, "https://www.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        let methods = resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("GET"));
    }

    #[tokio::test]
    async fn test_health_reports_cache_size() {
        let app = make_app(Arc::new(MockSource::new(sample_record())));
        let (status, resp) = send(app, Method::GET, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ratings_cache_items"], 0);
    }

    #[test]
    fn test_panic_maps_to_internal_error() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_state_from_default_config() {
        let state = AppState::from_config(&ServiceConfig::default()).unwrap();
        assert!(state.ratings.cache().is_empty());
    }
}
