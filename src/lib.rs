// Operational-data boundary for the campground site: cached ratings and synthesized availability

pub mod api;
pub mod availability;
pub mod cache;
pub mod config;
pub mod merge;
pub mod params;
pub mod places;
pub mod ratings;
pub mod synth;

// Re-export key types for convenience
pub use api::{build_router, ApiError, AppState};
pub use availability::{AvailabilityQuery, AvailabilityService};
pub use cache::{CacheStatsReport, Clock, ManualClock, SystemClock, TtlCache};
pub use config::ServiceConfig;
pub use merge::{assemble, merge, merge_all, EntityView, OperationalData, ResponseViewModel};
pub use params::{parse_date, ValidationError};
pub use ratings::{
    GooglePlacesSource, RatingRecord, RatingsConfig, RatingsOutcome, RatingsProvider,
    RatingsSource, Review, UpstreamError,
};
pub use synth::{AvailabilityRecord, AvailabilitySynthesizer, SeededDraw, SiteTypeRecord, StayDates};
