// Wire types for the Google Places "place details" response
use crate::ratings::{RatingRecord, Review, MAX_REVIEWS};
use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "OK";
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

// Fields requested from the provider; anything else is ignored
pub const DETAIL_FIELDS: &str = "rating,user_ratings_total,reviews";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaceDetailsResponse {
    pub status: String,
    pub error_message: Option<String>,
    pub result: Option<PlaceDetails>,
}

impl PlaceDetailsResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK || self.status == STATUS_ZERO_RESULTS
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaceDetails {
    pub rating: Option<f64>,
    pub user_ratings_total: Option<f64>,
    pub reviews: Option<Vec<PlaceReview>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaceReview {
    pub author_name: Option<String>,
    pub text: Option<String>,
    pub rating: Option<f64>,
}

// Provider numbers are JSON numbers, not necessarily whole or positive
fn whole_count(value: Option<f64>) -> u32 {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

impl From<PlaceReview> for Review {
    fn from(item: PlaceReview) -> Self {
        Review {
            author_name: item
                .author_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            text: item.text.unwrap_or_default(),
            rating: whole_count(item.rating),
        }
    }
}

// Sanitising conversion: missing numbers become 0, reviews keep provider order, first five only
impl From<PlaceDetails> for RatingRecord {
    fn from(item: PlaceDetails) -> Self {
        RatingRecord {
            rating: item.rating.filter(|r| r.is_finite()).unwrap_or(0.0),
            review_count: whole_count(item.user_ratings_total),
            reviews: item
                .reviews
                .unwrap_or_default()
                .into_iter()
                .take(MAX_REVIEWS)
                .map(Review::from)
                .collect(),
        }
    }
}
