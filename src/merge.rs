// Merge adapter: one response shape for content entities plus operational data
// Renderers depend on ResponseViewModel only, never on where the data came from

use crate::cache::Clock;
use crate::ratings::{RatingRecord, RatingsProvider, RatingsSource};
use crate::synth::{AvailabilityRecord, AvailabilitySynthesizer, StayDates};
use serde::Serialize;

/// The slice of a CMS content item this layer needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityView {
    pub codename: String,
    pub name: String,
    pub place_id: Option<String>,
    /// Accommodation labels in editor order ("ways to stay").
    pub ways_to_stay: Vec<String>,
}

// Payload from whichever operational source is active
#[derive(Debug, Clone, PartialEq)]
pub enum OperationalData {
    Ratings(RatingRecord),
    Availability(AvailabilityRecord),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseViewModel {
    pub entity_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    pub ways_to_stay: Vec<String>,
    // None hides the section; an empty ratings record counts as None
    pub ratings: Option<RatingRecord>,
    pub availability: Option<AvailabilityRecord>,
}

impl ResponseViewModel {
    fn for_entity(entity: &EntityView) -> Self {
        Self {
            entity_id: entity.codename.clone(),
            name: entity.name.clone(),
            place_id: entity.place_id.clone(),
            ways_to_stay: entity.ways_to_stay.clone(),
            ratings: None,
            availability: None,
        }
    }

    fn absorb(mut self, data: OperationalData) -> Self {
        match data {
            OperationalData::Ratings(record) => {
                self.ratings = (!record.is_empty()).then_some(record);
            }
            OperationalData::Availability(record) => self.availability = Some(record),
            OperationalData::Unavailable => {}
        }
        self
    }
}

pub fn merge(entity: &EntityView, data: OperationalData) -> ResponseViewModel {
    ResponseViewModel::for_entity(entity).absorb(data)
}

// Later payloads of the same kind replace earlier ones
pub fn merge_all(
    entity: &EntityView,
    data: impl IntoIterator<Item = OperationalData>,
) -> ResponseViewModel {
    data.into_iter()
        .fold(ResponseViewModel::for_entity(entity), ResponseViewModel::absorb)
}

/// Gathers ratings (when the entity has a place id) and label-driven
/// availability for one entity and merges them.
pub async fn assemble<S: RatingsSource, C: Clock>(
    entity: &EntityView,
    ratings: &RatingsProvider<S, C>,
    synthesizer: &AvailabilitySynthesizer,
    dates: StayDates,
) -> ResponseViewModel {
    let rating_data = match entity.place_id.as_deref().filter(|id| !id.is_empty()) {
        Some(place_id) => OperationalData::Ratings(ratings.fetch_ratings(place_id).await),
        None => OperationalData::Unavailable,
    };
    let availability =
        synthesizer.synthesize_for(&entity.codename, &entity.ways_to_stay, dates);

    merge_all(
        entity,
        [rating_data, OperationalData::Availability(availability)],
    )
}
