// Availability query: parameter validation in front of the synthesizer
use crate::params::{parse_date, required_param, single_param, Param, ValidationError};
use crate::synth::{AvailabilityRecord, AvailabilitySynthesizer, StayDates};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub entity_id: String,
    pub dates: StayDates,
}

impl AvailabilityQuery {
    pub fn new(
        entity_id: impl Into<String>,
        check_in: &str,
        check_out: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let entity_id = entity_id.into();
        if entity_id.is_empty() {
            return Err(ValidationError::MissingEntityId);
        }

        let check_in = parse_date(check_in).ok_or(ValidationError::InvalidCheckIn)?;
        let dates = match check_out.and_then(parse_date) {
            Some(check_out) => {
                StayDates::new(check_in, check_out).ok_or(ValidationError::InvalidDateRange)?
            }
            None => StayDates::one_night(check_in).ok_or(ValidationError::InvalidCheckIn)?,
        };

        Ok(Self { entity_id, dates })
    }

    // Builds a query from raw URL pairs; `campgroundId` is accepted for older callers
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ValidationError> {
        let entity_id = required_param(
            pairs,
            &["entityId", "campgroundId"],
            ValidationError::MissingEntityId,
        )?;
        let check_in = required_param(pairs, &["checkIn"], ValidationError::MissingCheckIn)?;

        // A repeated or unreadable checkOut falls back to one night
        let check_out = match single_param(pairs, &["checkOut"]) {
            Param::Single(value) => Some(value),
            Param::Missing | Param::Repeated => None,
        };

        Self::new(entity_id, check_in, check_out)
    }
}

pub struct AvailabilityService {
    synthesizer: AvailabilitySynthesizer,
    latency: Duration,
}

impl AvailabilityService {
    pub fn new(synthesizer: AvailabilitySynthesizer) -> Self {
        Self {
            synthesizer,
            latency: Duration::ZERO,
        }
    }

    // Simulated booking-backend latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn synthesizer(&self) -> &AvailabilitySynthesizer {
        &self.synthesizer
    }

    pub async fn check(&self, query: &AvailabilityQuery) -> AvailabilityRecord {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let record = self
            .synthesizer
            .synthesize_for(&query.entity_id, &[], query.dates);
        debug!(
            entity_id = %query.entity_id,
            available = record.available(),
            site_types = record.site_types().len(),
            "synthesized availability"
        );
        record
    }
}

impl Default for AvailabilityService {
    fn default() -> Self {
        Self::new(AvailabilitySynthesizer::default())
    }
}
