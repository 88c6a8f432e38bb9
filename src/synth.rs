// Availability synthesis: believable booking data without a booking backend
// Every output is a pure function of the entity id, the labels and the stay dates

use chrono::{NaiveDate, Utc};
use serde::Serialize;

pub const SITE_TYPE_TEMPLATES: [&str; 7] = [
    "RV Site (Full Hookup)",
    "RV Site (Water & Electric)",
    "Tent Site",
    "Cabin",
    "Glamping Tent",
    "RV Site (Electric Only)",
    "Primitive Camping",
];

// Share of draws in 0..=100 that count as "available"
const AVAILABILITY_THRESHOLD: u32 = 30;

// Offset bases for template mode, kept apart so the streams do not overlap
const TEMPLATE_COUNT_OFFSET: u64 = 0;
const TEMPLATE_INDEX_OFFSET: u64 = 1_000;
const TEMPLATE_PRICE_OFFSET: u64 = 2_000;
const TEMPLATE_AVAILABILITY_OFFSET: u64 = 3_000;

// Rejection draws per slot before falling back to the first unused template
const MAX_INDEX_ATTEMPTS: u64 = 64;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic generator keyed by `(seed, offset)`.
///
/// Each draw runs the splitmix64 finaliser over `seed + (offset + 1) * γ`,
/// so nearby seeds and offsets land far apart and the same pair always
/// yields the same number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededDraw {
    seed: u64,
}

impl SeededDraw {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    // Seed is the sum of the UTF-16 code units of the id
    pub fn from_entity_id(entity_id: &str) -> Self {
        Self::new(entity_id.encode_utf16().map(u64::from).sum())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u64(&self, offset: u64) -> u64 {
        let mut z = self
            .seed
            .wrapping_add(offset.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    // Inclusive range; an empty or inverted range yields `min`
    pub fn draw(&self, min: u32, max: u32, offset: u64) -> u32 {
        if max <= min {
            return min;
        }
        let span = u64::from(max - min) + 1;
        min + (self.next_u64(offset) % span) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteTypeRecord {
    pub name: String,
    pub price: u32,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayDates {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayDates {
    // None unless check-out is strictly after check-in
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_out > check_in).then_some(Self {
            check_in,
            check_out,
        })
    }

    pub fn one_night(check_in: NaiveDate) -> Option<Self> {
        check_in.succ_opt().and_then(|out| Self::new(check_in, out))
    }

    // Today in UTC through tomorrow
    pub fn tonight() -> Self {
        let today = Utc::now().date_naive();
        Self::one_night(today).unwrap_or(Self {
            check_in: today,
            check_out: today,
        })
    }
}

/// Availability answer for one entity and stay.
///
/// Every field is fixed at construction and only readable afterwards;
/// `available` is computed there, so it always equals "any site type is
/// available".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRecord {
    available: bool,
    site_types: Vec<SiteTypeRecord>,
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl AvailabilityRecord {
    pub fn new(site_types: Vec<SiteTypeRecord>, dates: StayDates) -> Self {
        Self {
            available: site_types.iter().any(|s| s.available),
            site_types,
            check_in: dates.check_in,
            check_out: dates.check_out,
        }
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn site_types(&self) -> &[SiteTypeRecord] {
        &self.site_types
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn into_site_types(self) -> Vec<SiteTypeRecord> {
        self.site_types
    }
}

pub struct AvailabilitySynthesizer {
    templates: Vec<String>,
}

impl Default for AvailabilitySynthesizer {
    fn default() -> Self {
        Self::with_templates(SITE_TYPE_TEMPLATES.iter().map(|s| s.to_string()).collect())
    }
}

impl AvailabilitySynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: Vec<String>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Synthesizes availability for tonight.
    pub fn synthesize(&self, entity_id: &str, labels: &[String]) -> AvailabilityRecord {
        self.synthesize_for(entity_id, labels, StayDates::tonight())
    }

    /// Label-driven when `labels` is non-empty, template mode otherwise.
    pub fn synthesize_for(
        &self,
        entity_id: &str,
        labels: &[String],
        dates: StayDates,
    ) -> AvailabilityRecord {
        let rng = SeededDraw::from_entity_id(entity_id);
        let site_types = if labels.is_empty() {
            self.template_site_types(&rng)
        } else {
            Self::labelled_site_types(&rng, labels)
        };
        AvailabilityRecord::new(site_types, dates)
    }

    // One entry per label, in label order
    fn labelled_site_types(rng: &SeededDraw, labels: &[String]) -> Vec<SiteTypeRecord> {
        labels
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let index = index as u64;
                SiteTypeRecord {
                    name: name.clone(),
                    price: rng.draw(40, 150, index * 100),
                    available: rng.draw(0, 100, index * 200) > AVAILABILITY_THRESHOLD,
                }
            })
            .collect()
    }

    // 3 to 5 distinct templates, capped at the pool size
    fn template_site_types(&self, rng: &SeededDraw) -> Vec<SiteTypeRecord> {
        if self.templates.is_empty() {
            return Vec::new();
        }

        let pool_max = (self.templates.len() - 1) as u32;
        let count = (rng.draw(3, 5, TEMPLATE_COUNT_OFFSET) as usize).min(self.templates.len());

        let mut chosen: Vec<usize> = Vec::with_capacity(count);
        let mut attempt = 0u64;
        for slot in 0..count {
            let mut picked = None;
            for _ in 0..MAX_INDEX_ATTEMPTS {
                let index = rng.draw(0, pool_max, TEMPLATE_INDEX_OFFSET + attempt) as usize;
                attempt += 1;
                if !chosen.contains(&index) {
                    picked = Some(index);
                    break;
                }
            }
            let index = picked.unwrap_or_else(|| {
                (0..self.templates.len())
                    .find(|i| !chosen.contains(i))
                    .unwrap_or(slot)
            });
            chosen.push(index);
        }

        chosen
            .into_iter()
            .enumerate()
            .map(|(slot, index)| {
                let slot = slot as u64;
                SiteTypeRecord {
                    name: self.templates[index].clone(),
                    price: rng.draw(30, 150, TEMPLATE_PRICE_OFFSET + slot * 100),
                    available: rng.draw(0, 100, TEMPLATE_AVAILABILITY_OFFSET + slot * 200)
                        > AVAILABILITY_THRESHOLD,
                }
            })
            .collect()
    }
}
