// PharmaLens - core/filter.rs
//
// Composable filter engine for pharmacies and reviews.
// All active constraints are AND-combined.
// Core layer: pure logic, no I/O or UI dependencies.

use crate::core::model::{DataSet, Pharmacy, PharmacyId, Review, ReviewBand};
use crate::util::constants;
use crate::util::error::FilterError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// User-selected filter constraints. Absent / empty fields mean
/// "no constraint".
///
/// This is the raw, serialisable form edited by the UI and persisted with
/// the session. It must pass [`FilterPredicate::validate`] before the engine
/// will use it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPredicate {
    /// Lowest pharmacy average rating (inclusive).
    pub rating_min: Option<f64>,

    /// Highest pharmacy average rating (inclusive).
    pub rating_max: Option<f64>,

    /// First review date (inclusive, UTC calendar date).
    pub date_start: Option<NaiveDate>,

    /// Last review date (inclusive, UTC calendar date).
    pub date_end: Option<NaiveDate>,

    /// Case-insensitive substring matched against pharmacy name and address.
    pub text: String,

    /// Restrict to one pharmacy.
    pub pharmacy_id: Option<PharmacyId>,

    /// Star buckets (`floor(average_rating)`) to include (empty = all).
    pub stars: BTreeSet<u8>,

    /// Review-count bands to include (empty = all).
    pub review_bands: BTreeSet<ReviewBand>,

    /// Cities to include (empty = all).
    pub cities: BTreeSet<String>,

    /// Regex matched against review text. Empty = no regex filter.
    pub review_regex: String,
}

impl FilterPredicate {
    /// Returns true if no constraints are active.
    pub fn is_empty(&self) -> bool {
        self.rating_min.is_none()
            && self.rating_max.is_none()
            && self.date_start.is_none()
            && self.date_end.is_none()
            && self.text.trim().is_empty()
            && self.pharmacy_id.is_none()
            && self.stars.is_empty()
            && self.review_bands.is_empty()
            && self.cities.is_empty()
            && self.review_regex.is_empty()
    }

    /// Check bounds and compile the review regex.
    ///
    /// Rejects inverted ranges (`max < min`), rating bounds that are not
    /// finite or fall outside the rating scale, and invalid regex patterns.
    pub fn validate(&self) -> Result<ValidPredicate, FilterError> {
        for (name, bound) in [("rating_min", self.rating_min), ("rating_max", self.rating_max)] {
            if let Some(v) = bound {
                if !v.is_finite() || !(0.0..=constants::MAX_RATING).contains(&v) {
                    return Err(FilterError::InvalidPredicate {
                        reason: format!(
                            "{name} = {v} is outside the rating scale 0-{}",
                            constants::MAX_RATING
                        ),
                    });
                }
            }
        }
        if let (Some(min), Some(max)) = (self.rating_min, self.rating_max) {
            if max < min {
                return Err(FilterError::InvalidPredicate {
                    reason: format!("rating range is inverted ({min} > {max})"),
                });
            }
        }
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if end < start {
                return Err(FilterError::InvalidPredicate {
                    reason: format!("date range is inverted ({start} > {end})"),
                });
            }
        }

        let review_regex = if self.review_regex.is_empty() {
            None
        } else {
            Some(
                Regex::new(&self.review_regex).map_err(|e| FilterError::InvalidRegex {
                    pattern: self.review_regex.clone(),
                    source: e,
                })?,
            )
        };

        Ok(ValidPredicate {
            text_lower: self.text.trim().to_lowercase(),
            review_regex,
            predicate: self.clone(),
        })
    }

    /// Quick filter: well-rated pharmacies (4 stars and up).
    pub fn well_rated() -> Self {
        Self {
            rating_min: Some(4.0),
            ..Default::default()
        }
    }

    /// Quick filter: a single pharmacy.
    pub fn only_pharmacy(id: PharmacyId) -> Self {
        Self {
            pharmacy_id: Some(id),
            ..Default::default()
        }
    }
}

/// A predicate that passed validation, with its derived matchers prepared.
///
/// Only obtainable through [`FilterPredicate::validate`], so the engine
/// never sees inverted bounds.
#[derive(Debug, Clone)]
pub struct ValidPredicate {
    predicate: FilterPredicate,
    text_lower: String,
    review_regex: Option<Regex>,
}

impl ValidPredicate {
    /// The raw predicate this was built from.
    pub fn predicate(&self) -> &FilterPredicate {
        &self.predicate
    }
}

impl Default for ValidPredicate {
    fn default() -> Self {
        Self {
            predicate: FilterPredicate::default(),
            text_lower: String::new(),
            review_regex: None,
        }
    }
}

/// Result of filtering: indices into the base tables, in base order.
///
/// Indices avoid copying records and let each view borrow straight from
/// the `DataSet`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    pub pharmacies: Vec<usize>,
    pub reviews: Vec<usize>,
}

impl FilteredView {
    /// Borrow the surviving pharmacies.
    pub fn pharmacies<'a>(&self, data: &'a DataSet) -> Vec<&'a Pharmacy> {
        self.pharmacies
            .iter()
            .filter_map(|&i| data.pharmacies.get(i))
            .collect()
    }

    /// Borrow the surviving reviews.
    pub fn reviews<'a>(&self, data: &'a DataSet) -> Vec<&'a Review> {
        self.reviews
            .iter()
            .filter_map(|&i| data.reviews.get(i))
            .collect()
    }
}

/// Apply a validated predicate to both base tables.
///
/// A pharmacy survives when it satisfies every pharmacy-level constraint.
/// A review survives when its pharmacy survives and it satisfies the date
/// range and review regex. Output order is base order; the function is
/// deterministic and idempotent.
pub fn apply(data: &DataSet, filter: &ValidPredicate) -> FilteredView {
    if filter.predicate.is_empty() {
        return FilteredView {
            pharmacies: (0..data.pharmacies.len()).collect(),
            reviews: (0..data.reviews.len()).collect(),
        };
    }

    let pharmacies: Vec<usize> = data
        .pharmacies
        .iter()
        .enumerate()
        .filter(|(_, p)| pharmacy_matches(p, filter))
        .map(|(idx, _)| idx)
        .collect();

    let surviving: HashSet<&PharmacyId> = pharmacies
        .iter()
        .map(|&i| &data.pharmacies[i].id)
        .collect();

    let reviews = data
        .reviews
        .iter()
        .enumerate()
        .filter(|(_, r)| surviving.contains(&r.pharmacy_id) && review_matches(r, filter))
        .map(|(idx, _)| idx)
        .collect();

    FilteredView {
        pharmacies,
        reviews,
    }
}

/// Check a pharmacy against all pharmacy-level constraints.
pub fn pharmacy_matches(pharmacy: &Pharmacy, filter: &ValidPredicate) -> bool {
    let p = &filter.predicate;

    if let Some(min) = p.rating_min {
        if pharmacy.average_rating < min {
            return false;
        }
    }
    if let Some(max) = p.rating_max {
        if pharmacy.average_rating > max {
            return false;
        }
    }

    if let Some(ref id) = p.pharmacy_id {
        if &pharmacy.id != id {
            return false;
        }
    }

    if !p.stars.is_empty() && !p.stars.contains(&pharmacy.stars) {
        return false;
    }
    if !p.review_bands.is_empty() && !p.review_bands.contains(&pharmacy.review_band) {
        return false;
    }
    if !p.cities.is_empty() && !p.cities.contains(&pharmacy.city) {
        return false;
    }

    // Text search (case-insensitive substring on name or address)
    if !filter.text_lower.is_empty()
        && !pharmacy.name.to_lowercase().contains(&filter.text_lower)
        && !pharmacy.address.to_lowercase().contains(&filter.text_lower)
    {
        return false;
    }

    true
}

/// Check a review against the review-level constraints (date range, regex).
/// Pharmacy membership is checked by [`apply`].
pub fn review_matches(review: &Review, filter: &ValidPredicate) -> bool {
    let p = &filter.predicate;
    let date = review.timestamp.date_naive();

    if let Some(start) = p.date_start {
        if date < start {
            return false;
        }
    }
    if let Some(end) = p.date_end {
        if date > end {
            return false;
        }
    }

    if let Some(ref regex) = filter.review_regex {
        if !regex.is_match(&review.text) {
            return false;
        }
    }

    true
}
