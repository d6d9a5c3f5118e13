// PharmaLens - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a pharmacy listing.
///
/// Source datasets carry ids as numbers or strings; both are normalised to
/// text at load time (`12.0` and `"12"` become the same id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PharmacyId(pub String);

impl PharmacyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PharmacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PharmacyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a review record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub String);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Pharmacy
// =============================================================================

/// A pharmacy listing, validated and enriched at load time.
///
/// Immutable after load. Everything downstream of the loader works on
/// borrows of these records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pharmacy {
    pub id: PharmacyId,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,

    /// Aggregate rating published with the listing (0.0-5.0).
    pub average_rating: f64,

    /// Review count published with the listing. Independent of how many
    /// review records the review dataset actually holds.
    pub total_reviews: u32,

    /// Phone number reduced to its digits.
    pub contact: String,

    pub created_at: Option<DateTime<Utc>>,

    // -- Derived at load --
    /// Locality parsed from the address.
    pub city: String,

    pub review_band: ReviewBand,

    pub marker_colour: MarkerColour,

    /// `floor(average_rating)`, used by the star-rating filter.
    pub stars: u8,

    /// Combined popularity/quality rank over the whole table (1 = best).
    pub rank: u32,
}

// =============================================================================
// Review
// =============================================================================

/// A single customer review, validated at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub pharmacy_id: PharmacyId,

    /// Star rating in 1.0..=5.0.
    pub rating: f64,

    pub text: String,

    /// Display name of the reviewer (may be empty).
    pub reviewer: String,

    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Review band
// =============================================================================

/// Bucket of a pharmacy's published review count, used by the list-view
/// "reviewers" filter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ReviewBand {
    #[default]
    UpTo50,
    From50To100,
    From100To200,
    MoreThan200,
}

impl ReviewBand {
    /// Returns all variants in display order.
    pub fn all() -> &'static [ReviewBand] {
        &[
            ReviewBand::UpTo50,
            ReviewBand::From50To100,
            ReviewBand::From100To200,
            ReviewBand::MoreThan200,
        ]
    }

    /// Classify a review count.
    ///
    /// Boundaries: 50 and 100 belong to the lower band, 200 to the top band.
    pub fn from_count(total_reviews: u32) -> Self {
        match total_reviews {
            n if n >= 200 => ReviewBand::MoreThan200,
            n if n > 100 => ReviewBand::From100To200,
            n if n > 50 => ReviewBand::From50To100,
            _ => ReviewBand::UpTo50,
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ReviewBand::UpTo50 => "Up to 50",
            ReviewBand::From50To100 => "50 to 100",
            ReviewBand::From100To200 => "100 to 200",
            ReviewBand::MoreThan200 => "More than 200",
        }
    }
}

impl fmt::Display for ReviewBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Marker colour
// =============================================================================

/// Map marker colour, graded by published review volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerColour {
    Green,
    Orange,
    LightGray,
    Red,
}

impl MarkerColour {
    pub fn from_count(total_reviews: u32) -> Self {
        if total_reviews >= constants::MARKER_GREEN_MIN_REVIEWS {
            MarkerColour::Green
        } else if total_reviews >= constants::MARKER_ORANGE_MIN_REVIEWS {
            MarkerColour::Orange
        } else if total_reviews >= constants::MARKER_GRAY_MIN_REVIEWS {
            MarkerColour::LightGray
        } else {
            MarkerColour::Red
        }
    }
}

// =============================================================================
// Data set
// =============================================================================

/// Counters describing what the loader dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Reviews whose pharmacy reference did not resolve.
    pub orphan_reviews: usize,

    /// Pharmacy records that failed schema validation.
    pub rejected_pharmacies: usize,

    /// Review records that failed schema validation.
    pub rejected_reviews: usize,

    /// Pharmacy records whose id repeated an earlier record.
    pub duplicate_pharmacies: usize,
}

impl LoadReport {
    /// True when nothing was dropped.
    pub fn is_clean(&self) -> bool {
        *self == LoadReport::default()
    }
}

/// The two validated base tables plus the load report.
///
/// Loaded once per session and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    /// Pharmacies in source order.
    pub pharmacies: Vec<Pharmacy>,

    /// Reviews sorted chronologically; ties keep source order.
    pub reviews: Vec<Review>,

    pub report: LoadReport,
}

impl DataSet {
    /// Look up a pharmacy by id.
    pub fn pharmacy(&self, id: &PharmacyId) -> Option<&Pharmacy> {
        self.pharmacies.iter().find(|p| &p.id == id)
    }

    /// Distinct cities in first-seen order.
    pub fn cities(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for p in &self.pharmacies {
            if !seen.contains(&p.city.as_str()) {
                seen.push(&p.city);
            }
        }
        seen
    }

    /// Earliest and latest review timestamps, if any reviews exist.
    pub fn review_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        // Reviews are sorted at load, so first/last are the extremes.
        Some((self.reviews.first()?.timestamp, self.reviews.last()?.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_band_boundaries() {
        assert_eq!(ReviewBand::from_count(0), ReviewBand::UpTo50);
        assert_eq!(ReviewBand::from_count(50), ReviewBand::UpTo50);
        assert_eq!(ReviewBand::from_count(51), ReviewBand::From50To100);
        assert_eq!(ReviewBand::from_count(100), ReviewBand::From50To100);
        assert_eq!(ReviewBand::from_count(101), ReviewBand::From100To200);
        assert_eq!(ReviewBand::from_count(199), ReviewBand::From100To200);
        assert_eq!(ReviewBand::from_count(200), ReviewBand::MoreThan200);
    }

    #[test]
    fn test_marker_colour_thresholds() {
        assert_eq!(MarkerColour::from_count(150), MarkerColour::Green);
        assert_eq!(MarkerColour::from_count(100), MarkerColour::Green);
        assert_eq!(MarkerColour::from_count(99), MarkerColour::Orange);
        assert_eq!(MarkerColour::from_count(25), MarkerColour::LightGray);
        assert_eq!(MarkerColour::from_count(24), MarkerColour::Red);
    }

    #[test]
    fn test_load_report_clean() {
        assert!(LoadReport::default().is_clean());
        let report = LoadReport {
            orphan_reviews: 1,
            ..Default::default()
        };
        assert!(!report.is_clean());
    }
}
