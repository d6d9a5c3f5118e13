// PharmaLens - core/views.rs
//
// View adapters: shape a filtered subset into what each dashboard view
// draws (map markers, list cards, chart series, KPI tiles).
// Core layer: pure transforms, inputs are never mutated.

use crate::core::aggregate::{ReviewSummary, TopPlace};
use crate::core::model::{MarkerColour, Pharmacy, PharmacyId, Review, ReviewBand};
use crate::util::constants;
use crate::util::error::AggregateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder shown wherever a statistic has no underlying reviews.
pub const NO_DATA: &str = "no data";

// =============================================================================
// Review digest
// =============================================================================

/// Count and mean of the filtered reviews attached to one pharmacy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReviewDigest {
    pub count: usize,
    pub mean_rating: Option<f64>,
}

impl ReviewDigest {
    fn of(reviews: &[&Review]) -> Self {
        let mean_rating = if reviews.is_empty() {
            None
        } else {
            Some(reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64)
        };
        Self {
            count: reviews.len(),
            mean_rating,
        }
    }

    /// e.g. "3 reviews, mean 4.3" or "no data".
    pub fn label(&self) -> String {
        match self.mean_rating {
            Some(mean) => format!(
                "{} review{}, mean {mean:.1}",
                self.count,
                if self.count == 1 { "" } else { "s" }
            ),
            None => NO_DATA.to_string(),
        }
    }
}

/// Filtered reviews grouped by pharmacy, keeping their input order.
fn group_reviews<'a>(reviews: &[&'a Review]) -> HashMap<&'a PharmacyId, Vec<&'a Review>> {
    let mut grouped: HashMap<&PharmacyId, Vec<&Review>> = HashMap::new();
    for &r in reviews {
        grouped.entry(&r.pharmacy_id).or_default().push(r);
    }
    grouped
}

/// `tel:` URI from a free-form phone number; only `+` and digits are kept.
fn phone_link(contact: &str) -> Option<String> {
    let number: String = contact
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    (!number.is_empty()).then(|| format!("tel:{number}"))
}

// =============================================================================
// Map
// =============================================================================

/// Content of a marker's popup card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPopup {
    pub name: String,
    pub address: String,
    pub average_rating: f64,
    /// Average rating formatted to one decimal place.
    pub rating: String,
    pub total_reviews: u32,
    pub phone_link: Option<String>,
    pub reviews: ReviewDigest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub pharmacy_id: PharmacyId,
    pub latitude: f64,
    pub longitude: f64,
    /// Hover label.
    pub label: String,
    pub colour: MarkerColour,
    pub popup: MarkerPopup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// (latitude, longitude) the view is centred on.
    pub centre: (f64, f64),
    /// Markers in input order; later markers are drawn on top.
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// Bounding box `(min_lat, min_lon, max_lat, max_lon)` of all markers.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.markers.first()?;
        let init = (first.latitude, first.longitude, first.latitude, first.longitude);
        Some(self.markers.iter().fold(init, |(a, b, c, d), m| {
            (
                a.min(m.latitude),
                b.min(m.longitude),
                c.max(m.latitude),
                d.max(m.longitude),
            )
        }))
    }
}

/// One marker per pharmacy, centred on the mean coordinate.
pub fn map_markers(pharmacies: &[&Pharmacy], reviews: &[&Review]) -> MapView {
    let grouped = group_reviews(reviews);

    let markers: Vec<MapMarker> = pharmacies
        .iter()
        .map(|p| {
            let related = grouped.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
            MapMarker {
                pharmacy_id: p.id.clone(),
                latitude: p.latitude,
                longitude: p.longitude,
                label: format!("{} ({:.1})", p.name, p.average_rating),
                colour: p.marker_colour,
                popup: MarkerPopup {
                    name: p.name.clone(),
                    address: p.address.clone(),
                    average_rating: p.average_rating,
                    rating: format!("{:.1}", p.average_rating),
                    total_reviews: p.total_reviews,
                    phone_link: phone_link(&p.contact),
                    reviews: ReviewDigest::of(related),
                },
            }
        })
        .collect();

    let centre = if markers.is_empty() {
        constants::DEFAULT_MAP_CENTRE
    } else {
        let n = markers.len() as f64;
        (
            markers.iter().map(|m| m.latitude).sum::<f64>() / n,
            markers.iter().map(|m| m.longitude).sum::<f64>() / n,
        )
    };

    MapView { centre, markers }
}

// =============================================================================
// List
// =============================================================================

/// Ordering of the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListSort {
    #[default]
    RatingDesc,
    ReviewsDesc,
    Rank,
    Name,
    SourceOrder,
}

impl ListSort {
    pub fn all() -> &'static [ListSort] {
        &[
            ListSort::RatingDesc,
            ListSort::ReviewsDesc,
            ListSort::Rank,
            ListSort::Name,
            ListSort::SourceOrder,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListSort::RatingDesc => "Best rated",
            ListSort::ReviewsDesc => "Most reviewed",
            ListSort::Rank => "Overall rank",
            ListSort::Name => "Name",
            ListSort::SourceOrder => "Source order",
        }
    }
}

/// A review as shown inside a list card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewLine {
    pub timestamp: DateTime<Utc>,
    pub rating: f64,
    pub reviewer: String,
    pub text: String,
}

/// One pharmacy card of the list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    pub pharmacy_id: PharmacyId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub average_rating: f64,
    pub stars: u8,
    pub total_reviews: u32,
    pub review_band: ReviewBand,
    pub rank: u32,
    pub phone_link: Option<String>,
    pub digest: ReviewDigest,
    /// Related filtered reviews, chronological.
    pub reviews: Vec<ReviewLine>,
}

/// One row per pharmacy with its related reviews, ordered by `sort`.
/// All orderings are stable: ties keep input order.
pub fn list_rows(pharmacies: &[&Pharmacy], reviews: &[&Review], sort: ListSort) -> Vec<ListRow> {
    let grouped = group_reviews(reviews);

    let mut ordered: Vec<&Pharmacy> = pharmacies.to_vec();
    match sort {
        ListSort::RatingDesc => {
            ordered.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating))
        }
        ListSort::ReviewsDesc => ordered.sort_by(|a, b| b.total_reviews.cmp(&a.total_reviews)),
        ListSort::Rank => ordered.sort_by_key(|p| p.rank),
        ListSort::Name => ordered.sort_by_cached_key(|p| p.name.to_lowercase()),
        ListSort::SourceOrder => {}
    }

    ordered
        .into_iter()
        .map(|p| {
            let related = grouped.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
            let mut lines: Vec<ReviewLine> = related
                .iter()
                .map(|r| ReviewLine {
                    timestamp: r.timestamp,
                    rating: r.rating,
                    reviewer: r.reviewer.clone(),
                    text: r.text.clone(),
                })
                .collect();
            lines.sort_by_key(|l| l.timestamp);
            ListRow {
                pharmacy_id: p.id.clone(),
                name: p.name.clone(),
                address: p.address.clone(),
                city: p.city.clone(),
                average_rating: p.average_rating,
                stars: p.stars,
                total_reviews: p.total_reviews,
                review_band: p.review_band,
                rank: p.rank,
                phone_link: phone_link(&p.contact),
                digest: ReviewDigest::of(related),
                reviews: lines,
            }
        })
        .collect()
}

// =============================================================================
// Charts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(String, f64)>,
}

impl ChartSeries {
    fn new(title: &str, x_label: &str, y_label: &str, points: Vec<(String, f64)>) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points,
        }
    }

    /// Largest y value, 0.0 for an empty series.
    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|(_, y)| *y).fold(0.0, f64::max)
    }
}

/// Every chart on the Reviews Analysis page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub volume: ChartSeries,
    pub ratings: ChartSeries,
    pub by_quarter: ChartSeries,
    pub by_month: ChartSeries,
    pub lengths: ChartSeries,
}

impl ChartSet {
    /// Charts in page order.
    pub fn iter(&self) -> impl Iterator<Item = &ChartSeries> {
        [
            &self.volume,
            &self.ratings,
            &self.by_quarter,
            &self.by_month,
            &self.lengths,
        ]
        .into_iter()
    }
}

pub fn chart_series(summary: &ReviewSummary) -> ChartSet {
    let volume = summary
        .series
        .iter()
        .map(|p| (p.label.clone(), p.count as f64))
        .collect();
    let ratings = summary
        .histogram
        .iter()
        .map(|(stars, count)| (format!("{stars}★"), count as f64))
        .collect();
    let by_quarter = summary
        .by_quarter
        .iter()
        .map(|p| (p.label.clone(), p.average))
        .collect();
    let by_month = summary
        .by_month
        .iter()
        .map(|p| (p.label.clone(), p.average))
        .collect();
    let lengths = summary
        .length_distribution
        .iter()
        .map(|b| (format!("{}-{}", b.from_words, b.to_words), b.count as f64))
        .collect();

    ChartSet {
        volume: ChartSeries::new(
            &format!("Reviews per {}", summary.granularity.label().to_lowercase()),
            summary.granularity.label(),
            "Reviews",
            volume,
        ),
        ratings: ChartSeries::new("Rating distribution", "Rating", "Reviews", ratings),
        by_quarter: ChartSeries::new("Average rating by quarter", "Quarter", "Rating", by_quarter),
        by_month: ChartSeries::new("Average rating by month", "Month", "Rating", by_month),
        lengths: ChartSeries::new("Review length", "Words", "Reviews", lengths),
    }
}

// =============================================================================
// KPIs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kpi {
    pub label: &'static str,
    pub value: String,
}

const KPI_LABELS: [&str; 5] = [
    "Reviews",
    "Average rating",
    "Years covered",
    "Reviews per year",
    "Share of all reviews",
];

/// KPI tiles; every value reads "no data" when the subset is empty.
pub fn kpis(summary: Result<&ReviewSummary, &AggregateError>) -> Vec<Kpi> {
    let values: [String; 5] = match summary {
        Ok(s) => [
            s.total.to_string(),
            format!("{:.2}", s.mean_rating),
            s.distinct_years.to_string(),
            format!("{:.1}", s.yearly_review_rate),
            format!("{:.1}%", s.review_share_pct),
        ],
        Err(AggregateError::EmptySet) => std::array::from_fn(|_| NO_DATA.to_string()),
    };
    KPI_LABELS
        .into_iter()
        .zip(values)
        .map(|(label, value)| Kpi { label, value })
        .collect()
}

/// Rows for the "top performing places" table.
pub fn top_place_rows(places: &[TopPlace]) -> Vec<(String, String, String)> {
    places
        .iter()
        .map(|t| {
            (
                t.name.clone(),
                format!("{:.1}", t.average_rating),
                t.total_reviews.to_string(),
            )
        })
        .collect()
}
