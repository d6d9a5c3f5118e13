// PharmaLens - core/aggregate.rs
//
// Review statistics over a filtered subset: KPIs, rating histogram,
// review volume over time and the secondary analyses shown on the
// Reviews Analysis page.
// Core layer: pure functions over borrowed records.

use crate::core::model::{Pharmacy, PharmacyId, Review};
use crate::util::constants;
use crate::util::error::AggregateError;
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// =============================================================================
// Granularity
// =============================================================================

/// Bucket size of the review-volume time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    #[default]
    Month,
}

impl Granularity {
    /// Returns all variants in display order.
    pub fn all() -> &'static [Granularity] {
        &[Granularity::Day, Granularity::Week, Granularity::Month]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Day => "Day",
            Granularity::Week => "Week",
            Granularity::Month => "Month",
        }
    }

    /// Parse a config / CLI value ("day", "week", "month").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Some(Granularity::Day),
            "week" | "weekly" => Some(Granularity::Week),
            "month" | "monthly" => Some(Granularity::Month),
            _ => None,
        }
    }

    /// First day of the period containing `date`. Weeks start on Monday.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => date
                .checked_sub_days(Days::new(u64::from(
                    date.weekday().num_days_from_monday(),
                )))
                .unwrap_or(date),
            Granularity::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// First day of the period after the one starting at `start`.
    fn next_period(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Day => start.succ_opt(),
            Granularity::Week => start.checked_add_days(Days::new(7)),
            Granularity::Month => {
                if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
                }
            }
        }
    }

    /// Axis label for a period.
    pub fn period_label(&self, start: NaiveDate) -> String {
        match self {
            Granularity::Day => start.format("%Y-%m-%d").to_string(),
            Granularity::Week => {
                let iso = start.iso_week();
                format!("{}-W{:02}", iso.year(), iso.week())
            }
            Granularity::Month => start.format("%b %Y").to_string(),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Result types
// =============================================================================

/// Review counts per whole-star bucket 1..=5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingHistogram {
    /// `counts[0]` is the 1-star bucket, `counts[4]` the 5-star bucket.
    pub counts: [usize; 5],
}

impl RatingHistogram {
    /// Count for a star bucket (1..=5); 0 for anything else.
    pub fn get(&self, stars: u8) -> usize {
        match stars {
            1..=5 => self.counts[usize::from(stars) - 1],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `(stars, count)` pairs from 1 to 5.
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as u8 + 1, c))
    }
}

/// Review count for one time period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCount {
    pub period_start: NaiveDate,
    pub label: String,
    pub count: usize,
}

/// Average rating for one calendar period (quarter or month).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAverage {
    pub year: i32,
    /// Quarter (1-4) or month (1-12), depending on the series.
    pub period: u32,
    pub label: String,
    pub average: f64,
    pub count: usize,
}

/// Reviews whose word count falls in `[from_words, to_words]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LengthBucket {
    pub from_words: usize,
    pub to_words: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// A pharmacy in the top-performing ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPlace {
    pub pharmacy_id: PharmacyId,
    pub name: String,
    pub average_rating: f64,
    pub total_reviews: u32,
}

/// Tunables for [`summarise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub granularity: Granularity,
    pub length_bucket_words: usize,
    pub frequent_terms: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            length_bucket_words: constants::DEFAULT_LENGTH_BUCKET_WORDS,
            frequent_terms: constants::DEFAULT_FREQUENT_TERMS,
        }
    }
}

/// Everything the Reviews Analysis page shows for one filtered subset.
/// Recomputed on every render; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub total: usize,
    pub mean_rating: f64,
    pub histogram: RatingHistogram,
    pub granularity: Granularity,
    pub series: Vec<PeriodCount>,

    /// Number of distinct calendar years covered by the subset.
    pub distinct_years: usize,

    /// Reviews per covered year.
    pub yearly_review_rate: f64,

    /// Subset size as a percentage of all loaded reviews.
    pub review_share_pct: f64,

    pub by_quarter: Vec<PeriodAverage>,
    pub by_month: Vec<PeriodAverage>,
    pub length_distribution: Vec<LengthBucket>,
    pub frequent_terms: Vec<TermCount>,
}

// =============================================================================
// Core statistics
// =============================================================================

pub fn total_count(reviews: &[&Review]) -> usize {
    reviews.len()
}

/// Arithmetic mean of the ratings. `EmptySet` for an empty subset.
pub fn mean_rating(reviews: &[&Review]) -> Result<f64, AggregateError> {
    if reviews.is_empty() {
        return Err(AggregateError::EmptySet);
    }
    let sum: f64 = reviews.iter().map(|r| r.rating).sum();
    Ok(sum / reviews.len() as f64)
}

/// Whole-star bucket of a rating (rounded, clamped to 1..=5).
fn star_bucket(rating: f64) -> u8 {
    rating
        .round()
        .clamp(constants::MIN_REVIEW_RATING, constants::MAX_RATING) as u8
}

/// Histogram over buckets 1..=5. Bucket counts always sum to the subset size.
pub fn rating_histogram(reviews: &[&Review]) -> RatingHistogram {
    let mut hist = RatingHistogram::default();
    for r in reviews {
        hist.counts[usize::from(star_bucket(r.rating)) - 1] += 1;
    }
    hist
}

/// Review counts per period from the earliest to the latest review,
/// inclusive, with empty periods present as zero counts.
pub fn time_series(reviews: &[&Review], granularity: Granularity) -> Vec<PeriodCount> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for r in reviews {
        let start = granularity.period_start(r.timestamp.date_naive());
        *counts.entry(start).or_insert(0) += 1;
    }

    let (Some(&first), Some(&last)) = (counts.keys().next(), counts.keys().next_back()) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut period = Some(first);
    while let Some(start) = period {
        if start > last {
            break;
        }
        series.push(PeriodCount {
            period_start: start,
            label: granularity.period_label(start),
            count: counts.get(&start).copied().unwrap_or(0),
        });
        period = granularity.next_period(start);
    }
    series
}

// =============================================================================
// Secondary analyses
// =============================================================================

fn period_averages(
    reviews: &[&Review],
    key: impl Fn(NaiveDate) -> u32,
    label: impl Fn(i32, u32) -> String,
) -> Vec<PeriodAverage> {
    let mut groups: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for r in reviews {
        let date = r.timestamp.date_naive();
        let slot = groups.entry((date.year(), key(date))).or_insert((0.0, 0));
        slot.0 += r.rating;
        slot.1 += 1;
    }
    groups
        .into_iter()
        .map(|((year, period), (sum, count))| PeriodAverage {
            year,
            period,
            label: label(year, period),
            average: sum / count as f64,
            count,
        })
        .collect()
}

/// Average rating per (year, quarter), chronological.
pub fn average_by_quarter(reviews: &[&Review]) -> Vec<PeriodAverage> {
    period_averages(
        reviews,
        |d| (d.month() - 1) / 3 + 1,
        |year, q| format!("Q{q} {year}"),
    )
}

/// Average rating per (year, month), chronological.
pub fn average_by_month(reviews: &[&Review]) -> Vec<PeriodAverage> {
    period_averages(
        reviews,
        |d| d.month(),
        |year, month| {
            NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%b %Y").to_string())
                .unwrap_or_else(|| format!("{month:02}/{year}"))
        },
    )
}

/// Word-count distribution in contiguous buckets of `bucket_words` words.
pub fn review_length_histogram(reviews: &[&Review], bucket_words: usize) -> Vec<LengthBucket> {
    let width = bucket_words.max(1);
    let mut buckets: BTreeMap<usize, usize> = BTreeMap::new();
    for r in reviews {
        let words = r.text.split_whitespace().count();
        *buckets.entry(words / width).or_insert(0) += 1;
    }
    let (Some(&lo), Some(&hi)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };
    (lo..=hi)
        .map(|b| LengthBucket {
            from_words: b * width,
            to_words: b * width + width - 1,
            count: buckets.get(&b).copied().unwrap_or(0),
        })
        .collect()
}

/// Most frequent words across review texts.
///
/// Words are lower-cased alphabetic runs of at least `MIN_TERM_LENGTH`
/// characters, stop-words excluded. Ties are ordered alphabetically.
pub fn frequent_terms(reviews: &[&Review], limit: usize) -> Vec<TermCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for r in reviews {
        for word in r.text.split(|c: char| !c.is_alphabetic()) {
            if word.chars().count() < constants::MIN_TERM_LENGTH {
                continue;
            }
            let word = word.to_lowercase();
            if constants::STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }
    }
    let mut terms: Vec<TermCount> = counts
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    terms.truncate(limit);
    terms
}

/// Pharmacies with at least the mean published review count, best rated
/// first (ties: more reviews first, then input order).
pub fn top_performing(pharmacies: &[&Pharmacy], limit: usize) -> Vec<TopPlace> {
    if pharmacies.is_empty() {
        return Vec::new();
    }
    let mean_reviews = pharmacies
        .iter()
        .map(|p| f64::from(p.total_reviews))
        .sum::<f64>()
        / pharmacies.len() as f64;

    let mut eligible: Vec<&Pharmacy> = pharmacies
        .iter()
        .copied()
        .filter(|p| f64::from(p.total_reviews) >= mean_reviews)
        .collect();
    eligible.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| b.total_reviews.cmp(&a.total_reviews))
    });
    eligible
        .into_iter()
        .take(limit)
        .map(|p| TopPlace {
            pharmacy_id: p.id.clone(),
            name: p.name.clone(),
            average_rating: p.average_rating,
            total_reviews: p.total_reviews,
        })
        .collect()
}

// =============================================================================
// Summary
// =============================================================================

/// Compute the full analysis for a filtered review subset.
///
/// `base_total` is the size of the unfiltered review table, used for the
/// review-share KPI. Fails with `EmptySet` when the subset is empty.
pub fn summarise(
    reviews: &[&Review],
    base_total: usize,
    options: &AnalysisOptions,
) -> Result<ReviewSummary, AggregateError> {
    let mean = mean_rating(reviews)?;
    let total = total_count(reviews);

    let years: BTreeSet<i32> = reviews.iter().map(|r| r.timestamp.year()).collect();
    let distinct_years = years.len();

    let review_share_pct = if base_total == 0 {
        0.0
    } else {
        total as f64 / base_total as f64 * 100.0
    };

    Ok(ReviewSummary {
        total,
        mean_rating: mean,
        histogram: rating_histogram(reviews),
        granularity: options.granularity,
        series: time_series(reviews, options.granularity),
        distinct_years,
        yearly_review_rate: total as f64 / distinct_years.max(1) as f64,
        review_share_pct,
        by_quarter: average_by_quarter(reviews),
        by_month: average_by_month(reviews),
        length_distribution: review_length_histogram(reviews, options.length_bucket_words),
        frequent_terms: frequent_terms(reviews, options.frequent_terms),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{MarkerColour, ReviewBand, ReviewId};
    use chrono::{TimeZone, Utc};

    fn review(rating: f64, y: i32, m: u32, d: u32, text: &str) -> Review {
        Review {
            id: ReviewId(format!("{y}{m}{d}{rating}")),
            pharmacy_id: PharmacyId::from("p"),
            rating,
            text: text.to_string(),
            reviewer: String::new(),
            timestamp: Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap(),
        }
    }

    fn refs(reviews: &[Review]) -> Vec<&Review> {
        reviews.iter().collect()
    }

    #[test]
    fn test_mean_and_histogram() {
        let reviews = vec![
            review(2.0, 2023, 1, 1, ""),
            review(4.0, 2023, 1, 2, ""),
            review(4.0, 2023, 1, 3, ""),
            review(5.0, 2023, 1, 4, ""),
        ];
        let subset = refs(&reviews);
        assert_eq!(mean_rating(&subset).unwrap(), 3.75);

        let hist = rating_histogram(&subset);
        assert_eq!(hist.counts, [0, 1, 0, 2, 1]);
        assert_eq!(hist.get(4), 2);
        assert_eq!(hist.total(), subset.len());
    }

    #[test]
    fn test_empty_subset_is_empty_set_error() {
        assert_eq!(mean_rating(&[]), Err(AggregateError::EmptySet));
        assert_eq!(
            summarise(&[], 10, &AnalysisOptions::default()),
            Err(AggregateError::EmptySet)
        );
        assert_eq!(rating_histogram(&[]).total(), 0);
        assert!(time_series(&[], Granularity::Day).is_empty());
    }

    #[test]
    fn test_daily_series_has_no_gaps() {
        let reviews = vec![
            review(5.0, 2023, 1, 30, ""),
            review(3.0, 2023, 2, 2, ""),
            review(4.0, 2023, 1, 30, ""),
        ];
        let series = time_series(&refs(&reviews), Granularity::Day);
        // Jan 30 .. Feb 2 inclusive
        assert_eq!(series.len(), 4);
        let counts: Vec<usize> = series.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![2, 0, 0, 1]);
        assert_eq!(counts.iter().sum::<usize>(), reviews.len());
        assert_eq!(series[0].label, "2023-01-30");
    }

    #[test]
    fn test_weekly_series_starts_monday() {
        // 2023-03-01 is a Wednesday; 2023-03-15 a Wednesday two weeks later.
        let reviews = vec![review(5.0, 2023, 3, 1, ""), review(4.0, 2023, 3, 15, "")];
        let series = time_series(&refs(&reviews), Granularity::Week);
        assert_eq!(series.len(), 3);
        assert_eq!(
            series[0].period_start,
            NaiveDate::from_ymd_opt(2023, 2, 27).unwrap()
        );
        assert_eq!(series[0].label, "2023-W09");
        assert_eq!(series[1].count, 0);
    }

    #[test]
    fn test_monthly_series_crosses_year() {
        let reviews = vec![review(5.0, 2022, 11, 20, ""), review(4.0, 2023, 2, 3, "")];
        let series = time_series(&refs(&reviews), Granularity::Month);
        let labels: Vec<&str> = series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Nov 2022", "Dec 2022", "Jan 2023", "Feb 2023"]);
    }

    #[test]
    fn test_quarter_and_month_averages() {
        let reviews = vec![
            review(5.0, 2022, 2, 1, ""),
            review(3.0, 2022, 3, 1, ""),
            review(4.0, 2023, 11, 1, ""),
        ];
        let subset = refs(&reviews);
        let quarters = average_by_quarter(&subset);
        assert_eq!(quarters.len(), 2);
        assert_eq!(quarters[0].label, "Q1 2022");
        assert_eq!(quarters[0].average, 4.0);
        assert_eq!(quarters[1].period, 4);

        let months = average_by_month(&subset);
        assert_eq!(months.len(), 3);
        assert_eq!(months[2].label, "Nov 2023");
    }

    #[test]
    fn test_length_histogram_contiguous() {
        let reviews = vec![
            review(5.0, 2023, 1, 1, "one two"),
            review(4.0, 2023, 1, 1, "a b c d e f g h i j k"),
        ];
        let buckets = review_length_histogram(&refs(&reviews), 5);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 0);
        assert_eq!(buckets[2].from_words, 10);
        assert_eq!(buckets[2].to_words, 14);
    }

    #[test]
    fn test_frequent_terms() {
        let reviews = vec![
            review(5.0, 2023, 1, 1, "Friendly staff, very friendly!"),
            review(4.0, 2023, 1, 1, "Staff was quick and the wait short"),
        ];
        let terms = frequent_terms(&refs(&reviews), 3);
        assert_eq!(terms[0].term, "friendly");
        assert_eq!(terms[0].count, 2);
        assert_eq!(terms[1].term, "staff");
        // "was", "the", "and", "very" are stop-words; ties sort alphabetically.
        assert_eq!(terms[2].term, "quick");
    }

    #[test]
    fn test_summary_kpis() {
        let reviews = vec![
            review(4.0, 2021, 5, 1, ""),
            review(2.0, 2022, 5, 1, ""),
            review(3.0, 2022, 6, 1, ""),
        ];
        let summary = summarise(&refs(&reviews), 12, &AnalysisOptions::default()).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.mean_rating, 3.0);
        assert_eq!(summary.distinct_years, 2);
        assert_eq!(summary.yearly_review_rate, 1.5);
        assert_eq!(summary.review_share_pct, 25.0);
    }

    fn pharmacy(id: &str, rating: f64, total: u32) -> Pharmacy {
        Pharmacy {
            id: PharmacyId::from(id),
            name: id.to_uppercase(),
            address: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            average_rating: rating,
            total_reviews: total,
            contact: String::new(),
            created_at: None,
            city: String::new(),
            review_band: ReviewBand::from_count(total),
            marker_colour: MarkerColour::from_count(total),
            stars: rating as u8,
            rank: 0,
        }
    }

    #[test]
    fn test_top_performing_requires_mean_review_count() {
        let list = vec![
            pharmacy("a", 5.0, 2),
            pharmacy("b", 4.2, 300),
            pharmacy("c", 4.6, 150),
            pharmacy("d", 4.6, 200),
        ];
        let refs: Vec<&Pharmacy> = list.iter().collect();
        // mean = 163: "a" and "c" are below it.
        let top = top_performing(&refs, 10);
        let ids: Vec<&str> = top.iter().map(|t| t.pharmacy_id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b"]);
    }
}
