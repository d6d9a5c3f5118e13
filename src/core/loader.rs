// PharmaLens - core/loader.rs
//
// Dataset parsing and validation.
// Core layer: accepts file content, never touches the filesystem.
// I/O is handled by app::dataset which feeds content here.
//
// Loosely-typed source records (JSON objects, CSV rows) are coerced into
// the fixed `Pharmacy` / `Review` schema here. Records that cannot be
// coerced are quarantined and counted; they never travel downstream.

use crate::core::model::{
    DataSet, LoadReport, MarkerColour, Pharmacy, PharmacyId, Review, ReviewBand, ReviewId,
};
use crate::util::constants;
use crate::util::error::{LoadError, OrphanReferenceWarning};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;

// =============================================================================
// Input description
// =============================================================================

/// On-disk record format of a dataset source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Csv,
}

impl RecordFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(RecordFormat::Json),
            "csv" => Ok(RecordFormat::Csv),
            _ => Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: ext,
            }),
        }
    }
}

/// One dataset source handed to the loader.
#[derive(Debug, Clone)]
pub struct RecordInput {
    /// Path or label used in error messages.
    pub origin: String,
    pub format: RecordFormat,
    pub content: String,
}

impl RecordInput {
    pub fn json(origin: &str, content: impl Into<String>) -> Self {
        Self {
            origin: origin.to_string(),
            format: RecordFormat::Json,
            content: content.into(),
        }
    }

    pub fn csv(origin: &str, content: impl Into<String>) -> Self {
        Self {
            origin: origin.to_string(),
            format: RecordFormat::Csv,
            content: content.into(),
        }
    }
}

// =============================================================================
// Field aliases
// =============================================================================

// Accepted column names per schema field, first match wins. The camelCase
// names are the ones the listing scraper exports.
const PHARMACY_ID: &[&str] = &["id", "pharmacyId", "pharmacy_id"];
const PHARMACY_NAME: &[&str] = &["name", "title"];
const PHARMACY_ADDRESS: &[&str] = &["address"];
const LATITUDE: &[&str] = &["latitude", "lat"];
const LONGITUDE: &[&str] = &["longitude", "lng", "lon"];
const AVERAGE_RATING: &[&str] = &["averageRating", "average_rating"];
const TOTAL_REVIEWS: &[&str] = &["totalReviews", "total_reviews"];
const CONTACT: &[&str] = &["contact", "phone"];
const CREATED_AT: &[&str] = &["createdAt", "created_at"];

const REVIEW_ID: &[&str] = &["id", "reviewId", "review_id"];
const REVIEW_PHARMACY_ID: &[&str] = &["pharmacyId", "pharmacy_id", "placeId", "place_id"];
const REVIEW_PHARMACY_NAME: &[&str] = &["place_Name", "placeName", "pharmacy_name"];
const REVIEW_RATING: &[&str] = &["rating", "stars"];
const REVIEW_TEXT: &[&str] = &["text", "content"];
const REVIEWER: &[&str] = &["reviewer", "author"];
const REVIEW_TIME: &[&str] = &["datetime", "timestamp", "date"];

// =============================================================================
// Entry point
// =============================================================================

/// Parse and validate both sources into a `DataSet`.
///
/// Fails when either source is malformed at the document level or yields
/// no usable records. Individual bad records are dropped and counted in
/// `DataSet::report`; reviews pointing at unknown pharmacies are counted as
/// orphans.
pub fn load_dataset(
    pharmacy_input: &RecordInput,
    review_input: &RecordInput,
) -> Result<DataSet, LoadError> {
    let mut report = LoadReport::default();

    let pharmacy_rows = parse_rows(pharmacy_input)?;
    if pharmacy_rows.rows.is_empty() {
        return Err(LoadError::EmptySource {
            origin: pharmacy_input.origin.clone(),
            what: "pharmacy",
            rejected: pharmacy_rows.malformed,
        });
    }
    report.rejected_pharmacies = pharmacy_rows.malformed;

    let mut pharmacies: Vec<Pharmacy> = Vec::with_capacity(pharmacy_rows.rows.len());
    let mut seen_ids: HashSet<PharmacyId> = HashSet::new();
    for (position, row) in pharmacy_rows.rows.iter().enumerate() {
        match coerce_pharmacy(row, position) {
            Ok(p) => {
                if seen_ids.insert(p.id.clone()) {
                    pharmacies.push(p);
                } else {
                    tracing::debug!(id = %p.id, "Duplicate pharmacy id; keeping first record");
                    report.duplicate_pharmacies += 1;
                }
            }
            Err(reason) => {
                tracing::debug!(
                    origin = %pharmacy_input.origin,
                    position,
                    reason,
                    "Rejected pharmacy record"
                );
                report.rejected_pharmacies += 1;
            }
        }
    }

    if pharmacies.is_empty() {
        return Err(LoadError::EmptySource {
            origin: pharmacy_input.origin.clone(),
            what: "pharmacy",
            rejected: report.rejected_pharmacies,
        });
    }

    assign_ranks(&mut pharmacies);

    let review_rows = parse_rows(review_input)?;
    if review_rows.rows.is_empty() {
        return Err(LoadError::EmptySource {
            origin: review_input.origin.clone(),
            what: "review",
            rejected: review_rows.malformed,
        });
    }
    report.rejected_reviews = review_rows.malformed;

    let resolver = ReferenceResolver::new(&pharmacies);
    let mut reviews: Vec<Review> = Vec::with_capacity(review_rows.rows.len());
    for (position, row) in review_rows.rows.iter().enumerate() {
        match coerce_review(row, position, &resolver) {
            Ok(r) => reviews.push(r),
            Err(ReviewRejection::Orphan(reference)) => {
                tracing::debug!(reference = %reference, position, "Review references unknown pharmacy");
                report.orphan_reviews += 1;
            }
            Err(ReviewRejection::Invalid(reason)) => {
                tracing::debug!(
                    origin = %review_input.origin,
                    position,
                    reason,
                    "Rejected review record"
                );
                report.rejected_reviews += 1;
            }
        }
    }

    if reviews.is_empty() {
        return Err(LoadError::EmptySource {
            origin: review_input.origin.clone(),
            what: "review",
            rejected: report.rejected_reviews + report.orphan_reviews,
        });
    }

    // Stable: reviews sharing a timestamp keep their source order.
    reviews.sort_by_key(|r| r.timestamp);

    tracing::info!(
        pharmacies = pharmacies.len(),
        reviews = reviews.len(),
        orphans = report.orphan_reviews,
        rejected_pharmacies = report.rejected_pharmacies,
        rejected_reviews = report.rejected_reviews,
        duplicates = report.duplicate_pharmacies,
        "Dataset loaded"
    );

    Ok(DataSet {
        pharmacies,
        reviews,
        report,
    })
}

/// The orphan-reference warning for a load report, if any reviews were
/// dropped for pointing at unknown pharmacies.
pub fn orphan_warning(report: &LoadReport) -> Option<OrphanReferenceWarning> {
    (report.orphan_reviews > 0).then_some(OrphanReferenceWarning {
        count: report.orphan_reviews,
    })
}

// =============================================================================
// Document parsing (JSON / CSV -> raw rows)
// =============================================================================

/// A raw record plus the map key it was stored under (keyed JSON only).
#[derive(Debug)]
struct RawRow {
    key: Option<String>,
    fields: Map<String, Value>,
}

#[derive(Debug, Default)]
struct RawRows {
    rows: Vec<RawRow>,
    /// Entries that were not objects at all (e.g. a number inside the
    /// array) and CSV rows whose field count differs from the header.
    malformed: usize,
}

fn parse_rows(input: &RecordInput) -> Result<RawRows, LoadError> {
    match input.format {
        RecordFormat::Json => parse_json_rows(input),
        RecordFormat::Csv => parse_csv_rows(input),
    }
}

/// Accepts an array of objects, or an object of objects keyed by record id.
fn parse_json_rows(input: &RecordInput) -> Result<RawRows, LoadError> {
    let document: Value =
        serde_json::from_str(&input.content).map_err(|e| LoadError::MalformedJson {
            origin: input.origin.clone(),
            source: e,
        })?;

    let mut out = RawRows::default();
    match document {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(fields) => out.rows.push(RawRow { key: None, fields }),
                    _ => out.malformed += 1,
                }
            }
        }
        Value::Object(entries) => {
            for (key, item) in entries {
                match item {
                    Value::Object(fields) => out.rows.push(RawRow {
                        key: Some(key),
                        fields,
                    }),
                    _ => out.malformed += 1,
                }
            }
        }
        other => {
            return Err(LoadError::UnexpectedShape {
                origin: input.origin.clone(),
                found: json_kind(&other),
            })
        }
    }
    Ok(out)
}

fn parse_csv_rows(input: &RecordInput) -> Result<RawRows, LoadError> {
    let malformed = |e: csv::Error| LoadError::MalformedCsv {
        origin: input.origin.clone(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input.content.as_bytes());
    let headers = reader.headers().map_err(malformed)?.clone();

    let mut out = RawRows::default();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        if record.len() != headers.len() {
            tracing::debug!(
                origin = %input.origin,
                line = record.position().map(|p| p.line()),
                fields = record.len(),
                expected = headers.len(),
                "CSV row has wrong field count; skipping"
            );
            out.malformed += 1;
            continue;
        }
        let fields: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();
        out.rows.push(RawRow { key: None, fields });
    }
    Ok(out)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Field coercion
// =============================================================================

/// First present, non-null, non-blank value among `names`.
fn field<'a>(row: &'a RawRow, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| match row.fields.get(*name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    })
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Normalise an identifier: whole numbers lose their fractional part so
/// `12`, `12.0` and `"12.0"` all become `"12"`.
fn identifier(v: &Value) -> Option<String> {
    if let Some(n) = number(v) {
        if n.fract() == 0.0 && n.abs() < 1e15 {
            return Some(format!("{}", n as i64));
        }
    }
    text(v).filter(|s| !s.is_empty())
}

/// Parse a timestamp from the formats seen in review exports.
///
/// Digit-only values of `MIN_EPOCH_MILLIS_DIGITS` or more digits are epoch
/// milliseconds; eight digits are a compact `YYYYMMDD` date. Shorter digit
/// runs (a bare year, say) are rejected. Date-only values are midnight UTC.
pub(crate) fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    if let Value::Number(n) = v {
        return epoch_millis(&n.as_i64()?.to_string());
    }
    let raw = v.as_str()?.trim();
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if raw.len() == 8 {
            return NaiveDate::parse_from_str(raw, "%Y%m%d")
                .ok()
                .and_then(|nd| nd.and_hms_opt(0, 0, 0))
                .map(|ndt| ndt.and_utc());
        }
        return epoch_millis(raw);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d-%m-%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc());
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(nd) = NaiveDate::parse_from_str(raw, fmt) {
            return nd.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
        }
    }
    None
}

fn epoch_millis(digits: &str) -> Option<DateTime<Utc>> {
    if digits.trim_start_matches('-').len() < constants::MIN_EPOCH_MILLIS_DIGITS {
        return None;
    }
    DateTime::from_timestamp_millis(digits.parse().ok()?)
}

/// Locality of an address: the last word of the second-to-last
/// comma-separated segment (`"Street 1, 3011 Bern, Switzerland"` -> `"Bern"`).
pub fn derive_city(address: &str) -> String {
    let segments: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let segment = match segments.len() {
        0 => None,
        1 => segments.first(),
        n => segments.get(n - 2),
    };
    segment
        .and_then(|s| s.split_whitespace().last())
        .map(str::to_string)
        .unwrap_or_else(|| constants::UNKNOWN_CITY.to_string())
}

// =============================================================================
// Pharmacy validation
// =============================================================================

fn coerce_pharmacy(row: &RawRow, position: usize) -> Result<Pharmacy, &'static str> {
    let id = field(row, PHARMACY_ID)
        .and_then(identifier)
        .or_else(|| row.key.clone())
        .unwrap_or_else(|| position.to_string());

    let name = field(row, PHARMACY_NAME)
        .and_then(text)
        .filter(|s| !s.is_empty())
        .ok_or("missing name")?;

    let latitude = field(row, LATITUDE)
        .and_then(number)
        .ok_or("missing or non-numeric latitude")?;
    let longitude = field(row, LONGITUDE)
        .and_then(number)
        .ok_or("missing or non-numeric longitude")?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err("coordinates out of range");
    }

    // Missing rating / count mean "not yet rated", not "invalid".
    let average_rating = match field(row, AVERAGE_RATING) {
        None => 0.0,
        Some(v) => number(v).ok_or("non-numeric averageRating")?,
    };
    if !(0.0..=constants::MAX_RATING).contains(&average_rating) {
        return Err("averageRating out of range");
    }

    let total_reviews = match field(row, TOTAL_REVIEWS) {
        None => 0,
        Some(v) => {
            let n = number(v).ok_or("non-numeric totalReviews")?;
            if n < 0.0 || n > f64::from(u32::MAX) {
                return Err("totalReviews out of range");
            }
            n.round() as u32
        }
    };

    let address = field(row, PHARMACY_ADDRESS)
        .and_then(text)
        .unwrap_or_default();
    let contact: String = field(row, CONTACT)
        .and_then(text)
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let created_at = field(row, CREATED_AT).and_then(parse_timestamp);

    Ok(Pharmacy {
        id: PharmacyId(id),
        city: derive_city(&address),
        name,
        address,
        latitude,
        longitude,
        average_rating,
        total_reviews,
        contact,
        created_at,
        review_band: ReviewBand::from_count(total_reviews),
        marker_colour: MarkerColour::from_count(total_reviews),
        stars: average_rating.floor().clamp(0.0, constants::MAX_RATING) as u8,
        rank: 0,
    })
}

/// Rank = min-rank by review count (desc) + min-rank by rating (desc).
/// Ties share the lowest rank, so a lower sum means more popular and
/// better rated.
fn assign_ranks(pharmacies: &mut [Pharmacy]) {
    let counts: Vec<f64> = pharmacies
        .iter()
        .map(|p| f64::from(p.total_reviews))
        .collect();
    let ratings: Vec<f64> = pharmacies.iter().map(|p| p.average_rating).collect();
    let by_count = min_rank_desc(&counts);
    let by_rating = min_rank_desc(&ratings);
    for (i, p) in pharmacies.iter_mut().enumerate() {
        p.rank = by_count[i] + by_rating[i];
    }
}

fn min_rank_desc(values: &[f64]) -> Vec<u32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    values
        .iter()
        .map(|v| sorted.partition_point(|x| x > v) as u32 + 1)
        .collect()
}

// =============================================================================
// Review validation
// =============================================================================

enum ReviewRejection {
    /// Reference present but unresolved.
    Orphan(String),
    Invalid(&'static str),
}

/// Resolves review references by id, or by exact pharmacy name for exports
/// that only carry the place name.
struct ReferenceResolver<'a> {
    ids: HashSet<&'a str>,
    names: HashMap<&'a str, &'a PharmacyId>,
}

impl<'a> ReferenceResolver<'a> {
    fn new(pharmacies: &'a [Pharmacy]) -> Self {
        let ids = pharmacies.iter().map(|p| p.id.as_str()).collect();
        let mut names = HashMap::new();
        for p in pharmacies {
            // First pharmacy with a given name wins.
            names.entry(p.name.as_str()).or_insert(&p.id);
        }
        Self { ids, names }
    }

    fn resolve(&self, row: &RawRow) -> Result<PharmacyId, ReviewRejection> {
        if let Some(id) = field(row, REVIEW_PHARMACY_ID).and_then(identifier) {
            return if self.ids.contains(id.as_str()) {
                Ok(PharmacyId(id))
            } else {
                Err(ReviewRejection::Orphan(id))
            };
        }
        if let Some(name) = field(row, REVIEW_PHARMACY_NAME).and_then(text) {
            return match self.names.get(name.as_str()) {
                Some(id) => Ok((*id).clone()),
                None => Err(ReviewRejection::Orphan(name)),
            };
        }
        Err(ReviewRejection::Invalid("missing pharmacy reference"))
    }
}

fn coerce_review(
    row: &RawRow,
    position: usize,
    resolver: &ReferenceResolver<'_>,
) -> Result<Review, ReviewRejection> {
    let rating = field(row, REVIEW_RATING)
        .and_then(number)
        .ok_or(ReviewRejection::Invalid("missing or non-numeric rating"))?;
    if !(constants::MIN_REVIEW_RATING..=constants::MAX_RATING).contains(&rating) {
        return Err(ReviewRejection::Invalid("rating out of range"));
    }

    let timestamp = field(row, REVIEW_TIME)
        .and_then(parse_timestamp)
        .ok_or(ReviewRejection::Invalid("missing or unparseable timestamp"))?;

    let pharmacy_id = resolver.resolve(row)?;

    let id = field(row, REVIEW_ID)
        .and_then(identifier)
        .or_else(|| row.key.clone())
        .unwrap_or_else(|| format!("r{position}"));

    Ok(Review {
        id: ReviewId(id),
        pharmacy_id,
        rating,
        text: field(row, REVIEW_TEXT).and_then(text).unwrap_or_default(),
        reviewer: field(row, REVIEWER).and_then(text).unwrap_or_default(),
        timestamp,
    })
}
