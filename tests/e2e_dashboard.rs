// PharmaLens - tests/e2e_dashboard.rs
//
// End-to-end tests: load the fixture datasets from disk, filter them,
// aggregate the reviews and render the dashboard the way the GUI and
// `--dump` do.
//
// Fixtures live in tests/fixtures/ and are committed to the repository.

use pharmalens::app::dataset::{self, DataPaths};
use pharmalens::app::render;
use pharmalens::app::session;
use pharmalens::app::state::{SessionState, Tab};
use pharmalens::core::aggregate::{self, AnalysisOptions, Granularity};
use pharmalens::core::export;
use pharmalens::core::filter::{self, FilterPredicate};
use pharmalens::core::loader;
use pharmalens::core::model::{DataSet, PharmacyId};
use pharmalens::core::views::{ListSort, NO_DATA};
use pharmalens::util::error::LoadError;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn json_paths() -> DataPaths {
    DataPaths {
        pharmacies: fixture("pharmacies.json"),
        reviews: fixture("reviews.json"),
    }
}

fn load_json() -> DataSet {
    dataset::load_from_paths(&json_paths()).expect("JSON fixtures should load")
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn e2e_json_fixtures_load_with_report() {
    let data = load_json();

    assert_eq!(data.pharmacies.len(), 4, "pharmacy without coordinates is dropped");
    assert_eq!(data.reviews.len(), 9);
    assert_eq!(data.report.rejected_pharmacies, 1);
    assert_eq!(data.report.rejected_reviews, 1, "rating 7 is out of range");
    assert_eq!(data.report.orphan_reviews, 1, "review for pharmacy 99 is an orphan");
    assert!(!data.report.is_clean());

    let warning = loader::orphan_warning(&data.report).expect("orphan warning expected");
    assert_eq!(warning.count, 1);

    let lines = dataset::report_lines(&data);
    assert!(!lines.is_empty(), "report lines should describe dropped records");
}

#[test]
fn e2e_every_review_resolves_to_a_pharmacy() {
    let data = load_json();
    for review in &data.reviews {
        assert!(
            data.pharmacy(&review.pharmacy_id).is_some(),
            "review {} points at unknown pharmacy {}",
            review.id,
            review.pharmacy_id
        );
    }
}

#[test]
fn e2e_place_name_reference_resolves_by_name() {
    let data = load_json();
    let r7 = data
        .reviews
        .iter()
        .find(|r| r.id.0 == "r7")
        .expect("review r7 should be loaded");
    assert_eq!(r7.pharmacy_id, PharmacyId::from("4"));
}

#[test]
fn e2e_derived_fields_from_fixtures() {
    let data = load_json();
    let bahnhof = data
        .pharmacy(&PharmacyId::from("2"))
        .expect("pharmacy 2 should be loaded");
    assert_eq!(bahnhof.city, "Zürich");
    assert!((bahnhof.average_rating - 4.0).abs() < 1e-9, "string rating is coerced");
    assert_eq!(bahnhof.total_reviews, 80);
    assert_eq!(bahnhof.stars, 4);

    let cities = data.cities();
    assert_eq!(cities, vec!["Bern", "Zürich", "Genève"]);
}

#[test]
fn e2e_reviews_are_in_time_order() {
    let data = load_json();
    assert!(data
        .reviews
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn e2e_csv_fixtures_load() {
    let paths = DataPaths {
        pharmacies: fixture("pharmacies.csv"),
        reviews: fixture("reviews.csv"),
    };
    let data = dataset::load_from_paths(&paths).expect("CSV fixtures should load");

    assert_eq!(data.pharmacies.len(), 3);
    assert_eq!(data.reviews.len(), 3);
    assert_eq!(data.report.orphan_reviews, 1);
    let sonnen = data
        .pharmacy(&PharmacyId::from("1"))
        .expect("pharmacy 1 should be loaded");
    assert_eq!(sonnen.address, "Marktgasse 1, 3011 Bern, Switzerland");
    assert_eq!(sonnen.city, "Bern");
}

#[test]
fn e2e_mixed_formats_load() {
    let paths = DataPaths {
        pharmacies: fixture("pharmacies.json"),
        reviews: fixture("reviews.csv"),
    };
    let data = dataset::load_from_paths(&paths).expect("mixed fixtures should load");
    assert_eq!(data.pharmacies.len(), 4);
    assert_eq!(data.reviews.len(), 3);
}

#[test]
fn e2e_missing_file_is_an_error() {
    let paths = DataPaths {
        pharmacies: fixture("does_not_exist.json"),
        reviews: fixture("reviews.json"),
    };
    let err = dataset::load_from_paths(&paths).expect_err("missing file must fail");
    assert!(matches!(err, LoadError::Io { .. }), "got {err:?}");
}

#[test]
fn e2e_reload_is_identical() {
    let first = load_json();
    let second = load_json();
    assert_eq!(first.pharmacies, second.pharmacies);
    assert_eq!(first.reviews, second.reviews);
    assert_eq!(first.report, second.report);
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn e2e_rating_filter_keeps_well_rated() {
    let data = load_json();
    let valid = FilterPredicate::well_rated().validate().expect("valid predicate");
    let view = filter::apply(&data, &valid);

    let ids: Vec<&str> = view
        .pharmacies(&data)
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, vec!["2", "3", "4"]);

    // Reviews of pharmacy 1 drop out along with it.
    let reviews = view.reviews(&data);
    assert_eq!(reviews.len(), 7);
    assert!(reviews.iter().all(|r| r.pharmacy_id.as_str() != "1"));
}

#[test]
fn e2e_empty_predicate_is_identity() {
    let data = load_json();
    let view = filter::apply(&data, &FilterPredicate::default().validate().expect("valid"));
    assert_eq!(view.pharmacies.len(), data.pharmacies.len());
    assert_eq!(view.reviews.len(), data.reviews.len());
}

#[test]
fn e2e_filtered_views_are_subsets() {
    let data = load_json();
    let predicates = [
        FilterPredicate::well_rated(),
        FilterPredicate::only_pharmacy(PharmacyId::from("3")),
        FilterPredicate {
            text: "apotheke".to_string(),
            ..Default::default()
        },
        FilterPredicate {
            cities: ["Bern".to_string()].into_iter().collect(),
            ..Default::default()
        },
        FilterPredicate {
            date_start: chrono::NaiveDate::from_ymd_opt(2023, 2, 1),
            date_end: chrono::NaiveDate::from_ymd_opt(2023, 2, 28),
            ..Default::default()
        },
    ];
    for predicate in predicates {
        let valid = predicate.validate().expect("valid predicate");
        let view = filter::apply(&data, &valid);
        assert!(view.pharmacies.iter().all(|&i| i < data.pharmacies.len()));
        assert!(view.reviews.iter().all(|&i| i < data.reviews.len()));
        assert!(view.pharmacies.windows(2).all(|w| w[0] < w[1]), "source order kept");
        // Every surviving review belongs to a surviving pharmacy.
        let shown = view.pharmacies(&data);
        for review in view.reviews(&data) {
            assert!(shown.iter().any(|p| p.id == review.pharmacy_id));
        }
    }
}

#[test]
fn e2e_date_window_is_inclusive() {
    let data = load_json();
    let valid = FilterPredicate {
        date_start: chrono::NaiveDate::from_ymd_opt(2023, 1, 5),
        date_end: chrono::NaiveDate::from_ymd_opt(2023, 1, 5),
        ..Default::default()
    }
    .validate()
    .expect("valid predicate");
    let view = filter::apply(&data, &valid);
    assert_eq!(view.reviews.len(), 2, "both reviews on 2023-01-05 match");
}

#[test]
fn e2e_invalid_regex_keeps_previous_filter() {
    let data = load_json();
    let mut state = SessionState::default();
    state
        .set_predicate(FilterPredicate::well_rated())
        .expect("valid predicate");

    let bad = FilterPredicate {
        review_regex: "(unclosed".to_string(),
        ..Default::default()
    };
    assert!(state.set_predicate(bad).is_err());
    assert!(state.filter_error.is_some());

    let dashboard = render::render(&state, &data);
    assert_eq!(dashboard.pharmacies_shown, 3, "well-rated filter still applies");
}

// =============================================================================
// Aggregation
// =============================================================================

#[test]
fn e2e_summary_over_all_reviews() {
    let data = load_json();
    let reviews: Vec<_> = data.reviews.iter().collect();
    let summary = aggregate::summarise(&reviews, data.reviews.len(), &AnalysisOptions::default())
        .expect("non-empty set");

    assert_eq!(summary.total, 9);
    assert!((summary.mean_rating - 4.0).abs() < 1e-9);
    assert_eq!(summary.histogram.counts, [0, 1, 1, 4, 3]);
    assert_eq!(summary.histogram.total(), 9);
    assert_eq!(summary.distinct_years, 1);
    assert!((summary.review_share_pct - 100.0).abs() < 1e-9);

    let friendly = summary
        .frequent_terms
        .iter()
        .find(|t| t.term == "friendly")
        .expect("'friendly' is a frequent term");
    assert_eq!(friendly.count, 3);
    assert!(summary.frequent_terms.iter().all(|t| t.term != "the"));
}

#[test]
fn e2e_daily_series_has_no_gaps() {
    let data = load_json();
    let reviews: Vec<_> = data.reviews.iter().collect();
    let series = aggregate::time_series(&reviews, Granularity::Day);

    // 2023-01-05 ..= 2023-03-20
    assert_eq!(series.len(), 75);
    assert_eq!(series.iter().map(|p| p.count).sum::<usize>(), 9);
    assert!(series
        .windows(2)
        .all(|w| (w[1].period_start - w[0].period_start).num_days() == 1));
    assert_eq!(series[0].count, 2);
}

#[test]
fn e2e_monthly_series_totals() {
    let data = load_json();
    let reviews: Vec<_> = data.reviews.iter().collect();
    let series = aggregate::time_series(&reviews, Granularity::Month);
    let counts: Vec<usize> = series.iter().map(|p| p.count).collect();
    assert_eq!(counts, vec![3, 3, 3]);
    assert_eq!(series[0].label, "Jan 2023");
}

// =============================================================================
// Rendering and export
// =============================================================================

#[test]
fn e2e_render_unfiltered_dashboard() {
    let data = load_json();
    let state = SessionState::default();
    let dashboard = render::render(&state, &data);

    assert_eq!(dashboard.active_tab, Tab::Map);
    assert_eq!(dashboard.map.markers.len(), 4);
    assert_eq!(dashboard.list.len(), 4);
    assert_eq!(dashboard.counts_label(), "4/4 pharmacies, 9/9 reviews");

    // Default list order: rating descending.
    let names: Vec<&str> = dashboard.list.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Amavita Markt",
            "Rhône Pharmacie",
            "Bahnhof Apotheke",
            "Sonnen Apotheke"
        ]
    );
    assert!(dashboard.analysis.charts.is_some());
    assert!(dashboard.analysis.kpis.iter().all(|k| k.value != NO_DATA));
}

#[test]
fn e2e_render_empty_subset_shows_placeholders() {
    let data = load_json();
    let mut state = SessionState::default();
    state
        .set_predicate(FilterPredicate {
            text: "no pharmacy is called this".to_string(),
            ..Default::default()
        })
        .expect("valid predicate");
    let dashboard = render::render(&state, &data);

    assert!(dashboard.map.markers.is_empty());
    assert!(dashboard.list.is_empty());
    assert!(dashboard.analysis.charts.is_none());
    assert!(dashboard.analysis.kpis.iter().all(|k| k.value == NO_DATA));
}

#[test]
fn e2e_dump_json_is_deterministic() {
    let mut state = SessionState::default();
    state.list_sort = ListSort::Name;
    state.analysis.granularity = Granularity::Week;

    let first = render::render(&state, &load_json());
    let second = render::render(&state, &load_json());
    let a = serde_json::to_string_pretty(&first.analysis).expect("serialise");
    let b = serde_json::to_string_pretty(&second.analysis).expect("serialise");
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&first.list).expect("serialise"),
        serde_json::to_string(&second.list).expect("serialise")
    );

    let value: serde_json::Value = serde_json::from_str(&a).expect("valid JSON");
    assert!(value.get("kpis").is_some());
}

#[test]
fn e2e_export_filtered_list_to_csv() {
    let data = load_json();
    let mut state = SessionState::default();
    state
        .set_predicate(FilterPredicate::well_rated())
        .expect("valid predicate");
    let dashboard = render::render(&state, &data);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pharmacies.csv");
    let file = std::fs::File::create(&path).expect("create export file");
    let written = export::export_csv(&dashboard.list, file, &path).expect("export");
    assert_eq!(written, 3);

    let text = std::fs::read_to_string(&path).expect("read export");
    let mut lines = text.lines();
    assert!(lines
        .next()
        .is_some_and(|h| h.starts_with("id,name,address")));
    assert_eq!(lines.count(), 3);
    assert!(text.contains("\"Spitalgasse 4, 3011 Bern, Switzerland\""));
}

#[test]
fn e2e_session_round_trip_restores_view() {
    let data = load_json();
    let mut state = SessionState::default();
    state.active_tab = Tab::Analysis;
    state.list_sort = ListSort::ReviewsDesc;
    state
        .set_predicate(FilterPredicate::only_pharmacy(PharmacyId::from("3")))
        .expect("valid predicate");
    let before = render::render(&state, &data);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = session::session_path(dir.path());
    session::save(&state.to_session_data(Some(json_paths())), &path).expect("save session");

    let saved = session::load(&path).expect("session should load");
    assert_eq!(saved.data_paths, Some(json_paths()));
    let mut restored = SessionState::default();
    restored.restore(&saved);
    let after = render::render(&restored, &data);

    assert_eq!(after.active_tab, Tab::Analysis);
    assert_eq!(after.pharmacies_shown, 1);
    assert_eq!(after.reviews_shown, before.reviews_shown);
    assert_eq!(
        serde_json::to_string(&after.list).expect("serialise"),
        serde_json::to_string(&before.list).expect("serialise")
    );
}

#[test]
fn e2e_restored_selection_missing_from_data_shows_everything() {
    let data = load_json();
    let mut stale = SessionState::default();
    stale
        .set_predicate(FilterPredicate::only_pharmacy(PharmacyId::from("gone")))
        .expect("valid predicate");
    let saved = stale.to_session_data(Some(json_paths()));

    let mut state = SessionState::default();
    state.restore(&saved);
    assert!(state.drop_unknown_pharmacy(&data));
    let dashboard = render::render(&state, &data);

    assert_eq!(dashboard.pharmacies_shown, dashboard.pharmacies_total);
    assert_eq!(dashboard.reviews_shown, dashboard.reviews_total);
    assert!(state.filter_error.is_none());
    assert!(state.status_message.contains("gone"));
}
