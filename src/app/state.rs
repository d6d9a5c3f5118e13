// PharmaLens - app/state.rs
//
// Session state: the one mutable value of a dashboard session. Holds the
// active tab, the filter predicate (draft and last valid), analysis
// options, list ordering and status-bar text.
// Owned by the eframe::App implementation; the CLI dump builds its own.

use crate::app::dataset::DataPaths;
use crate::app::session::{SessionData, SESSION_VERSION};
use crate::core::aggregate::{AnalysisOptions, Granularity};
use crate::core::filter::{FilterPredicate, ValidPredicate};
use crate::core::model::{DataSet, PharmacyId};
use crate::core::views::ListSort;
use crate::platform::config::AppConfig;
use crate::util::constants;
use crate::util::error::FilterError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Map,
    List,
    Analysis,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Map, Tab::List, Tab::Analysis]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Map => "Map",
            Tab::List => "List",
            Tab::Analysis => "Reviews Analysis",
        }
    }

    /// Parse a config / CLI value ("map", "list", "analysis").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "map" => Some(Tab::Map),
            "list" => Some(Tab::List),
            "analysis" => Some(Tab::Analysis),
            _ => None,
        }
    }
}

/// Mutable per-session state.
#[derive(Debug)]
pub struct SessionState {
    pub active_tab: Tab,

    /// Predicate as currently edited in the filter sidebar. May be invalid.
    pub draft: FilterPredicate,

    /// Last predicate that passed validation. Drives every view.
    valid: ValidPredicate,

    /// Date-range text as typed in the sidebar ("YYYY-MM-DD", empty = open).
    pub date_inputs: [String; 2],

    /// Why the draft was rejected, shown until the next valid commit.
    pub filter_error: Option<String>,

    pub analysis: AnalysisOptions,

    /// Rows in the top-performing table.
    pub top_places: usize,

    pub list_sort: ListSort,

    /// Status message for the status bar.
    pub status_message: String,

    /// Non-fatal warnings accumulated this session (config, load report).
    pub warnings: Vec<String>,

    /// Whether to show the load summary window.
    pub show_load_summary: bool,

    /// Whether to show the About dialog.
    pub show_about: bool,

    /// Whether debug mode is enabled.
    pub debug_mode: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(&AppConfig::default(), false)
    }
}

impl SessionState {
    /// Initial state from validated configuration.
    pub fn new(config: &AppConfig, debug_mode: bool) -> Self {
        Self {
            active_tab: Tab::parse(&config.default_tab).unwrap_or_default(),
            draft: FilterPredicate::default(),
            valid: ValidPredicate::default(),
            date_inputs: Default::default(),
            filter_error: None,
            analysis: AnalysisOptions {
                granularity: Granularity::parse(&config.granularity).unwrap_or_default(),
                length_bucket_words: config.length_bucket_words,
                frequent_terms: config.frequent_terms,
            },
            top_places: config.top_places,
            list_sort: ListSort::default(),
            status_message: "Ready.".to_string(),
            warnings: Vec::new(),
            show_load_summary: false,
            show_about: false,
            debug_mode,
        }
    }

    /// The predicate currently applied to the views.
    pub fn predicate(&self) -> &ValidPredicate {
        &self.valid
    }

    /// Replace the active predicate.
    ///
    /// An invalid predicate is kept as the draft so the user can correct it,
    /// but the previous valid predicate stays in effect and the reason is
    /// surfaced in the status bar.
    pub fn set_predicate(&mut self, predicate: FilterPredicate) -> Result<(), FilterError> {
        match predicate.validate() {
            Ok(valid) => {
                tracing::debug!(empty = predicate.is_empty(), "Filter predicate applied");
                self.valid = valid;
                self.draft = predicate;
                self.filter_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Filter predicate rejected; keeping previous");
                self.draft = predicate;
                self.filter_error = Some(e.to_string());
                self.status_message = e.to_string();
                Err(e)
            }
        }
    }

    /// Validate and apply the sidebar draft. Returns true when it took effect.
    pub fn commit_draft(&mut self) -> bool {
        self.set_predicate(self.draft.clone()).is_ok()
    }

    /// Parse the date-range text into the draft and commit it.
    ///
    /// Unparseable text is reported like any other invalid predicate and
    /// leaves the applied predicate untouched.
    pub fn commit_date_inputs(&mut self) -> bool {
        let mut bounds = [None, None];
        for (slot, input) in bounds.iter_mut().zip(&self.date_inputs) {
            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
                Ok(date) => *slot = Some(date),
                Err(_) => {
                    let msg = format!("Invalid filter: date '{input}' is not YYYY-MM-DD");
                    self.status_message = msg.clone();
                    self.filter_error = Some(msg);
                    return false;
                }
            }
        }
        self.draft.date_start = bounds[0];
        self.draft.date_end = bounds[1];
        self.commit_draft()
    }

    /// Rewrite the date-range text from the draft predicate.
    pub fn sync_date_inputs(&mut self) {
        let fmt = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        self.date_inputs = [fmt(self.draft.date_start), fmt(self.draft.date_end)];
    }

    /// Clear every filter constraint.
    pub fn reset_filters(&mut self) {
        self.draft = FilterPredicate::default();
        self.valid = ValidPredicate::default();
        self.date_inputs = Default::default();
        self.filter_error = None;
        self.status_message = "Filters cleared.".to_string();
    }

    /// Clear a selected pharmacy that `data` does not contain, from both the
    /// draft and the applied predicate. Other constraints are untouched.
    /// Returns true when a selection was dropped.
    pub fn drop_unknown_pharmacy(&mut self, data: &DataSet) -> bool {
        let unknown = |id: &Option<PharmacyId>| {
            id.as_ref().filter(|id| data.pharmacy(id).is_none()).cloned()
        };
        let stale_active = unknown(&self.valid.predicate().pharmacy_id);
        let stale_draft = unknown(&self.draft.pharmacy_id);
        let Some(id) = stale_active.clone().or(stale_draft.clone()) else {
            return false;
        };

        if stale_active.is_some() {
            let mut active = self.valid.predicate().clone();
            active.pharmacy_id = None;
            // Removing a constraint cannot invalidate the predicate.
            if let Ok(valid) = active.validate() {
                self.valid = valid;
            }
        }
        if stale_draft.is_some() {
            self.draft.pharmacy_id = None;
        }

        tracing::warn!(pharmacy_id = %id, "Selected pharmacy not in dataset; selection cleared");
        let msg = format!("Pharmacy '{id}' is not in the loaded data; showing all pharmacies.");
        self.status_message = msg.clone();
        self.add_warning(msg);
        true
    }

    /// Record a non-fatal warning, bounded by `MAX_WARNINGS`.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        if self.warnings.len() < constants::MAX_WARNINGS {
            self.warnings.push(message.into());
        }
    }

    /// Persistable snapshot of this session.
    pub fn to_session_data(&self, data_paths: Option<DataPaths>) -> SessionData {
        SessionData {
            version: SESSION_VERSION,
            active_tab: self.active_tab,
            filter: self.valid.predicate().clone(),
            granularity: self.analysis.granularity,
            list_sort: self.list_sort,
            data_paths,
        }
    }

    /// Apply a restored session. A stored predicate that no longer
    /// validates is dropped.
    pub fn restore(&mut self, data: &SessionData) {
        self.active_tab = data.active_tab;
        self.analysis.granularity = data.granularity;
        self.list_sort = data.list_sort;
        if self.set_predicate(data.filter.clone()).is_err() {
            self.reset_filters();
        }
        self.sync_date_inputs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_config() {
        let config = AppConfig {
            default_tab: "analysis".to_string(),
            granularity: "week".to_string(),
            top_places: 5,
            ..Default::default()
        };
        let state = SessionState::new(&config, true);
        assert_eq!(state.active_tab, Tab::Analysis);
        assert_eq!(state.analysis.granularity, Granularity::Week);
        assert_eq!(state.top_places, 5);
        assert!(state.debug_mode);
        assert!(state.predicate().predicate().is_empty());
    }

    #[test]
    fn test_invalid_predicate_keeps_previous() {
        let mut state = SessionState::default();
        state.set_predicate(FilterPredicate::well_rated()).unwrap();

        let inverted = FilterPredicate {
            rating_min: Some(4.5),
            rating_max: Some(2.0),
            ..Default::default()
        };
        assert!(state.set_predicate(inverted.clone()).is_err());
        assert_eq!(state.predicate().predicate(), &FilterPredicate::well_rated());
        assert_eq!(state.draft, inverted);
        assert!(state.filter_error.is_some());
        assert_eq!(state.status_message, state.filter_error.clone().unwrap());

        // Fixing the draft clears the error.
        state.draft.rating_max = None;
        assert!(state.commit_draft());
        assert!(state.filter_error.is_none());
        assert_eq!(state.predicate().predicate().rating_min, Some(4.5));
    }

    #[test]
    fn test_date_inputs() {
        let mut state = SessionState::default();
        state.date_inputs = ["2023-01-01".into(), String::new()];
        assert!(state.commit_date_inputs());
        assert_eq!(
            state.predicate().predicate().date_start,
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
        assert_eq!(state.predicate().predicate().date_end, None);

        state.date_inputs[1] = "last tuesday".into();
        assert!(!state.commit_date_inputs());
        assert!(state.filter_error.is_some());
        assert_eq!(
            state.predicate().predicate().date_start,
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );

        // Inverted range is rejected by validation.
        state.date_inputs = ["2023-02-01".into(), "2023-01-01".into()];
        assert!(!state.commit_date_inputs());
    }

    #[test]
    fn test_reset_filters() {
        let mut state = SessionState::default();
        state
            .set_predicate(FilterPredicate {
                text: "apotheke".into(),
                ..Default::default()
            })
            .unwrap();
        state.reset_filters();
        assert!(state.predicate().predicate().is_empty());
        assert!(state.draft.is_empty());
    }

    #[test]
    fn test_session_snapshot_restores() {
        let mut state = SessionState::default();
        state.active_tab = Tab::List;
        state.list_sort = ListSort::Name;
        state.analysis.granularity = Granularity::Day;
        state.set_predicate(FilterPredicate::well_rated()).unwrap();
        let snapshot = state.to_session_data(None);

        let mut fresh = SessionState::default();
        fresh.restore(&snapshot);
        assert_eq!(fresh.active_tab, Tab::List);
        assert_eq!(fresh.list_sort, ListSort::Name);
        assert_eq!(fresh.analysis.granularity, Granularity::Day);
        assert_eq!(fresh.predicate().predicate(), &FilterPredicate::well_rated());
    }

    fn one_pharmacy() -> DataSet {
        crate::core::loader::load_dataset(
            &crate::core::loader::RecordInput::json(
                "pharmacies.json",
                r#"[{"id": "1", "name": "Apotheke A", "latitude": 46.9, "longitude": 7.4}]"#,
            ),
            &crate::core::loader::RecordInput::json(
                "reviews.json",
                r#"[{"pharmacyId": "1", "rating": 4, "datetime": "2023-01-01"}]"#,
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_restored_unknown_pharmacy_is_dropped() {
        let data = one_pharmacy();
        let snapshot = SessionData {
            filter: FilterPredicate {
                text: "apotheke".into(),
                ..FilterPredicate::only_pharmacy(PharmacyId::from("gone"))
            },
            ..SessionState::default().to_session_data(None)
        };
        let mut state = SessionState::default();
        state.restore(&snapshot);

        assert!(state.drop_unknown_pharmacy(&data));
        assert_eq!(state.predicate().predicate().pharmacy_id, None);
        assert_eq!(state.draft.pharmacy_id, None);
        assert_eq!(state.predicate().predicate().text, "apotheke");
        assert_eq!(state.warnings.len(), 1);

        let dashboard = crate::app::render::render(&state, &data);
        assert_eq!(dashboard.pharmacies_shown, 1);
        assert!(state.filter_error.is_none());

        // Nothing left to drop.
        assert!(!state.drop_unknown_pharmacy(&data));
    }

    #[test]
    fn test_known_pharmacy_survives_and_invalid_draft_is_cleared() {
        let data = one_pharmacy();
        let mut state = SessionState::default();
        state
            .set_predicate(FilterPredicate::only_pharmacy(PharmacyId::from("1")))
            .unwrap();
        assert!(!state.drop_unknown_pharmacy(&data));
        assert_eq!(state.predicate().predicate().pharmacy_id, Some(PharmacyId::from("1")));

        // A rejected draft still pointing at a vanished pharmacy.
        let applied = FilterPredicate::only_pharmacy(PharmacyId::from("gone"));
        state.set_predicate(applied).unwrap();
        let bad_draft = FilterPredicate {
            review_regex: "(".into(),
            ..FilterPredicate::only_pharmacy(PharmacyId::from("gone"))
        };
        assert!(state.set_predicate(bad_draft).is_err());

        assert!(state.drop_unknown_pharmacy(&data));
        assert_eq!(state.predicate().predicate().pharmacy_id, None);
        assert_eq!(state.draft.pharmacy_id, None);
        assert_eq!(state.draft.review_regex, "(");
    }

    #[test]
    fn test_warnings_are_bounded() {
        let mut state = SessionState::default();
        for i in 0..constants::MAX_WARNINGS + 10 {
            state.add_warning(format!("w{i}"));
        }
        assert_eq!(state.warnings.len(), constants::MAX_WARNINGS);
    }
}
