// PharmaLens - app/render.rs
//
// One dashboard recompute: filter the base tables with the session's
// predicate, aggregate the surviving reviews and adapt the result for
// every view. Pure: same state and data always give the same dashboard.

use crate::app::state::{SessionState, Tab};
use crate::core::aggregate::{self, ReviewSummary, TopPlace};
use crate::core::filter;
use crate::core::model::DataSet;
use crate::core::views::{self, ChartSet, Kpi, ListRow, MapView};
use serde::Serialize;

/// Everything the Reviews Analysis page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub kpis: Vec<Kpi>,
    /// `None` when the filtered subset holds no reviews.
    pub summary: Option<ReviewSummary>,
    pub charts: Option<ChartSet>,
    pub top_places: Vec<TopPlace>,
}

/// The rendered dashboard for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub active_tab: Tab,
    pub pharmacies_shown: usize,
    pub pharmacies_total: usize,
    pub reviews_shown: usize,
    pub reviews_total: usize,
    pub map: MapView,
    pub list: Vec<ListRow>,
    pub analysis: AnalysisView,
}

impl Dashboard {
    /// Status-bar summary, e.g. "12/40 pharmacies, 310/2000 reviews".
    pub fn counts_label(&self) -> String {
        format!(
            "{}/{} pharmacies, {}/{} reviews",
            self.pharmacies_shown, self.pharmacies_total, self.reviews_shown, self.reviews_total
        )
    }
}

/// Recompute the dashboard from the session state and the base tables.
pub fn render(state: &SessionState, data: &DataSet) -> Dashboard {
    let view = filter::apply(data, state.predicate());
    let pharmacies = view.pharmacies(data);
    let reviews = view.reviews(data);

    let summary = aggregate::summarise(&reviews, data.reviews.len(), &state.analysis);
    let kpis = views::kpis(summary.as_ref());
    if summary.is_err() {
        tracing::debug!("Filtered subset has no reviews; analysis shows placeholders");
    }
    let charts = summary.as_ref().ok().map(views::chart_series);

    Dashboard {
        active_tab: state.active_tab,
        pharmacies_shown: pharmacies.len(),
        pharmacies_total: data.pharmacies.len(),
        reviews_shown: reviews.len(),
        reviews_total: data.reviews.len(),
        map: views::map_markers(&pharmacies, &reviews),
        list: views::list_rows(&pharmacies, &reviews, state.list_sort),
        analysis: AnalysisView {
            kpis,
            charts,
            top_places: aggregate::top_performing(&pharmacies, state.top_places),
            summary: summary.ok(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::FilterPredicate;
    use crate::core::loader::{load_dataset, RecordInput};
    use crate::core::views::NO_DATA;

    fn data() -> DataSet {
        let pharmacies = RecordInput::json(
            "p.json",
            r#"[
              {"id": 1, "name": "Sonnen Apotheke", "address": "Gasse 1, 3011 Bern, Switzerland",
               "latitude": 46.95, "longitude": 7.44, "averageRating": 3.5, "totalReviews": 20},
              {"id": 2, "name": "Bahnhof Apotheke", "address": "Platz 2, 8001 Zürich, Switzerland",
               "latitude": 47.37, "longitude": 8.54, "averageRating": 4.0, "totalReviews": 80},
              {"id": 3, "name": "Amavita", "address": "Weg 3, 3011 Bern, Switzerland",
               "latitude": 46.94, "longitude": 7.45, "averageRating": 4.8, "totalReviews": 250}
            ]"#,
        );
        let reviews = RecordInput::json(
            "r.json",
            r#"[
              {"pharmacyId": 1, "rating": 3, "text": "ok", "datetime": "2023-03-01 10:00:00"},
              {"pharmacyId": 2, "rating": 4, "text": "good", "datetime": "2023-03-02 10:00:00"},
              {"pharmacyId": 3, "rating": 5, "text": "great", "datetime": "2023-03-04 10:00:00"}
            ]"#,
        );
        load_dataset(&pharmacies, &reviews).unwrap()
    }

    #[test]
    fn test_render_unfiltered() {
        let data = data();
        let state = SessionState::default();
        let dash = render(&state, &data);
        assert_eq!(dash.pharmacies_shown, 3);
        assert_eq!(dash.reviews_shown, 3);
        assert_eq!(dash.map.markers.len(), 3);
        assert_eq!(dash.list[0].name, "Amavita");
        assert_eq!(dash.analysis.summary.as_ref().unwrap().mean_rating, 4.0);
        assert_eq!(dash.counts_label(), "3/3 pharmacies, 3/3 reviews");
    }

    #[test]
    fn test_render_empty_subset_shows_placeholders() {
        let data = data();
        let mut state = SessionState::default();
        state
            .set_predicate(FilterPredicate {
                text: "no such pharmacy".into(),
                ..Default::default()
            })
            .unwrap();
        let dash = render(&state, &data);
        assert_eq!(dash.pharmacies_shown, 0);
        assert!(dash.analysis.summary.is_none());
        assert!(dash.analysis.charts.is_none());
        assert!(dash.analysis.kpis.iter().all(|k| k.value == NO_DATA));
        assert!(dash.map.markers.is_empty());
    }

    #[test]
    fn test_render_is_deterministic() {
        let data = data();
        let mut state = SessionState::default();
        state.set_predicate(FilterPredicate::well_rated()).unwrap();
        assert_eq!(render(&state, &data), render(&state, &data));
    }
}
