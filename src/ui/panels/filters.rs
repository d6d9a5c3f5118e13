// PharmaLens - ui/panels/filters.rs
//
// Filter controls sidebar. Edits the session's draft predicate and
// commits it on every change; a rejected draft leaves the views on the
// previous valid predicate and shows the reason here.

use crate::app::state::SessionState;
use crate::core::filter::FilterPredicate;
use crate::core::model::{DataSet, ReviewBand};
use crate::ui::theme;

/// Optional rating bound: checkbox to enable, slider for the value.
fn rating_bound(ui: &mut egui::Ui, label: &str, bound: &mut Option<f64>, initial: f64) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        let mut enabled = bound.is_some();
        if ui.checkbox(&mut enabled, label).changed() {
            *bound = enabled.then_some(initial);
            changed = true;
        }
        if let Some(value) = bound.as_mut() {
            changed |= ui
                .add(egui::Slider::new(value, 0.0..=5.0).step_by(0.1))
                .changed();
        }
    });
    changed
}

/// Render the filter controls. Returns true when the applied predicate
/// may have changed.
pub fn render(ui: &mut egui::Ui, state: &mut SessionState, data: &DataSet) -> bool {
    ui.heading("Filters");
    ui.separator();

    // Quick filters
    let mut changed = false;
    ui.horizontal(|ui| {
        if ui.button("Well Rated (4+)").clicked() {
            changed |= state.set_predicate(FilterPredicate::well_rated()).is_ok();
            state.sync_date_inputs();
        }
        if ui.button("Clear Filters").clicked() {
            state.reset_filters();
            changed = true;
        }
    });

    ui.separator();

    // Selected pharmacy
    ui.label("Pharmacy:");
    let selected_name = state
        .draft
        .pharmacy_id
        .as_ref()
        .and_then(|id| data.pharmacy(id))
        .map(|p| p.name.as_str())
        .unwrap_or("All pharmacies");
    let mut draft_changed = false;
    egui::ComboBox::from_id_salt("pharmacy_select")
        .selected_text(selected_name)
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui| {
            draft_changed |= ui
                .selectable_value(&mut state.draft.pharmacy_id, None, "All pharmacies")
                .changed();
            for p in &data.pharmacies {
                draft_changed |= ui
                    .selectable_value(&mut state.draft.pharmacy_id, Some(p.id.clone()), p.name.as_str())
                    .changed();
            }
        });

    // Text search
    ui.label("Name or address:");
    draft_changed |= ui.text_edit_singleline(&mut state.draft.text).changed();

    ui.separator();

    // Rating range
    ui.label("Average rating:");
    draft_changed |= rating_bound(ui, "min", &mut state.draft.rating_min, 4.0);
    draft_changed |= rating_bound(ui, "max", &mut state.draft.rating_max, 5.0);

    // Star buckets
    ui.label("Stars:");
    ui.horizontal_wrapped(|ui| {
        for stars in 1..=5u8 {
            let mut checked = state.draft.stars.contains(&stars);
            if ui.checkbox(&mut checked, stars.to_string()).changed() {
                if checked {
                    state.draft.stars.insert(stars);
                } else {
                    state.draft.stars.remove(&stars);
                }
                draft_changed = true;
            }
        }
    });

    // Review-count bands
    ui.label("Reviewers:");
    for band in ReviewBand::all() {
        let mut checked = state.draft.review_bands.contains(band);
        if ui.checkbox(&mut checked, band.label()).changed() {
            if checked {
                state.draft.review_bands.insert(*band);
            } else {
                state.draft.review_bands.remove(band);
            }
            draft_changed = true;
        }
    }

    // Cities
    egui::CollapsingHeader::new("Cities")
        .id_salt("filter_cities")
        .default_open(false)
        .show(ui, |ui| {
            for city in data.cities() {
                let mut checked = state.draft.cities.contains(city);
                if ui.checkbox(&mut checked, city).changed() {
                    if checked {
                        state.draft.cities.insert(city.to_string());
                    } else {
                        state.draft.cities.remove(city);
                    }
                    draft_changed = true;
                }
            }
        });

    ui.separator();

    // Review constraints
    ui.label("Review dates (YYYY-MM-DD):");
    let mut dates_changed = false;
    ui.horizontal(|ui| {
        dates_changed |= ui
            .add(egui::TextEdit::singleline(&mut state.date_inputs[0]).desired_width(90.0))
            .changed();
        ui.label("to");
        dates_changed |= ui
            .add(egui::TextEdit::singleline(&mut state.date_inputs[1]).desired_width(90.0))
            .changed();
    });

    ui.label("Review text (regex):");
    draft_changed |= ui
        .text_edit_singleline(&mut state.draft.review_regex)
        .changed();

    if dates_changed {
        changed |= state.commit_date_inputs();
    } else if draft_changed {
        changed |= state.commit_draft();
    }

    if let Some(ref err) = state.filter_error {
        ui.add_space(4.0);
        ui.label(
            egui::RichText::new(err)
                .color(theme::WARNING_TEXT)
                .size(11.5),
        );
    }

    changed
}
