// PharmaLens - ui/panels/load_summary.rs
//
// Load summary window: dataset sizes, what the loader dropped, and any
// configuration or load warnings collected this session.

use crate::app::dataset::DataPaths;
use crate::app::state::SessionState;
use crate::core::model::DataSet;
use crate::ui::theme;

/// Render the load summary dialog (if `state.show_load_summary` is true).
pub fn render(
    ctx: &egui::Context,
    state: &mut SessionState,
    data: &DataSet,
    paths: Option<&DataPaths>,
) {
    if !state.show_load_summary {
        return;
    }

    let mut open = true;
    egui::Window::new("Load Summary")
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .min_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.strong("Overview");
            egui::Grid::new("load_overview")
                .num_columns(2)
                .spacing([16.0, 4.0])
                .show(ui, |ui| {
                    if let Some(paths) = paths {
                        ui.label("Pharmacy source:");
                        ui.label(
                            egui::RichText::new(paths.pharmacies.display().to_string())
                                .monospace()
                                .size(11.5),
                        );
                        ui.end_row();
                        ui.label("Review source:");
                        ui.label(
                            egui::RichText::new(paths.reviews.display().to_string())
                                .monospace()
                                .size(11.5),
                        );
                        ui.end_row();
                    }

                    ui.label("Pharmacies loaded:");
                    ui.label(data.pharmacies.len().to_string());
                    ui.end_row();

                    ui.label("Reviews loaded:");
                    ui.label(data.reviews.len().to_string());
                    ui.end_row();

                    if let Some((first, last)) = data.review_span() {
                        ui.label("Review period:");
                        ui.label(format!(
                            "{} \u{2013} {}",
                            first.format("%Y-%m-%d"),
                            last.format("%Y-%m-%d")
                        ));
                        ui.end_row();
                    }

                    let counters = [
                        ("Orphan reviews:", data.report.orphan_reviews),
                        ("Rejected pharmacies:", data.report.rejected_pharmacies),
                        ("Duplicate pharmacies:", data.report.duplicate_pharmacies),
                        ("Rejected reviews:", data.report.rejected_reviews),
                    ];
                    for (label, count) in counters {
                        ui.label(label);
                        let colour = if count > 0 {
                            theme::WARNING_TEXT
                        } else {
                            ui.style().visuals.text_color()
                        };
                        ui.colored_label(colour, count.to_string());
                        ui.end_row();
                    }
                });

            if !state.warnings.is_empty() {
                ui.add_space(8.0);
                ui.separator();
                ui.strong(format!("Warnings ({})", state.warnings.len()));

                egui::ScrollArea::vertical()
                    .id_salt("load_warnings")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        for warn in &state.warnings {
                            ui.label(
                                egui::RichText::new(warn)
                                    .color(theme::WARNING_TEXT)
                                    .size(11.5),
                            );
                        }
                    });
            }

            ui.add_space(8.0);
            ui.separator();
            if ui.button("Close").clicked() {
                state.show_load_summary = false;
            }
        });

    if !open {
        state.show_load_summary = false;
    }
}
