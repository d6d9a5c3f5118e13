// PharmaLens - ui/panels/analysis.rs
//
// Reviews Analysis page: KPI tiles, bar charts of the aggregated series,
// top-performing pharmacies and most frequent review words.

use crate::app::render::AnalysisView;
use crate::app::state::SessionState;
use crate::core::aggregate::Granularity;
use crate::core::views::{self, ChartSeries, NO_DATA};
use crate::ui::theme;

/// Paint one bar chart. Hovering a bar shows its label and value.
fn bar_chart(ui: &mut egui::Ui, chart: &ChartSeries) {
    ui.strong(&chart.title);
    let width = ui.available_width();
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(width, theme::CHART_HEIGHT), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_stroke(
        rect,
        2.0,
        egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
        egui::StrokeKind::Inside,
    );

    let text_colour = ui.visuals().weak_text_color();
    let font = egui::FontId::proportional(10.0);
    let max = chart.max_value();
    if chart.points.is_empty() || max <= 0.0 {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            NO_DATA,
            font,
            text_colour,
        );
        return;
    }

    // Leave room for the axis labels.
    let plot = egui::Rect::from_min_max(
        rect.min + egui::vec2(28.0, 6.0),
        rect.max - egui::vec2(6.0, 18.0),
    );
    let slot = plot.width() / chart.points.len() as f32;
    let bar_w = (slot * 0.8).max(1.0);

    painter.text(
        egui::pos2(rect.left() + 2.0, plot.top()),
        egui::Align2::LEFT_TOP,
        format!("{max:.1}"),
        font.clone(),
        text_colour,
    );
    painter.text(
        egui::pos2(rect.left() + 2.0, plot.bottom()),
        egui::Align2::LEFT_BOTTOM,
        "0",
        font.clone(),
        text_colour,
    );

    // Show at most ~12 x-axis labels so they do not overlap.
    let label_every = (chart.points.len() / 12).max(1);
    let mut hovered = None;
    for (i, (label, value)) in chart.points.iter().enumerate() {
        let x = plot.left() + slot * i as f32 + (slot - bar_w) / 2.0;
        let h = (value / max) as f32 * plot.height();
        let bar = egui::Rect::from_min_max(
            egui::pos2(x, plot.bottom() - h),
            egui::pos2(x + bar_w, plot.bottom()),
        );
        painter.rect_filled(bar, 1.0, theme::BAR);

        if i % label_every == 0 {
            painter.text(
                egui::pos2(x + bar_w / 2.0, rect.bottom() - 2.0),
                egui::Align2::CENTER_BOTTOM,
                label,
                font.clone(),
                text_colour,
            );
        }

        let column = egui::Rect::from_x_y_ranges(x..=x + bar_w, plot.y_range());
        if response.hover_pos().is_some_and(|p| column.contains(p)) {
            hovered = Some((label, *value));
        }
    }

    if let Some((label, value)) = hovered {
        response.on_hover_text_at_pointer(format!(
            "{}: {label}\n{}: {value:.2}",
            chart.x_label, chart.y_label
        ));
    }
}

/// Render the analysis page. Returns true when the granularity changed.
pub fn render(ui: &mut egui::Ui, analysis: &AnalysisView, state: &mut SessionState) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label("Reviews per:");
        for g in Granularity::all() {
            changed |= ui
                .selectable_value(&mut state.analysis.granularity, *g, g.label())
                .changed();
        }
    });
    ui.separator();

    egui::ScrollArea::vertical()
        .id_salt("analysis_page")
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            // KPI tiles
            ui.horizontal_wrapped(|ui| {
                for kpi in &analysis.kpis {
                    ui.group(|ui| {
                        ui.set_width(theme::KPI_WIDTH);
                        ui.vertical(|ui| {
                            ui.label(egui::RichText::new(kpi.label).small().weak());
                            ui.label(egui::RichText::new(&kpi.value).size(20.0).strong());
                        });
                    });
                }
            });
            ui.add_space(8.0);

            let Some(ref charts) = analysis.charts else {
                ui.label("No reviews match the current filters.");
                return;
            };
            for chart in charts.iter() {
                bar_chart(ui, chart);
                ui.add_space(10.0);
            }

            ui.columns(2, |cols| {
                cols[0].strong("Top performing places");
                egui::Grid::new("analysis_top_places")
                    .num_columns(3)
                    .striped(true)
                    .spacing([12.0, 3.0])
                    .show(&mut cols[0], |ui| {
                        ui.strong("Pharmacy");
                        ui.strong("Rating");
                        ui.strong("Reviews");
                        ui.end_row();
                        for (name, rating, total) in views::top_place_rows(&analysis.top_places) {
                            ui.label(name);
                            ui.label(rating);
                            ui.label(total);
                            ui.end_row();
                        }
                    });

                cols[1].strong("Most frequent words");
                if let Some(ref summary) = analysis.summary {
                    egui::Grid::new("analysis_terms")
                        .num_columns(2)
                        .striped(true)
                        .spacing([12.0, 3.0])
                        .show(&mut cols[1], |ui| {
                            for term in &summary.frequent_terms {
                                ui.label(&term.term);
                                ui.label(term.count.to_string());
                                ui.end_row();
                            }
                        });
                }
            });
        });
    changed
}
