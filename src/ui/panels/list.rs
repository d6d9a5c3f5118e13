// PharmaLens - ui/panels/list.rs
//
// List view: one card per pharmacy with its filtered reviews.

use crate::app::state::SessionState;
use crate::core::views::{ListRow, ListSort};
use crate::ui::theme;
use crate::util::constants::MAX_REVIEWS_PER_CARD;

fn card(ui: &mut egui::Ui, row: &ListRow) {
    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&row.name).strong().size(16.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(format!("#{}", row.rank)).weak());
            });
        });
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(format!(
                    "{} {:.1}",
                    theme::stars(row.average_rating),
                    row.average_rating
                ))
                .color(theme::rating_colour(row.average_rating)),
            );
            ui.label(format!("{} reviews ({})", row.total_reviews, row.review_band));
        });
        ui.label(&row.address);
        if let Some(ref link) = row.phone_link {
            ui.hyperlink_to(link.trim_start_matches("tel:"), link);
        }

        egui::CollapsingHeader::new(format!("Reviews: {}", row.digest.label()))
            .id_salt(("list_reviews", row.pharmacy_id.as_str()))
            .default_open(false)
            .show(ui, |ui| {
                if row.reviews.is_empty() {
                    ui.label(egui::RichText::new("No reviews match the current filters.").weak());
                }
                for review in row.reviews.iter().take(MAX_REVIEWS_PER_CARD) {
                    ui.horizontal(|ui| {
                        ui.label(
                            egui::RichText::new(review.timestamp.format("%Y-%m-%d").to_string())
                                .monospace()
                                .size(11.5),
                        );
                        ui.label(
                            egui::RichText::new(theme::stars(review.rating))
                                .color(theme::rating_colour(review.rating)),
                        );
                        if !review.reviewer.is_empty() {
                            ui.label(egui::RichText::new(&review.reviewer).weak());
                        }
                    });
                    if !review.text.is_empty() {
                        ui.label(&review.text);
                    }
                    ui.add_space(4.0);
                }
                if row.reviews.len() > MAX_REVIEWS_PER_CARD {
                    ui.label(
                        egui::RichText::new(format!(
                            "... and {} more",
                            row.reviews.len() - MAX_REVIEWS_PER_CARD
                        ))
                        .weak(),
                    );
                }
            });
    });
}

/// Render the list. Returns true when the sort order changed.
pub fn render(ui: &mut egui::Ui, rows: &[ListRow], state: &mut SessionState) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(format!("{} pharmacies", rows.len()));
        ui.separator();
        ui.label("Sort by:");
        egui::ComboBox::from_id_salt("list_sort")
            .selected_text(state.list_sort.label())
            .show_ui(ui, |ui| {
                for sort in ListSort::all() {
                    changed |= ui
                        .selectable_value(&mut state.list_sort, *sort, sort.label())
                        .changed();
                }
            });
    });
    ui.separator();

    if rows.is_empty() {
        ui.label("No pharmacies match the current filters.");
        return changed;
    }

    egui::ScrollArea::vertical()
        .id_salt("list_cards")
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            for row in rows {
                card(ui, row);
                ui.add_space(6.0);
            }
        });
    changed
}
