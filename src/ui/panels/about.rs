// PharmaLens - ui/panels/about.rs
//
// About dialog, opened from View > About.

use crate::app::state::SessionState;
use crate::util::constants::{APP_NAME, APP_VERSION};

pub fn render(ctx: &egui::Context, state: &mut SessionState) {
    if !state.show_about {
        return;
    }

    egui::Window::new(format!("About {APP_NAME}"))
        .open(&mut state.show_about)
        .collapsible(false)
        .resizable(false)
        .min_width(320.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(egui::RichText::new(format!("\u{2695} {APP_NAME}")).strong());
                ui.label("Pharmacy listings on a map, in a list and as review statistics.");
            });
            ui.separator();

            egui::Grid::new("about_facts")
                .num_columns(2)
                .spacing([16.0, 4.0])
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Version").weak());
                    ui.label(APP_VERSION);
                    ui.end_row();
                    ui.label(egui::RichText::new("License").weak());
                    ui.label("MIT");
                    ui.end_row();
                    ui.label(egui::RichText::new("Toolkit").weak());
                    ui.label("Rust, egui");
                    ui.end_row();
                });
        });
}
