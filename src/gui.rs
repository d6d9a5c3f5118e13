// PharmaLens - gui.rs
//
// Top-level eframe::App implementation.
// Wires together all UI panels and recomputes the dashboard whenever an
// interaction changes the session state.

use crate::app::dataset::{self, DataPaths};
use crate::app::render::{self, Dashboard};
use crate::app::session;
use crate::app::state::{SessionState, Tab};
use crate::core::export;
use crate::core::model::DataSet;
use crate::ui;
use crate::util::error::PharmaLensError;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy)]
enum ExportFormat {
    Csv,
    Json,
}

/// The PharmaLens application.
pub struct PharmaLensApp {
    pub state: SessionState,
    data: DataSet,
    paths: DataPaths,
    session_file: Option<PathBuf>,
    dashboard: Dashboard,
}

impl PharmaLensApp {
    /// Create the application around an already loaded dataset.
    pub fn new(
        state: SessionState,
        data: DataSet,
        paths: DataPaths,
        session_file: Option<PathBuf>,
    ) -> Self {
        let dashboard = render::render(&state, &data);
        Self {
            state,
            data,
            paths,
            session_file,
            dashboard,
        }
    }

    fn refresh(&mut self) {
        self.dashboard = render::render(&self.state, &self.data);
    }

    /// Re-read the datasets. On failure the current data stays loaded.
    fn reload(&mut self, paths: DataPaths) {
        match dataset::load_from_paths(&paths) {
            Ok(data) => {
                self.state.warnings.clear();
                for line in dataset::report_lines(&data) {
                    self.state.add_warning(line);
                }
                self.state.status_message = format!(
                    "Loaded {} pharmacies and {} reviews.",
                    data.pharmacies.len(),
                    data.reviews.len()
                );
                self.state.drop_unknown_pharmacy(&data);
                self.data = data;
                self.paths = paths;
                self.refresh();
            }
            Err(e) => {
                let err = PharmaLensError::from(e);
                tracing::error!(error = %err, "Reload failed");
                self.state.status_message = err.to_string();
            }
        }
    }

    fn export_list(&mut self, format: ExportFormat) {
        let (filter_name, ext) = match format {
            ExportFormat::Csv => ("CSV", "csv"),
            ExportFormat::Json => ("JSON", "json"),
        };
        let Some(dest) = rfd::FileDialog::new()
            .add_filter(filter_name, &[ext])
            .set_file_name(format!("pharmacies.{ext}"))
            .save_file()
        else {
            return;
        };

        let file = match std::fs::File::create(&dest) {
            Ok(f) => f,
            Err(e) => {
                self.state.status_message = format!("Cannot create file: {e}");
                return;
            }
        };
        let rows = &self.dashboard.list;
        let result = match format {
            ExportFormat::Csv => export::export_csv(rows, file, &dest),
            ExportFormat::Json => export::export_json(rows, file, &dest),
        };
        self.state.status_message = match result {
            Ok(n) => {
                tracing::info!(rows = n, path = %dest.display(), "List exported");
                format!("Exported {n} pharmacies to {filter_name}.")
            }
            Err(e) => {
                let err = PharmaLensError::from(e);
                tracing::warn!(error = %err, path = %dest.display(), "List export failed");
                err.to_string()
            }
        };
    }

    fn save_session(&self) {
        let Some(ref path) = self.session_file else {
            return;
        };
        let data = self.state.to_session_data(Some(self.paths.clone()));
        if let Err(e) = session::save(&data, path) {
            tracing::warn!(error = %e, "Failed to save session");
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Pharmacies\u{2026}").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Pharmacy data", &["json", "csv"])
                        .pick_file()
                    {
                        let paths = DataPaths {
                            pharmacies: path,
                            reviews: self.paths.reviews.clone(),
                        };
                        self.reload(paths);
                    }
                    ui.close_menu();
                }
                if ui.button("Open Reviews\u{2026}").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Review data", &["json", "csv"])
                        .pick_file()
                    {
                        let paths = DataPaths {
                            pharmacies: self.paths.pharmacies.clone(),
                            reviews: path,
                        };
                        self.reload(paths);
                    }
                    ui.close_menu();
                }
                if ui.button("Reload Data").clicked() {
                    self.reload(self.paths.clone());
                    ui.close_menu();
                }
                ui.separator();
                let has_rows = !self.dashboard.list.is_empty();
                ui.add_enabled_ui(has_rows, |ui| {
                    ui.menu_button("Export List", |ui| {
                        if ui.button("Export CSV...").clicked() {
                            self.export_list(ExportFormat::Csv);
                            ui.close_menu();
                        }
                        if ui.button("Export JSON...").clicked() {
                            self.export_list(ExportFormat::Json);
                            ui.close_menu();
                        }
                    });
                });
                ui.separator();
                if ui.button("Exit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
            ui.menu_button("View", |ui| {
                for tab in Tab::all() {
                    if ui
                        .selectable_label(self.state.active_tab == *tab, tab.label())
                        .clicked()
                    {
                        self.state.active_tab = *tab;
                        ui.close_menu();
                    }
                }
                ui.separator();
                if ui.button("Load Summary").clicked() {
                    self.state.show_load_summary = true;
                    ui.close_menu();
                }
                if ui.button("About").clicked() {
                    self.state.show_about = true;
                    ui.close_menu();
                }
            });
        });
    }
}

impl eframe::App for PharmaLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut dirty = false;

        // Top menu bar and tab strip
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
            ui.horizontal(|ui| {
                for tab in Tab::all() {
                    ui.selectable_value(&mut self.state.active_tab, *tab, tab.label());
                }
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.state.status_message);
                if !self.data.report.is_clean()
                    && ui
                        .small_button(format!("{} warning(s)", self.state.warnings.len()))
                        .clicked()
                {
                    self.state.show_load_summary = true;
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(self.dashboard.counts_label());
                });
            });
        });

        // Left sidebar
        egui::SidePanel::left("sidebar")
            .default_width(ui::theme::SIDEBAR_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("sidebar_filters")
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        dirty |= ui::panels::filters::render(ui, &mut self.state, &self.data);
                    });
            });

        // Central panel (active view)
        egui::CentralPanel::default().show(ctx, |ui| match self.state.active_tab {
            Tab::Map => {
                dirty |= ui::panels::map::render(ui, &self.dashboard.map, &mut self.state);
            }
            Tab::List => {
                dirty |= ui::panels::list::render(ui, &self.dashboard.list, &mut self.state);
            }
            Tab::Analysis => {
                dirty |=
                    ui::panels::analysis::render(ui, &self.dashboard.analysis, &mut self.state);
            }
        });

        // Dialogs
        ui::panels::load_summary::render(ctx, &mut self.state, &self.data, Some(&self.paths));
        ui::panels::about::render(ctx, &mut self.state);

        if dirty {
            self.refresh();
            ctx.request_repaint();
        }
    }

    /// Saves the session so the next launch can restore it.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_session();
    }
}
