// PharmaLens - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and logging initialisation
// 3. Dataset loading (fatal on error)
// 4. Headless JSON dump, or eframe GUI launch with session restore

mod gui;

// Re-export modules from the library crate so that `gui.rs` can use
// `crate::app::...`, `crate::core::...` etc.
pub use pharmalens::app;
pub use pharmalens::core;
pub use pharmalens::platform;
pub use pharmalens::ui;
pub use pharmalens::util;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::app::dataset::DataPaths;
use crate::app::state::SessionState;
use crate::core::aggregate::Granularity;
use crate::platform::config::{AppConfig, PlatformPaths};
use crate::util::error::PharmaLensError;

/// View printed by `--dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DumpView {
    Map,
    List,
    Analysis,
}

fn parse_granularity(s: &str) -> Result<Granularity, String> {
    Granularity::parse(s).ok_or_else(|| format!("expected day, week or month, got '{s}'"))
}

/// PharmaLens - Pharmacy listing and review dashboard.
///
/// Loads a pharmacy dataset and its customer reviews and shows them as a
/// map, a filterable list and a review analysis page.
#[derive(Parser, Debug)]
#[command(name = "PharmaLens", version, about)]
struct Cli {
    /// Pharmacy dataset (.json or .csv).
    #[arg(short = 'p', long = "pharmacies")]
    pharmacies: Option<PathBuf>,

    /// Review dataset (.json or .csv).
    #[arg(short = 'r', long = "reviews")]
    reviews: Option<PathBuf>,

    /// Configuration file to use instead of the platform default.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Print the rendered view as JSON to stdout instead of opening a window.
    #[arg(long = "dump", value_enum)]
    dump: Option<DumpView>,

    /// Time-series granularity for the analysis view.
    #[arg(short = 'g', long = "granularity", value_parser = parse_granularity)]
    granularity: Option<Granularity>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn exit_with(message: &str) -> ! {
    tracing::error!("{message}");
    eprintln!("Error: {message}");
    std::process::exit(1);
}

/// Apply theme and font size from config.
fn configure_appearance(ctx: &egui::Context, config: &AppConfig) {
    ctx.set_visuals(if config.dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    });
    let size = config.font_size;
    ctx.style_mut(|style| {
        for (text_style, font) in style.text_styles.iter_mut() {
            match text_style {
                egui::TextStyle::Body | egui::TextStyle::Button | egui::TextStyle::Monospace => {
                    font.size = size;
                }
                egui::TextStyle::Heading => font.size = size * 1.4,
                egui::TextStyle::Small => font.size = size * 0.75,
                _ => {}
            }
        }
    });
}

fn main() {
    let cli = Cli::parse();
    let platform_paths = PlatformPaths::resolve();

    // Explicit --config must load; the default location may be absent or broken.
    let (config, config_warnings) = match cli.config {
        Some(ref path) => match platform::config::load_config_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                util::logging::init(cli.debug, None, None);
                exit_with(&PharmaLensError::from(e).to_string());
            }
        },
        None => platform::config::load_config(&platform_paths.config_dir),
    };

    util::logging::init(
        cli.debug,
        config.log_level.as_deref(),
        config.log_file.as_deref(),
    );

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "PharmaLens starting"
    );
    for warning in &config_warnings {
        tracing::warn!("{warning}");
    }

    let mut state = SessionState::new(&config, cli.debug);
    for warning in config_warnings {
        state.add_warning(warning);
    }

    // Session restore is GUI-only so dumps depend on arguments and config alone.
    let session_file = app::session::session_path(&platform_paths.data_dir);
    let saved = if cli.dump.is_none() {
        app::session::load(&session_file)
    } else {
        None
    };
    if let Some(ref saved) = saved {
        state.restore(saved);
    }
    if let Some(g) = cli.granularity {
        state.analysis.granularity = g;
    }

    // Paths: CLI > config > last session > default file names.
    let names_source = cli.pharmacies.is_some()
        || cli.reviews.is_some()
        || config.pharmacies_path.is_some()
        || config.reviews_path.is_some();
    let paths = match saved.and_then(|s| s.data_paths) {
        Some(previous) if !names_source => previous,
        _ => DataPaths::resolve(cli.pharmacies.clone(), cli.reviews.clone(), &config),
    };

    let data = match app::dataset::load_from_paths(&paths) {
        Ok(data) => data,
        Err(e) => exit_with(&PharmaLensError::from(e).to_string()),
    };
    for line in app::dataset::report_lines(&data) {
        state.add_warning(line);
    }
    state.status_message = format!(
        "Loaded {} pharmacies and {} reviews.",
        data.pharmacies.len(),
        data.reviews.len()
    );
    // A restored selection may name a pharmacy these files do not contain.
    state.drop_unknown_pharmacy(&data);

    if let Some(view) = cli.dump {
        let dashboard = app::render::render(&state, &data);
        let json = match view {
            DumpView::Map => serde_json::to_string_pretty(&dashboard.map),
            DumpView::List => serde_json::to_string_pretty(&dashboard.list),
            DumpView::Analysis => serde_json::to_string_pretty(&dashboard.analysis),
        };
        match json {
            Ok(text) => println!("{text}"),
            Err(e) => exit_with(&format!("Cannot serialise dashboard: {e}")),
        }
        return;
    }

    tracing::info!("Ready to launch GUI");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!(
                "{} v{}",
                util::constants::APP_NAME,
                util::constants::APP_VERSION
            ))
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        util::constants::APP_NAME,
        native_options,
        Box::new(move |cc| {
            configure_appearance(&cc.egui_ctx, &config);
            Ok(Box::new(gui::PharmaLensApp::new(
                state,
                data,
                paths,
                Some(session_file),
            )))
        }),
    );

    if let Err(e) = result {
        exit_with(&format!("Failed to launch GUI: {e}"));
    }
}
