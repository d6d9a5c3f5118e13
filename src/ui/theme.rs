// PharmaLens - ui/theme.rs
//
// Colour scheme, marker/rating colour mapping, and layout constants.
// No dependencies on app state or business logic.

use crate::core::model::MarkerColour;
use egui::Color32;

/// Fill colour for a map marker.
pub fn marker_colour(colour: MarkerColour) -> Color32 {
    match colour {
        MarkerColour::Green => Color32::from_rgb(22, 163, 74),      // Green 600
        MarkerColour::Orange => Color32::from_rgb(234, 88, 12),     // Orange 600
        MarkerColour::LightGray => Color32::from_rgb(209, 213, 219), // Gray 300
        MarkerColour::Red => Color32::from_rgb(220, 38, 38),        // Red 600
    }
}

/// Text colour for an average rating: red below 3, amber below 4, green above.
pub fn rating_colour(rating: f64) -> Color32 {
    if rating >= 4.0 {
        Color32::from_rgb(74, 222, 128) // Green 400
    } else if rating >= 3.0 {
        Color32::from_rgb(251, 191, 36) // Amber 400
    } else {
        Color32::from_rgb(248, 113, 113) // Red 400
    }
}

/// Five-character star string for a 0-5 rating, e.g. "★★★★☆".
pub fn stars(rating: f64) -> String {
    let full = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "\u{2605}".repeat(full), "\u{2606}".repeat(5 - full))
}

/// Chart bar colour.
pub const BAR: Color32 = Color32::from_rgb(59, 130, 246); // Blue 500

/// Warning text colour.
pub const WARNING_TEXT: Color32 = Color32::from_rgb(253, 186, 116); // Orange 300

/// Map background and grid.
pub const MAP_BG: Color32 = Color32::from_rgb(30, 41, 59); // Slate 800
pub const MAP_GRID: Color32 = Color32::from_rgb(51, 65, 85); // Slate 700

/// Layout constants.
pub const SIDEBAR_WIDTH: f32 = 260.0;
pub const MARKER_RADIUS: f32 = 6.0;
pub const CHART_HEIGHT: f32 = 180.0;
pub const KPI_WIDTH: f32 = 150.0;
