// PharmaLens - ui/panels/map.rs
//
// Map view: pharmacies painted as coloured markers on an equirectangular
// projection of the marker bounding box. Hover shows the popup card;
// click narrows the dashboard to that pharmacy.

use crate::app::state::SessionState;
use crate::core::model::MarkerColour;
use crate::core::views::{MapMarker, MapView};
use crate::ui::theme;
use egui::{Pos2, Rect};

/// Degrees added around the marker bounding box.
const MAP_PADDING_DEG: f64 = 0.05;

/// Linear lat/lon to screen mapping that preserves the local aspect ratio.
struct Projection {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    lon_scale: f64,
    pixels_per_deg: f64,
    origin: Pos2,
}

impl Projection {
    fn fit(view: &MapView, rect: Rect) -> Self {
        let (min_lat, min_lon, max_lat, max_lon) = view
            .bounds()
            .unwrap_or((view.centre.0, view.centre.1, view.centre.0, view.centre.1));
        let (min_lat, max_lat) = (min_lat - MAP_PADDING_DEG, max_lat + MAP_PADDING_DEG);
        let (min_lon, max_lon) = (min_lon - MAP_PADDING_DEG, max_lon + MAP_PADDING_DEG);

        // Longitude degrees shrink with latitude.
        let lon_scale = view.centre.0.to_radians().cos().max(0.01);
        let width_deg = (max_lon - min_lon) * lon_scale;
        let height_deg = max_lat - min_lat;
        let pixels_per_deg = (f64::from(rect.width()) / width_deg)
            .min(f64::from(rect.height()) / height_deg);

        // Centre the projected box inside the rect.
        let used_w = (width_deg * pixels_per_deg) as f32;
        let used_h = (height_deg * pixels_per_deg) as f32;
        let origin = Pos2::new(
            rect.left() + (rect.width() - used_w) / 2.0,
            rect.top() + (rect.height() - used_h) / 2.0,
        );

        Self {
            min_lat,
            max_lat,
            min_lon,
            lon_scale,
            pixels_per_deg,
            origin,
        }
    }

    fn project(&self, lat: f64, lon: f64) -> Pos2 {
        let x = (lon - self.min_lon) * self.lon_scale * self.pixels_per_deg;
        let y = (self.max_lat - lat) * self.pixels_per_deg;
        Pos2::new(self.origin.x + x as f32, self.origin.y + y as f32)
    }
}

fn popup_ui(ui: &mut egui::Ui, marker: &MapMarker) {
    let popup = &marker.popup;
    ui.strong(&popup.name);
    ui.label(&popup.address);
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(format!(
                "{} {}",
                popup.rating,
                theme::stars(popup.average_rating)
            ))
            .color(theme::rating_colour(popup.average_rating)),
        );
        ui.label(format!("({} reviews)", popup.total_reviews));
    });
    if let Some(ref link) = popup.phone_link {
        ui.label(link.trim_start_matches("tel:"));
    }
    ui.label(egui::RichText::new(format!("Filtered: {}", popup.reviews.label())).weak());
    ui.label(egui::RichText::new("Click to show only this pharmacy").small().weak());
}

/// Render the map. Returns true when a marker click changed the filter.
pub fn render(ui: &mut egui::Ui, map: &MapView, state: &mut SessionState) -> bool {
    ui.horizontal(|ui| {
        ui.label(format!("{} pharmacies", map.markers.len()));
        ui.separator();
        for (colour, label) in [
            (MarkerColour::Green, "100+ reviews"),
            (MarkerColour::Orange, "50+"),
            (MarkerColour::LightGray, "25+"),
            (MarkerColour::Red, "fewer"),
        ] {
            let (dot, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
            ui.painter()
                .circle_filled(dot.center(), 4.5, theme::marker_colour(colour));
            ui.label(egui::RichText::new(label).small());
        }
    });

    let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click());
    let rect = response.rect;
    painter.rect_filled(rect, 4.0, theme::MAP_BG);

    if map.markers.is_empty() {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "No pharmacies match the current filters",
            egui::FontId::proportional(16.0),
            theme::MAP_GRID,
        );
        return false;
    }

    let projection = Projection::fit(map, rect.shrink(theme::MARKER_RADIUS * 2.0));

    // Faint graticule every 0.5 degrees of latitude.
    let mut lat = (projection.min_lat * 2.0).ceil() / 2.0;
    while lat <= projection.max_lat {
        let y = projection.project(lat, projection.min_lon).y;
        painter.hline(rect.x_range(), y, egui::Stroke::new(1.0, theme::MAP_GRID));
        lat += 0.5;
    }

    // Later markers are drawn on top.
    let positions: Vec<Pos2> = map
        .markers
        .iter()
        .map(|m| projection.project(m.latitude, m.longitude))
        .collect();
    for (marker, pos) in map.markers.iter().zip(&positions) {
        painter.circle(
            *pos,
            theme::MARKER_RADIUS,
            theme::marker_colour(marker.colour),
            egui::Stroke::new(1.0, egui::Color32::BLACK),
        );
    }

    // Topmost marker under the pointer.
    let hovered = response.hover_pos().and_then(|pointer| {
        positions
            .iter()
            .rposition(|p| p.distance(pointer) <= theme::MARKER_RADIUS + 2.0)
    });

    let mut changed = false;
    if let Some(idx) = hovered {
        let marker = &map.markers[idx];
        painter.circle_stroke(
            positions[idx],
            theme::MARKER_RADIUS + 3.0,
            egui::Stroke::new(2.0, egui::Color32::WHITE),
        );
        if response.clicked() {
            state.draft.pharmacy_id = Some(marker.pharmacy_id.clone());
            changed = state.commit_draft();
            if changed {
                state.status_message = format!("Showing {}", marker.popup.name);
            }
        }
        response.on_hover_ui_at_pointer(|ui| popup_ui(ui, marker));
    }
    changed
}
