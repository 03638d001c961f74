//! Map projection and coordinate transformation.
//!
//! Handles converting between geographic coordinates (lat/lon) and
//! screen coordinates for rendering on the canvas.

use super::layer::Viewport;
use eframe::egui::{Pos2, Rect, Vec2};
use geo_types::Coord;

/// Map projection for converting geographic to screen coordinates.
#[derive(Debug, Clone)]
pub struct MapProjection {
    /// Center latitude of the view
    pub center_lat: f64,
    /// Center longitude of the view
    pub center_lon: f64,
    /// Half-span of the view in degrees at zoom 1.0
    pub range_deg: f64,
    /// Current zoom level
    pub zoom: f32,
    /// Pan offset in screen pixels
    pub pan_offset: Vec2,
    /// Screen rectangle for the canvas
    pub screen_rect: Rect,
}

impl Default for MapProjection {
    fn default() -> Self {
        Self::from_viewport(&Viewport::default())
    }
}

impl MapProjection {
    /// Creates a projection showing the given viewport.
    pub fn from_viewport(viewport: &Viewport) -> Self {
        Self {
            center_lat: viewport.center.y,
            center_lon: viewport.center.x,
            range_deg: viewport.range_deg,
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
            screen_rect: Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        }
    }

    /// Updates the projection with current view state.
    pub fn update(&mut self, zoom: f32, pan_offset: Vec2, screen_rect: Rect) {
        self.zoom = zoom;
        self.pan_offset = pan_offset;
        self.screen_rect = screen_rect;
    }

    fn lat_correction(&self) -> f64 {
        self.center_lat.to_radians().cos().abs().max(0.01)
    }

    /// Converts geographic coordinates (lon, lat) to screen position.
    ///
    /// Equirectangular with a longitude correction at the view center, which
    /// is adequate at aquifer scale.
    pub fn geo_to_screen(&self, coord: Coord<f64>) -> Pos2 {
        let effective_range = self.range_deg / self.zoom as f64;

        let rel_lon = (coord.x - self.center_lon) * self.lat_correction();
        let rel_lat = coord.y - self.center_lat;

        // Normalized -1..1, y flipped since screen y grows downward
        let norm_x = rel_lon / effective_range;
        let norm_y = -rel_lat / effective_range;

        let center = self.screen_rect.center() + self.pan_offset;
        let half_size = self.screen_rect.size().min_elem() / 2.0;

        Pos2::new(
            center.x + (norm_x as f32) * half_size,
            center.y + (norm_y as f32) * half_size,
        )
    }

    /// Converts screen position to geographic coordinates (lon, lat).
    pub fn screen_to_geo(&self, pos: Pos2) -> Coord<f64> {
        let effective_range = self.range_deg / self.zoom as f64;

        let center = self.screen_rect.center() + self.pan_offset;
        let half_size = self.screen_rect.size().min_elem() / 2.0;

        let norm_x = (pos.x - center.x) / half_size;
        let norm_y = (pos.y - center.y) / half_size;

        let rel_lon = (norm_x as f64) * effective_range / self.lat_correction();
        let rel_lat = -(norm_y as f64) * effective_range;

        Coord {
            x: self.center_lon + rel_lon,
            y: self.center_lat + rel_lat,
        }
    }

    /// Checks if a screen position falls on the canvas (with a pixel margin).
    pub fn is_on_screen(&self, pos: Pos2, margin_px: f32) -> bool {
        self.screen_rect.expand(margin_px).contains(pos)
    }
}
