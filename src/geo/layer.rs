//! Renderable map layers: the aquifer boundary and the well cluster layer.
//!
//! Each layer is rebuilt off to the side and swapped in with a single
//! assignment, so a render pass sees either the complete old contents or
//! the complete new contents.

use super::feature::{BoundaryGeometry, WellFeature};
use super::popup::{PopupBinder, WellMarker};
use eframe::egui::{Color32, Stroke};
use geo_types::{Coord, Rect};

/// Stroke style of a rendered layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub color: Color32,
    pub weight: f32,
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl LayerStyle {
    pub fn stroke(&self) -> Stroke {
        Stroke::new(self.weight, self.color.gamma_multiply(self.opacity))
    }

    pub fn fill(&self) -> Color32 {
        self.color.gamma_multiply(self.fill_opacity)
    }

    /// True when neither stroke nor fill would leave a mark.
    pub fn is_invisible(&self) -> bool {
        (self.weight <= 0.0 || self.opacity <= 0.0) && self.fill_opacity <= 0.0
    }
}

/// Aquifer outlines: solid blue stroke, no fill.
pub const BOUNDARY_STYLE: LayerStyle = LayerStyle {
    color: Color32::from_rgb(0x2d, 0x84, 0xc8),
    weight: 4.0,
    opacity: 1.0,
    fill_opacity: 0.0,
};

/// Well features carry no stroke or fill of their own; markers and
/// cluster icons are what the user sees.
pub const WELL_STYLE: LayerStyle = LayerStyle {
    color: Color32::WHITE,
    weight: 0.0,
    opacity: 0.0,
    fill_opacity: 0.0,
};

/// The visible map region, expressed as a center and a half-span in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub center: Coord<f64>,
    pub range_deg: f64,
    /// Incremented whenever the view is refit, so the canvas can reset pan/zoom.
    pub revision: u64,
}

impl Default for Viewport {
    fn default() -> Self {
        // Whole-world view until the first boundary arrives.
        Self {
            center: Coord { x: 0.0, y: 0.0 },
            range_deg: 90.0,
            revision: 0,
        }
    }
}

impl Viewport {
    /// Smallest half-span the view will zoom to when fitting.
    const MIN_RANGE_DEG: f64 = 0.01;
    /// Margin around fitted bounds.
    const PADDING: f64 = 1.1;

    /// Centers the view on `bounds` with a small margin.
    pub fn fit_bounds(&mut self, bounds: Rect<f64>) {
        let center = bounds.center();
        let lat_correction = center.y.to_radians().cos().abs().max(0.01);
        let half_width = bounds.width() * lat_correction / 2.0;
        let half_height = bounds.height() / 2.0;

        self.center = center;
        self.range_deg = (half_width.max(half_height) * Self::PADDING).max(Self::MIN_RANGE_DEG);
        self.revision += 1;
    }
}

/// The rendered outline of one aquifer.
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    pub aquifer_id: String,
    pub geometry: BoundaryGeometry,
    pub style: LayerStyle,
}

/// The marker cluster layer for one aquifer's wells.
#[derive(Debug, Clone)]
pub struct WellClusterLayer {
    pub aquifer_id: String,
    pub markers: Vec<WellMarker>,
    pub style: LayerStyle,
}

/// Owner of the boundary and well layers plus the map viewport.
#[derive(Debug, Default)]
pub struct LayerStore {
    boundary: Option<BoundaryLayer>,
    wells: Option<WellClusterLayer>,
    viewport: Viewport,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the boundary layer and fits the viewport to it.
    pub fn replace_boundary(&mut self, aquifer_id: &str, geometry: BoundaryGeometry) {
        let bounds = geometry.bounds();
        let layer = BoundaryLayer {
            aquifer_id: aquifer_id.to_string(),
            geometry,
            style: BOUNDARY_STYLE,
        };

        self.boundary = Some(layer);
        if let Some(bounds) = bounds {
            self.viewport.fit_bounds(bounds);
        }
        log::info!("Boundary layer now shows aquifer {}", aquifer_id);
    }

    /// Replaces the well layer with one bound marker per feature.
    pub fn replace_wells(
        &mut self,
        aquifer_id: &str,
        features: &[WellFeature],
        binder: &PopupBinder,
    ) {
        let layer = WellClusterLayer {
            aquifer_id: aquifer_id.to_string(),
            markers: features.iter().map(|f| binder.bind(f)).collect(),
            style: WELL_STYLE,
        };

        self.wells = Some(layer);
        log::info!(
            "Well layer now shows {} well(s) for aquifer {}",
            features.len(),
            aquifer_id
        );
    }

    pub fn clear_boundary(&mut self) {
        self.boundary = None;
    }

    pub fn clear_wells(&mut self) {
        self.wells = None;
    }

    pub fn boundary(&self) -> Option<&BoundaryLayer> {
        self.boundary.as_ref()
    }

    pub fn wells(&self) -> Option<&WellClusterLayer> {
        self.wells.as_ref()
    }

    /// Markers of the current well layer (empty when none is loaded).
    pub fn markers(&self) -> &[WellMarker] {
        self.wells.as_ref().map(|l| l.markers.as_slice()).unwrap_or(&[])
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, MultiPolygon};

    fn square(x: f64, y: f64, size: f64) -> BoundaryGeometry {
        BoundaryGeometry {
            polygons: MultiPolygon(vec![polygon![
                (x: x, y: y),
                (x: x + size, y: y),
                (x: x + size, y: y + size),
                (x: x, y: y + size),
            ]]),
        }
    }

    fn well(id: &str) -> WellFeature {
        WellFeature {
            id: id.to_string(),
            location: Coord { x: 1.0, y: 1.0 },
            attributes: vec![("status".to_string(), "active".to_string())],
        }
    }

    #[test]
    fn test_replace_boundary_fits_viewport() {
        let mut store = LayerStore::new();
        store.replace_boundary("24", square(10.0, 0.0, 2.0));

        let layer = store.boundary().unwrap();
        assert_eq!(layer.aquifer_id, "24");
        assert_eq!(layer.style.weight, 4.0);
        assert_eq!(layer.style.fill_opacity, 0.0);

        let viewport = store.viewport();
        assert_eq!(viewport.center, Coord { x: 11.0, y: 1.0 });
        assert_eq!(viewport.revision, 1);
        assert!((viewport.range_deg - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_replace_wells_swaps_whole_layer() {
        let (binder, _events) = PopupBinder::channel();
        let mut store = LayerStore::new();

        store.replace_wells("1", &[well("well.1"), well("well.2"), well("well.3")], &binder);
        assert_eq!(store.markers().len(), 3);

        store.replace_wells("2", &[well("well.9")], &binder);
        let layer = store.wells().unwrap();
        assert_eq!(layer.aquifer_id, "2");
        let ids: Vec<&str> = layer.markers.iter().map(|m| m.well_id.as_str()).collect();
        assert_eq!(ids, vec!["well.9"]);
    }

    #[test]
    fn test_markers_carry_popups() {
        let (binder, _events) = PopupBinder::channel();
        let mut store = LayerStore::new();
        store.replace_wells("1", &[well("well.1")], &binder);

        assert_eq!(store.markers()[0].popup, "well.1\nstatus: active");
    }

    #[test]
    fn test_clear_leaves_other_layer() {
        let (binder, _events) = PopupBinder::channel();
        let mut store = LayerStore::new();
        store.replace_boundary("1", square(0.0, 0.0, 1.0));
        store.replace_wells("1", &[well("well.1")], &binder);

        store.clear_wells();
        assert!(store.wells().is_none());
        assert!(store.boundary().is_some());
        assert!(store.markers().is_empty());
    }

    #[test]
    fn test_well_features_draw_nothing_themselves() {
        let (binder, _events) = PopupBinder::channel();
        let mut store = LayerStore::new();
        store.replace_wells("1", &[well("well.1")], &binder);

        let style = store.wells().unwrap().style;
        assert!(style.is_invisible());
        assert_eq!(style.fill(), Color32::TRANSPARENT);
        assert!(!BOUNDARY_STYLE.is_invisible());
        assert_eq!(BOUNDARY_STYLE.fill(), Color32::TRANSPARENT);
    }
}
