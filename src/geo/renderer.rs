//! Map layer rendering.
//!
//! Renders the boundary and well cluster layers to the egui canvas.

use super::cluster::{cluster_positions, MarkerCluster, CLUSTER_CELL_PX};
use super::layer::{BoundaryLayer, LayerStore, LayerStyle};
use super::MapProjection;
use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Stroke};
use geo_types::LineString;

/// Renders both layers and returns the clusters drawn for hit testing.
pub fn render_layers(
    painter: &Painter,
    layers: &LayerStore,
    projection: &MapProjection,
) -> Vec<MarkerCluster> {
    if let Some(boundary) = layers.boundary() {
        render_boundary(painter, boundary, projection);
    }

    let positions: Vec<Pos2> = layers
        .markers()
        .iter()
        .map(|m| projection.geo_to_screen(m.location))
        .collect();
    if let Some(wells) = layers.wells() {
        render_well_features(painter, &positions, &wells.style);
    }

    let clusters = cluster_positions(&positions, CLUSTER_CELL_PX);

    for cluster in &clusters {
        if projection.is_on_screen(cluster.center, cluster.icon_radius()) {
            render_cluster(painter, cluster);
        }
    }

    clusters
}

/// Renders an aquifer outline with its layer style.
fn render_boundary(painter: &Painter, layer: &BoundaryLayer, projection: &MapProjection) {
    let stroke = layer.style.stroke();

    for polygon in layer.geometry.polygons.iter() {
        render_ring(painter, polygon.exterior(), projection, stroke);
        for hole in polygon.interiors() {
            render_ring(painter, hole, projection, stroke);
        }
    }
}

/// Renders the well point geometries under their markers.
fn render_well_features(painter: &Painter, positions: &[Pos2], style: &LayerStyle) {
    if style.is_invisible() {
        return;
    }
    for pos in positions {
        painter.circle(*pos, FEATURE_POINT_RADIUS, style.fill(), style.stroke());
    }
}

const FEATURE_POINT_RADIUS: f32 = 4.0;

/// Renders a closed ring as connected segments.
fn render_ring(painter: &Painter, ring: &LineString<f64>, projection: &MapProjection, stroke: Stroke) {
    if ring.0.len() < 2 {
        return;
    }

    let screen_points: Vec<Pos2> = ring
        .coords()
        .map(|c| projection.geo_to_screen(*c))
        .collect();

    for window in screen_points.windows(2) {
        if let [p1, p2] = window {
            // Skip sub-pixel segments
            let dist_sq = (p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2);
            if dist_sq > 0.5 {
                painter.line_segment([*p1, *p2], stroke);
            }
        }
    }
}

/// Renders a single marker pin or a numbered cluster icon.
fn render_cluster(painter: &Painter, cluster: &MarkerCluster) {
    let radius = cluster.icon_radius();

    if cluster.is_single() {
        painter.circle_filled(cluster.center, radius, Color32::from_rgb(230, 90, 60));
        painter.circle_stroke(cluster.center, radius, Stroke::new(1.5, Color32::WHITE));
        return;
    }

    let fill = match cluster.digits() {
        1 => Color32::from_rgba_unmultiplied(110, 204, 57, 220),
        2 => Color32::from_rgba_unmultiplied(240, 194, 12, 220),
        _ => Color32::from_rgba_unmultiplied(241, 128, 23, 220),
    };
    painter.circle_filled(cluster.center, radius, fill);
    painter.circle_stroke(cluster.center, radius, Stroke::new(2.0, Color32::from_black_alpha(90)));
    painter.text(
        cluster.center,
        Align2::CENTER_CENTER,
        cluster.count().to_string(),
        FontId::proportional(12.0),
        Color32::BLACK,
    );
}
