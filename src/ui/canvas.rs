//! Central canvas UI: aquifer boundary, well clusters and well popups.

use crate::geo::{hit_test, render_layers, LayerStore, MapProjection, WellMarker};
use eframe::egui::{self, Color32, Pos2, Rect, RichText, Sense, Vec2};

/// Zoom/pan state of the map plus the open popup.
#[derive(Debug)]
pub struct MapView {
    pub zoom: f32,
    pub pan_offset: Vec2,
    /// Viewport revision the zoom/pan was last reset for.
    viewport_revision: u64,
    /// Well whose popup is open.
    open_popup: Option<String>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
            viewport_revision: 0,
            open_popup: None,
        }
    }
}

impl MapView {
    /// Resets zoom/pan when the layer store fitted a new viewport.
    fn sync_viewport(&mut self, revision: u64) {
        if revision != self.viewport_revision {
            self.viewport_revision = revision;
            self.zoom = 1.0;
            self.pan_offset = Vec2::ZERO;
        }
    }

    /// Zooms by `factor` keeping `anchor` stationary on screen.
    fn zoom_at(&mut self, factor: f32, anchor: Pos2, rect: &Rect) {
        let old_zoom = self.zoom;
        let new_zoom = (old_zoom * factor).clamp(0.1, 500.0);
        let anchor_rel = anchor - rect.center();
        let ratio = new_zoom / old_zoom;
        self.pan_offset = anchor_rel * (1.0 - ratio) + self.pan_offset * ratio;
        self.zoom = new_zoom;
    }
}

pub fn render_canvas(ctx: &egui::Context, layers: &LayerStore, view: &mut MapView) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let available_size = ui.available_size();
        let (response, painter) = ui.allocate_painter(available_size, Sense::click_and_drag());
        let rect = response.rect;

        painter.rect_filled(rect, 0.0, Color32::from_rgb(20, 20, 35));

        view.sync_viewport(layers.viewport().revision);
        let mut projection = MapProjection::from_viewport(layers.viewport());
        projection.update(view.zoom, view.pan_offset, rect);

        let clusters = render_layers(&painter, layers, &projection);

        if layers.boundary().is_none() && layers.markers().is_empty() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No aquifer loaded",
                egui::FontId::proportional(14.0),
                Color32::from_rgb(120, 120, 140),
            );
        } else if let Some(boundary) = layers.boundary() {
            painter.text(
                rect.left_bottom() + Vec2::new(10.0, -10.0),
                egui::Align2::LEFT_BOTTOM,
                format!("Aquifer {}", boundary.aquifer_id),
                egui::FontId::proportional(12.0),
                Color32::from_rgb(200, 200, 220),
            );
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                match hit_test(&clusters, pos) {
                    Some(cluster) if cluster.is_single() => {
                        if let Some(marker) = cluster
                            .members
                            .first()
                            .and_then(|&i| layers.markers().get(i))
                        {
                            view.open_popup = Some(marker.well_id.clone());
                            marker.click();
                            ctx.request_repaint();
                        }
                    }
                    Some(cluster) => view.zoom_at(2.0, cluster.center, &rect),
                    None => view.open_popup = None,
                }
            }
        }

        draw_coordinates(ui, &rect, &response, &projection);
        handle_canvas_interaction(&response, &rect, view);

        if let Some(well_id) = view.open_popup.clone() {
            match layers.markers().iter().find(|m| m.well_id == well_id) {
                Some(marker) => {
                    let anchor = projection.geo_to_screen(marker.location);
                    if !show_popup(ctx, marker, anchor) {
                        view.open_popup = None;
                    }
                }
                // The well layer was replaced
                None => view.open_popup = None,
            }
        }
    });
}

/// Draws the popup of a marker. Returns false once it was closed.
fn show_popup(ctx: &egui::Context, marker: &WellMarker, anchor: Pos2) -> bool {
    let mut keep_open = true;
    egui::Area::new(egui::Id::new("well_popup"))
        .fixed_pos(anchor + Vec2::new(10.0, -10.0))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Well").strong());
                    if ui.small_button("x").clicked() {
                        keep_open = false;
                    }
                });
                ui.label(RichText::new(&marker.popup).monospace().size(12.0));
            });
        });
    keep_open
}

fn draw_coordinates(
    ui: &mut egui::Ui,
    rect: &Rect,
    response: &egui::Response,
    projection: &MapProjection,
) {
    let Some(hover) = response.hover_pos() else {
        return;
    };
    let geo = projection.screen_to_geo(hover);
    let overlay_rect = Rect::from_min_size(rect.left_top() + Vec2::new(10.0, 10.0), Vec2::new(180.0, 20.0));

    ui.scope_builder(egui::UiBuilder::new().max_rect(overlay_rect), |ui| {
        ui.label(
            RichText::new(format!("{:.4}, {:.4}", geo.y, geo.x))
                .monospace()
                .size(12.0)
                .color(Color32::from_rgb(200, 200, 220)),
        );
    });
}

fn handle_canvas_interaction(response: &egui::Response, rect: &Rect, view: &mut MapView) {
    if response.dragged() {
        view.pan_offset += response.drag_delta();
    }

    // Zoom relative to cursor position
    if response.hovered() {
        let scroll_delta = response.ctx.input(|i| i.raw_scroll_delta);
        if scroll_delta.y != 0.0 {
            if let Some(cursor_pos) = response.hover_pos() {
                view.zoom_at(1.0 + scroll_delta.y * 0.001, cursor_pos, rect);
            }
        }
    }

    if response.double_clicked() {
        view.zoom = 1.0;
        view.pan_offset = Vec2::ZERO;
    }
}
