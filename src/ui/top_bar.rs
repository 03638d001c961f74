//! Top bar UI: app title, status line and activity spinner.

use crate::state::StatusMessage;
use eframe::egui::{self, Color32, RichText};

pub fn render_top_bar(ctx: &egui::Context, status: &StatusMessage, busy: bool) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new("Groundwater Level Mapper")
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                if busy {
                    ui.spinner();
                }

                ui.label(
                    RichText::new(&status.text)
                        .size(13.0)
                        .color(status.kind.color()),
                );
            });
        });
}
