//! Left panel UI: aquifer and variable selection, selected well and the
//! outlier action.

use crate::net::RequestDispatcher;
use crate::state::SelectionController;
use eframe::egui::{self, Color32, RichText};

/// Text typed into the manual id fields, used when no catalog is loaded.
#[derive(Debug, Default)]
pub struct SelectionInputs {
    pub aquifer_id: String,
    pub variable_id: String,
}

pub fn render_left_panel<D: RequestDispatcher>(
    ctx: &egui::Context,
    controller: &mut SelectionController<D>,
    inputs: &mut SelectionInputs,
) {
    egui::SidePanel::left("left_panel")
        .resizable(true)
        .default_width(250.0)
        .min_width(200.0)
        .max_width(400.0)
        .show(ctx, |ui| {
            ui.heading("Aquifer");
            ui.separator();
            render_aquifer_picker(ui, controller, inputs);

            ui.add_space(10.0);
            ui.heading("Variable");
            ui.separator();
            render_variable_picker(ui, controller, inputs);

            ui.add_space(10.0);
            ui.heading("Well");
            ui.separator();
            render_well_section(ui, controller);
        });
}

fn render_aquifer_picker<D: RequestDispatcher>(
    ui: &mut egui::Ui,
    controller: &mut SelectionController<D>,
    inputs: &mut SelectionInputs,
) {
    let current = controller.selection().aquifer_id.clone();
    let mut picked: Option<String> = None;

    if controller.aquifers().is_empty() {
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut inputs.aquifer_id)
                    .hint_text("Aquifer id")
                    .desired_width(120.0)
                    .font(egui::FontId::monospace(12.0)),
            );
            if ui.button("Load").clicked() {
                picked = Some(inputs.aquifer_id.clone());
            }
        });
    } else {
        let selected_text = controller
            .aquifers()
            .iter()
            .find(|a| a.id == current)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| "Select an aquifer".to_string());

        egui::ComboBox::from_id_salt("aquifer_select")
            .selected_text(selected_text)
            .width(200.0)
            .show_ui(ui, |ui| {
                for aquifer in controller.aquifers() {
                    if ui
                        .selectable_label(aquifer.id == current, &aquifer.name)
                        .clicked()
                    {
                        picked = Some(aquifer.id.clone());
                    }
                }
            });
    }

    if let Some(aquifer_id) = picked {
        if aquifer_id.trim() != current {
            controller.on_aquifer_changed(&aquifer_id);
        }
    }

    if controller.is_loading_layers() {
        ui.add_space(5.0);
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading layers...");
        });
    } else if let Some(wells) = controller.layers().wells() {
        ui.label(
            RichText::new(format!(
                "{} well(s) in aquifer {}",
                wells.markers.len(),
                wells.aquifer_id
            ))
            .small(),
        );
    }
}

fn render_variable_picker<D: RequestDispatcher>(
    ui: &mut egui::Ui,
    controller: &mut SelectionController<D>,
    inputs: &mut SelectionInputs,
) {
    let current = controller.selection().variable_id.clone();
    let mut picked: Option<String> = None;

    if controller.variables().is_empty() {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut inputs.variable_id)
                    .hint_text("Variable id")
                    .desired_width(120.0)
                    .font(egui::FontId::monospace(12.0)),
            );
            if response.changed() {
                picked = Some(inputs.variable_id.clone());
            }
        });
    } else {
        let selected_text = if current.is_empty() {
            "Select a variable".to_string()
        } else {
            controller.variable_name(&current)
        };

        egui::ComboBox::from_id_salt("variable_select")
            .selected_text(selected_text)
            .width(200.0)
            .show_ui(ui, |ui| {
                for variable in controller.variables() {
                    if ui
                        .selectable_label(variable.id == current, &variable.display_name)
                        .clicked()
                    {
                        picked = Some(variable.id.clone());
                    }
                }
            });
    }

    if let Some(variable_id) = picked {
        controller.on_variable_changed(&variable_id);
    }
}

fn render_well_section<D: RequestDispatcher>(
    ui: &mut egui::Ui,
    controller: &mut SelectionController<D>,
) {
    match controller.selection().well_id.clone() {
        Some(well_id) => {
            ui.label(RichText::new(well_id).strong().monospace());
        }
        None => {
            ui.label(
                RichText::new("Click a well on the map")
                    .small()
                    .color(Color32::GRAY),
            );
        }
    }

    if controller.is_loading_series() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading time series...");
        });
    }

    ui.add_space(5.0);
    if ui.button("Flag outlier").clicked() {
        // Errors already land in the status line
        let _ = controller.on_flag_outlier();
    }
    match controller.focused_outlier_flag() {
        Some(true) => {
            ui.label(
                RichText::new("Flagged as outlier")
                    .small()
                    .color(Color32::from_rgb(230, 160, 60)),
            );
        }
        Some(false) => {
            ui.label(RichText::new("Not flagged").small().color(Color32::GRAY));
        }
        None => {}
    }

    let chart_hidden = !controller.chart().is_open() && controller.chart().current().is_some();
    if chart_hidden && ui.button("Show chart").clicked() {
        controller.chart_mut().reopen();
    }
}
