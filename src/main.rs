#![warn(clippy::all)]

//! Groundwater Level Mapper - an interactive map of groundwater monitoring
//! wells.
//!
//! Pick an aquifer to see its boundary and clustered wells, click a well to
//! chart its time series, and flag anomalous wells as outliers.

mod config;
mod error;
mod geo;
mod net;
mod state;
mod timeseries;
mod ui;

use config::AppConfig;
use eframe::egui;
use geo::{MapEvent, PopupBinder};
use net::RequestChannel;
use state::SelectionController;
use std::sync::mpsc::Receiver;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "Groundwater Level Mapper",
        native_options,
        Box::new(|cc| Ok(Box::new(GwlmApp::new(cc)))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document available");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("app_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("app_canvas is missing or not a canvas element");
            return;
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(GwlmApp::new(cc)))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    log::error!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct GwlmApp {
    /// Owner of the selection, layers and chart
    controller: SelectionController<RequestChannel>,

    /// Well clicks posted by marker click handlers
    map_events: Receiver<MapEvent>,

    /// Zoom/pan of the map canvas
    map_view: ui::MapView,

    /// Manual id entry when no catalog is available
    inputs: ui::SelectionInputs,
}

impl GwlmApp {
    /// Creates the app and applies the initial selection from the config.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = AppConfig::load();
        log::info!(
            "Feature server {}, backend {}",
            config.geoserver_url,
            config.api_url
        );

        let dispatcher = RequestChannel::from_config(cc.egui_ctx.clone(), &config);
        let (binder, map_events) = PopupBinder::channel();
        let mut controller = SelectionController::new(dispatcher, binder);

        controller.apply_config(&config);
        let inputs = ui::SelectionInputs {
            aquifer_id: config.initial_aquifer.clone().unwrap_or_default(),
            variable_id: config.initial_variable.clone().unwrap_or_default(),
        };

        Self {
            controller,
            map_events,
            map_view: ui::MapView::default(),
            inputs,
        }
    }
}

impl eframe::App for GwlmApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply finished requests before drawing
        self.controller.pump();

        while let Ok(MapEvent::WellClicked(well_id)) = self.map_events.try_recv() {
            // Errors already land in the status line
            let _ = self.controller.on_well_clicked(&well_id);
        }

        // Side and top panels must be rendered before CentralPanel
        ui::render_top_bar(ctx, self.controller.status(), self.controller.is_busy());
        ui::render_left_panel(ctx, &mut self.controller, &mut self.inputs);
        ui::render_canvas(ctx, self.controller.layers(), &mut self.map_view);
        ui::render_chart_window(ctx, self.controller.chart_mut());
    }
}
