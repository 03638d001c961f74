//! UI modules for the Groundwater Level Mapper.
//!
//! The UI is split into distinct panels:
//! - Top bar: title and status line
//! - Left panel: aquifer/variable selection and the outlier action
//! - Central canvas: boundary, well clusters and popups
//! - Chart window: the selected well's time series

mod canvas;
mod chart_window;
mod left_panel;
mod top_bar;

pub use canvas::{render_canvas, MapView};
pub use chart_window::render_chart_window;
pub use left_panel::{render_left_panel, SelectionInputs};
pub use top_bar::render_top_bar;
