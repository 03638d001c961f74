//! Map-side components: WFS feature client, layers, popups and rendering.
//!
//! This module covers everything between a feature-server response and the
//! pixels on the canvas.

mod cluster;
mod feature;
mod layer;
mod popup;
mod projection;
mod renderer;
pub mod wfs;

pub use cluster::hit_test;
pub use feature::{BoundaryGeometry, WellFeature};
pub use layer::LayerStore;
pub use popup::{MapEvent, PopupBinder, WellMarker};
pub use projection::MapProjection;
pub use renderer::render_layers;
pub use wfs::GeoFeatureClient;
