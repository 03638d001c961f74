//! Per-marker popup content and click handlers.
//!
//! Clicking a marker does not call into the controller directly. The bound
//! handler posts a `MapEvent` on a channel that the frame loop drains, so
//! markers stay plain data and the controller keeps sole ownership of the
//! selection.

use super::feature::WellFeature;
use geo_types::Coord;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Events raised by interactive map content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// A well marker was clicked.
    WellClicked(String),
}

/// Click handler bound to one marker.
#[derive(Debug, Clone)]
pub struct ClickHandler {
    well_id: String,
    events: Sender<MapEvent>,
}

impl ClickHandler {
    /// Fires the handler. A closed event channel is logged and ignored.
    pub fn fire(&self) {
        if self
            .events
            .send(MapEvent::WellClicked(self.well_id.clone()))
            .is_err()
        {
            log::warn!("Map event receiver dropped; click on {} ignored", self.well_id);
        }
    }
}

/// A rendered well marker with its bound popup and click handler.
#[derive(Debug, Clone)]
pub struct WellMarker {
    pub well_id: String,
    pub location: Coord<f64>,
    /// Popup text: identifier line followed by `name: value` lines.
    pub popup: String,
    on_click: ClickHandler,
}

impl WellMarker {
    /// Simulates a user click on the marker.
    pub fn click(&self) {
        self.on_click.fire();
    }
}

/// Builds the popup text for a well feature.
pub fn popup_text(feature: &WellFeature) -> String {
    let mut text = feature.id.clone();
    for (name, value) in &feature.attributes {
        text.push('\n');
        text.push_str(name);
        text.push_str(": ");
        text.push_str(value);
    }
    text
}

/// Binds popups and click handlers to well features.
#[derive(Debug, Clone)]
pub struct PopupBinder {
    events: Sender<MapEvent>,
}

impl PopupBinder {
    pub fn new(events: Sender<MapEvent>) -> Self {
        Self { events }
    }

    /// Creates a binder along with the receiving end of its event channel.
    pub fn channel() -> (Self, Receiver<MapEvent>) {
        let (sender, receiver) = channel();
        (Self::new(sender), receiver)
    }

    /// Builds the interactive marker for one well.
    pub fn bind(&self, feature: &WellFeature) -> WellMarker {
        WellMarker {
            well_id: feature.id.clone(),
            location: feature.location,
            popup: popup_text(feature),
            on_click: ClickHandler {
                well_id: feature.id.clone(),
                events: self.events.clone(),
            },
        }
    }
}
