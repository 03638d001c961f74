//! Application state: the selection, its generation counters and the
//! controller that owns them.

mod controller;
mod selection;
mod status;

pub use controller::SelectionController;
pub use selection::{Generation, Stream};
pub use status::StatusMessage;
