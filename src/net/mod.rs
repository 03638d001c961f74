//! Networking: HTTP transport and background request dispatch.

mod dispatch;
pub mod http;

pub use dispatch::{Completion, RequestChannel, RequestDispatcher};
