//! Session state types.
//!
//! - `view`: the active view and modal overlays (`View`, `Overlay`)
//! - `request`: tickets tagging in-flight backend requests (`RequestKind`, `RequestTicket`)

mod request;
mod view;

pub use request::{RequestKind, RequestTicket};
pub use view::{Overlay, View};
