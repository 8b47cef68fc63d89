//! Transient UI state for elements.
//!
//! Selection, text editing and visibility are session state: they live here
//! rather than on [`Element`](crate::element::Element), so they never reach
//! history snapshots or persisted settings.

mod manager;
mod state;

pub use manager::WidgetManager;
pub use state::WidgetState;
