//! Page Interaction Controller.
//!
//! Wires a static page's interaction behaviors against a parsed document and
//! a host-driven event and clock feed: mobile navigation, dropdowns, scroll
//! effects, reveal and counter animations, a video embed, smooth anchor
//! scrolling, nav-link highlighting, and an image lightbox.

mod config;
mod contract;
mod runtime;
mod state;

#[cfg(test)]
mod tests;

pub use config::InteractionConfig;
pub use contract::PageContract;
pub use runtime::EventOutcome;
pub use runtime::PageRuntime;
pub use state::HighlightState;
pub use state::LightboxNodes;
pub use state::LightboxPhase;
pub use state::MenuState;
pub use state::UiMessage;
pub use state::UiState;
pub use state::reduce;
pub use state::sync_document;
