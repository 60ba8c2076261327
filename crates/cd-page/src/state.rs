//! Explicit UI state, pure reducer, and the derived document sync.
//!
//! The page's interaction state lives here instead of being scattered across
//! DOM class flags. Messages go through [`reduce`]; class flags are derived
//! afterwards by [`sync_document`]. The body scroll lock is deliberately NOT
//! derived: the menu and the lightbox both write it on their own transitions,
//! last write wins.

use std::collections::BTreeSet;

use cd_dom::Document;
use cd_dom::NodeId;
use cd_events::ListenerId;
use cd_motion::TimerToken;

use crate::contract::PageContract;

/// Mobile menu panel state. Drives the hamburger, panel, and overlay
/// "active" flags in lockstep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

/// Nav-link highlight state. `Inactive` until the first scroll event on the
/// home page; link classes are never touched while inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HighlightState {
    #[default]
    Inactive,
    Home,
    Section(String),
}

/// Nodes and per-open listeners owned by one lightbox invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxNodes {
    pub overlay: NodeId,
    pub image: NodeId,
    pub close: NodeId,
    pub listeners: Vec<ListenerId>,
}

/// Lightbox lifecycle. Dismissal triggers during `Closing` are ignored, and
/// every close path has already unbound the per-open listeners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LightboxPhase {
    #[default]
    Closed,
    Open(LightboxNodes),
    Closing {
        nodes: LightboxNodes,
        exit_timer: TimerToken,
    },
}

/// The whole interaction state for one page view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub menu: MenuState,
    pub open_dropdowns: BTreeSet<NodeId>,
    pub highlight: HighlightState,
    pub scroll_top_visible: bool,
    pub lightbox: LightboxPhase,
}

/// State transitions. Reduction is pure; side effects happen elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    MenuToggled,
    DropdownToggled(NodeId),
    DropdownsClosed,
    ScrollTopVisible(bool),
    Highlighted(HighlightState),
    LightboxOpened(LightboxNodes),
    LightboxClosing(TimerToken),
    LightboxRemoved,
}

pub fn reduce(state: &UiState, message: &UiMessage) -> UiState {
    let mut next = state.clone();
    match message {
        UiMessage::MenuToggled => {
            next.menu = match state.menu {
                MenuState::Closed => MenuState::Open,
                MenuState::Open => MenuState::Closed,
            };
        }
        UiMessage::DropdownToggled(item) => {
            // At most one dropdown stays open; re-clicking the open one
            // closes it.
            let was_open = next.open_dropdowns.contains(item);
            next.open_dropdowns.clear();
            if !was_open {
                next.open_dropdowns.insert(*item);
            }
        }
        UiMessage::DropdownsClosed => {
            next.open_dropdowns.clear();
        }
        UiMessage::ScrollTopVisible(visible) => {
            next.scroll_top_visible = *visible;
        }
        UiMessage::Highlighted(highlight) => {
            next.highlight = highlight.clone();
        }
        UiMessage::LightboxOpened(nodes) => {
            next.lightbox = LightboxPhase::Open(nodes.clone());
        }
        UiMessage::LightboxClosing(exit_timer) => {
            if let LightboxPhase::Open(nodes) = &state.lightbox {
                next.lightbox = LightboxPhase::Closing {
                    nodes: nodes.clone(),
                    exit_timer: *exit_timer,
                };
            }
        }
        UiMessage::LightboxRemoved => {
            next.lightbox = LightboxPhase::Closed;
        }
    }
    next
}

/// Derives the class flags the state implies. Highlight classes are left
/// untouched while the highlighter is inactive so static markup survives on
/// pages the highlighter does not run on.
pub fn sync_document(state: &UiState, contract: &PageContract, document: &mut Document) {
    let menu_open = state.menu == MenuState::Open;
    if let Some(hamburger) = contract.hamburger {
        document.set_class(hamburger, "active", menu_open);
    }
    document.set_class(contract.nav_menu, "active", menu_open);
    if let Some(overlay) = contract.mobile_overlay {
        document.set_class(overlay, "active", menu_open);
    }

    for item in &contract.dropdowns {
        document.set_class(*item, "active", state.open_dropdowns.contains(item));
    }

    document.set_class(contract.scroll_top, "visible", state.scroll_top_visible);

    match &state.highlight {
        HighlightState::Inactive => {}
        HighlightState::Home => {
            for link in &contract.nav_links {
                document.remove_class(*link, "active");
            }
            if let Some(home) = contract.home_link {
                document.add_class(home, "active");
            }
        }
        HighlightState::Section(id) => {
            let href = format!("#{id}");
            for link in &contract.nav_links {
                let matches = document.attr(*link, "href") == Some(href.as_str());
                document.set_class(*link, "active", matches);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HighlightState;
    use super::LightboxPhase;
    use super::MenuState;
    use super::UiMessage;
    use super::UiState;
    use super::reduce;
    use cd_dom::Document;

    #[test]
    fn menu_toggle_flips_state() {
        let state = UiState::default();
        let open = reduce(&state, &UiMessage::MenuToggled);
        assert_eq!(open.menu, MenuState::Open);
        let closed = reduce(&open, &UiMessage::MenuToggled);
        assert_eq!(closed.menu, MenuState::Closed);
    }

    #[test]
    fn at_most_one_dropdown_is_open() {
        let mut doc = Document::new();
        let first = doc.create_element("li");
        let second = doc.create_element("li");

        let mut state = UiState::default();
        state = reduce(&state, &UiMessage::DropdownToggled(first));
        assert!(state.open_dropdowns.contains(&first));

        state = reduce(&state, &UiMessage::DropdownToggled(second));
        assert_eq!(state.open_dropdowns.len(), 1);
        assert!(state.open_dropdowns.contains(&second));

        // Re-clicking the open dropdown closes it.
        state = reduce(&state, &UiMessage::DropdownToggled(second));
        assert!(state.open_dropdowns.is_empty());
    }

    #[test]
    fn lightbox_closing_requires_an_open_phase() {
        let state = UiState::default();
        let token = cd_motion::Scheduler::<u8>::new().schedule_timer(0, 0);
        let next = reduce(&state, &UiMessage::LightboxClosing(token));
        assert_eq!(next.lightbox, LightboxPhase::Closed);
    }

    #[test]
    fn highlight_messages_replace_state() {
        let state = UiState::default();
        let next = reduce(
            &state,
            &UiMessage::Highlighted(HighlightState::Section("academics".to_owned())),
        );
        assert_eq!(
            next.highlight,
            HighlightState::Section("academics".to_owned())
        );
        let home = reduce(&next, &UiMessage::Highlighted(HighlightState::Home));
        assert_eq!(home.highlight, HighlightState::Home);
    }
}
