//! Structural contract: the elements the page markup is expected to carry.
//!
//! The navigation menu, scroll-top control, and navbar are required; their
//! absence fails installation. Everything else is optional and simply leaves
//! its behavior unwired.

use cd_core::PageError;
use cd_core::PageResult;
use cd_dom::Document;
use cd_dom::NodeId;

/// Resolved element handles for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContract {
    pub body: NodeId,
    pub nav_menu: NodeId,
    pub scroll_top: NodeId,
    pub navbar: NodeId,
    pub hamburger: Option<NodeId>,
    pub mobile_overlay: Option<NodeId>,
    pub video_wrapper: Option<NodeId>,
    pub home_link: Option<NodeId>,
    pub hero_badge: Option<NodeId>,
    pub hero_stats: Vec<NodeId>,
    /// `.dropdown` items under the nav menu, document order.
    pub dropdowns: Vec<NodeId>,
    /// Dropdown trigger links paired with their `.dropdown` item.
    pub dropdown_triggers: Vec<(NodeId, NodeId)>,
    /// Direct child links of non-dropdown `li` items under the nav menu.
    /// Sub-list links inside dropdown menus qualify too.
    pub plain_links: Vec<NodeId>,
    /// Links inside `.dropdown-menu` containers under the nav menu.
    pub sub_links: Vec<NodeId>,
    /// Highlight set: plain links and dropdown triggers, document order.
    pub nav_links: Vec<NodeId>,
    /// `section` elements carrying an id, paired with that id.
    pub sections: Vec<(NodeId, String)>,
    /// Every link whose href starts with `#`.
    pub anchors: Vec<NodeId>,
    pub gallery_items: Vec<NodeId>,
    /// Elements with a valid integer `data-count`, paired with the target.
    pub counters: Vec<(NodeId, i64)>,
    /// Elements tagged for entrance animation.
    pub animated: Vec<NodeId>,
}

impl PageContract {
    pub fn locate(document: &Document) -> PageResult<Self> {
        let nav_menu = require(document, "nav-menu", "page.nav_menu_missing")?;
        let scroll_top = require(document, "scroll-top", "page.scroll_top_missing")?;
        let navbar = require(document, "navbar", "page.navbar_missing")?;

        let mut dropdowns = Vec::new();
        let mut dropdown_triggers = Vec::new();
        let mut plain_links = Vec::new();
        let mut nav_links = Vec::new();
        for li in document.descendants(nav_menu) {
            if document.tag(li) != Some("li") {
                continue;
            }
            let child_links: Vec<NodeId> = document
                .children(li)
                .into_iter()
                .filter(|child| document.tag(*child) == Some("a"))
                .collect();
            if document.has_class(li, "dropdown") {
                dropdowns.push(li);
                for link in child_links {
                    dropdown_triggers.push((link, li));
                    nav_links.push(link);
                }
            } else {
                for link in child_links {
                    plain_links.push(link);
                    nav_links.push(link);
                }
            }
        }

        let mut sub_links = Vec::new();
        for menu in document.descendants(nav_menu) {
            if !document.has_class(menu, "dropdown-menu") {
                continue;
            }
            for node in document.descendants(menu) {
                if document.tag(node) == Some("a") {
                    sub_links.push(node);
                }
            }
        }

        let sections = document
            .elements_with_tag("section")
            .into_iter()
            .filter_map(|node| {
                document
                    .id_of(node)
                    .map(|id| (node, id.to_owned()))
            })
            .collect();

        let anchors = document
            .elements_with_tag("a")
            .into_iter()
            .filter(|node| {
                document
                    .attr(*node, "href")
                    .map(|href| href.starts_with('#'))
                    .unwrap_or(false)
            })
            .collect();

        let counters = document
            .descendants(document.root())
            .into_iter()
            .filter_map(|node| {
                let raw = document.attr(node, "data-count")?;
                // Non-integer targets are skipped rather than animated.
                raw.trim().parse::<i64>().ok().map(|target| (node, target))
            })
            .collect();

        let mut animated = Vec::new();
        for node in document.descendants(document.root()) {
            if document.has_class(node, "fade-up")
                || document.has_class(node, "fade-left")
                || document.has_class(node, "fade-right")
            {
                animated.push(node);
            }
        }

        Ok(Self {
            body: document.body(),
            nav_menu,
            scroll_top,
            navbar,
            hamburger: document.element_by_id("hamburger"),
            mobile_overlay: document.element_by_id("mobile-overlay"),
            video_wrapper: document.element_by_id("video-wrapper"),
            home_link: document.element_by_id("nav-home"),
            hero_badge: document.elements_with_class("hero-badge").first().copied(),
            hero_stats: document.elements_with_class("hero-stat"),
            dropdowns,
            dropdown_triggers,
            plain_links,
            sub_links,
            nav_links,
            sections,
            anchors,
            gallery_items: document.elements_with_class("gallery-item"),
            counters,
            animated,
        })
    }
}

fn require(document: &Document, id: &str, code: &'static str) -> PageResult<NodeId> {
    document
        .element_by_id(id)
        .ok_or_else(|| PageError::missing_element(code, id))
}
