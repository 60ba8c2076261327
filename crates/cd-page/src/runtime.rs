//! The Page Interaction Controller.
//!
//! [`PageRuntime::install`] wires the dispatch table against one document,
//! [`PageRuntime::dispatch`] runs one host event through it, and
//! [`PageRuntime::tick`] drives timers, frames, and intersection sweeps.

use std::collections::HashMap;

use cd_core::PageError;
use cd_core::PageResult;
use cd_dom::Document;
use cd_dom::NodeId;
use cd_events::BindTarget;
use cd_events::Event;
use cd_events::EventKind;
use cd_events::EventTable;
use cd_events::Key;
use cd_motion::Scheduler;
use cd_motion::ScrollAnimation;
use cd_observe::IntersectionSettings;
use cd_observe::IntersectionWatcher;
use cd_observe::Viewport;
use tracing::debug;
use tracing::info;
use url::Url;

use crate::config::InteractionConfig;
use crate::contract::PageContract;
use crate::state::HighlightState;
use crate::state::LightboxNodes;
use crate::state::LightboxPhase;
use crate::state::MenuState;
use crate::state::UiMessage;
use crate::state::UiState;
use crate::state::reduce;
use crate::state::sync_document;

const EMBED_VIDEO_URL: &str = "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1";
const EMBED_IFRAME_CSS: &str =
    "position:absolute;top:0;left:0;width:100%;height:100%;border:none;border-radius:12px";
const EMBED_ALLOW: &str = "autoplay; encrypted-media";

const NAVBAR_SHADOW_STRONG: &str = "0 6px 30px rgba(11, 122, 109, 0.4)";
const NAVBAR_SHADOW_LIGHT: &str = "0 4px 20px rgba(11, 122, 109, 0.3)";

const LIGHTBOX_OVERLAY_CSS: &str = "position:fixed;inset:0;background:rgba(0,0,0,0.9);\
    z-index:10000;display:flex;align-items:center;justify-content:center;cursor:pointer;\
    opacity:0;transition:opacity 0.3s ease;backdrop-filter:blur(8px)";
const LIGHTBOX_IMAGE_CSS: &str = "max-width:90vw;max-height:90vh;border-radius:12px;\
    box-shadow:0 20px 60px rgba(0,0,0,0.5);transform:scale(0.8);transition:transform 0.3s ease";
const LIGHTBOX_CLOSE_CSS: &str = "position:absolute;top:20px;right:20px;width:44px;height:44px;\
    border-radius:50%;background:rgba(255,255,255,0.15);color:white;border:none;\
    font-size:1.2rem;cursor:pointer;display:flex;align-items:center;justify-content:center;\
    transition:background 0.3s ease";
const CLOSE_BACKGROUND_REST: &str = "rgba(255,255,255,0.15)";
const CLOSE_BACKGROUND_HOVER: &str = "rgba(240,168,48,0.8)";

const HERO_BADGE_TRANSITION: &str = "opacity 0.6s ease, transform 0.6s ease";

/// What one dispatched event amounted to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOutcome {
    /// The engine consumed the event; the embedder should not run its
    /// default action.
    pub default_prevented: bool,
    /// A link click the engine did not consume; the embedder owns the
    /// navigation.
    pub navigation: Option<String>,
}

/// Dispatch-table payload: what to do when a bound event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ToggleMenu,
    DropdownToggle { item: NodeId },
    OutsideClick,
    MenuLinkClick,
    SubLinkClick,
    ScrollTopClick,
    VideoClick,
    AnchorClick { link: NodeId },
    GalleryClick { item: NodeId },
    LightboxClick,
    LightboxKey,
    CloseHoverEnter,
    CloseHoverLeave,
    ScrollEffects,
}

/// Scheduler payload: deferred work for a later frame or timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    CounterFrame { node: NodeId },
    LightboxEnter { overlay: NodeId, image: NodeId },
    LightboxRemove { overlay: NodeId },
    HeroBadgeReveal { badge: NodeId },
}

#[derive(Debug, Clone, Copy)]
struct CounterRun {
    target: i64,
    step: f64,
    current: f64,
}

/// One page's interaction runtime.
#[derive(Debug)]
pub struct PageRuntime {
    document: Document,
    viewport: Viewport,
    config: InteractionConfig,
    contract: PageContract,
    home_page: bool,
    state: UiState,
    table: EventTable<Action>,
    scheduler: Scheduler<Task>,
    reveal_watch: IntersectionWatcher,
    counter_watch: IntersectionWatcher,
    counter_runs: HashMap<NodeId, CounterRun>,
    scroll_animation: Option<ScrollAnimation>,
}

impl PageRuntime {
    /// Wires the page. Fails when the structural contract's required
    /// elements are absent or the config is invalid.
    pub fn install(
        document: Document,
        page_url: &str,
        viewport: Viewport,
        config: InteractionConfig,
    ) -> PageResult<Self> {
        config.validate()?;

        let url = Url::parse(page_url).map_err(|error| {
            PageError::new("page.url_invalid", format!("cannot parse `{page_url}`: {error}"))
        })?;
        let path = url.path();
        let home_page = path.is_empty() || path == "/" || path.ends_with("index.html");

        let contract = PageContract::locate(&document)?;

        let reveal_watch = IntersectionWatcher::new(IntersectionSettings {
            threshold: config.reveal_threshold,
            bottom_margin: config.reveal_bottom_margin,
        });
        let counter_watch = IntersectionWatcher::new(IntersectionSettings {
            threshold: config.counter_threshold,
            bottom_margin: 0.0,
        });

        let mut runtime = Self {
            document,
            viewport,
            config,
            contract,
            home_page,
            state: UiState::default(),
            table: EventTable::new(),
            scheduler: Scheduler::new(),
            reveal_watch,
            counter_watch,
            counter_runs: HashMap::new(),
            scroll_animation: None,
        };

        runtime.wire_table();
        for node in runtime.contract.animated.clone() {
            runtime.reveal_watch.observe(node);
        }
        for (node, _) in runtime.contract.counters.clone() {
            runtime.counter_watch.observe(node);
        }

        runtime.style_hero_flourishes();
        runtime.run_sweeps();

        info!(
            home_page = runtime.home_page,
            dropdowns = runtime.contract.dropdowns.len(),
            nav_links = runtime.contract.nav_links.len(),
            anchors = runtime.contract.anchors.len(),
            gallery_items = runtime.contract.gallery_items.len(),
            counters = runtime.contract.counters.len(),
            animated = runtime.contract.animated.len(),
            "page interactions installed"
        );

        Ok(runtime)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Runs one host event through the dispatch table.
    pub fn dispatch(&mut self, event: Event) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        match event {
            Event::Click { target } => {
                let path = self.document.ancestor_path(target);
                for action in self.table.collect(&path, EventKind::Click) {
                    self.run_action(action, &event, &mut outcome);
                }
                if !outcome.default_prevented && outcome.navigation.is_none() {
                    outcome.navigation = self.unconsumed_link_href(&path);
                }
            }
            Event::KeyDown { .. } => {
                for action in self.table.collect_document(EventKind::KeyDown) {
                    self.run_action(action, &event, &mut outcome);
                }
            }
            Event::Scroll { to } => {
                // A host scroll interrupts any programmatic smooth scroll.
                self.scroll_animation = None;
                self.viewport.scroll_y = to.max(0.0);
                for action in self.table.collect_document(EventKind::Scroll) {
                    self.run_action(action, &event, &mut outcome);
                }
                self.run_sweeps();
            }
            Event::PointerEnter { target } => {
                for action in self.table.collect_at(target, EventKind::PointerEnter) {
                    self.run_action(action, &event, &mut outcome);
                }
            }
            Event::PointerLeave { target } => {
                for action in self.table.collect_at(target, EventKind::PointerLeave) {
                    self.run_action(action, &event, &mut outcome);
                }
            }
        }
        outcome
    }

    /// Advances virtual time: due timers, the queued frame batch, the smooth
    /// scroll animation, then intersection sweeps.
    pub fn tick(&mut self, elapsed_ms: u64) {
        for task in self.scheduler.advance(elapsed_ms) {
            self.run_task(task);
        }

        if let Some(animation) = self.scroll_animation {
            let now = self.scheduler.now();
            self.viewport.scroll_y = animation.sample(now).max(0.0);
            self.apply_scroll_effects();
            if animation.is_finished(now) {
                self.scroll_animation = None;
            }
        }

        self.run_sweeps();
    }

    fn wire_table(&mut self) {
        if let Some(hamburger) = self.contract.hamburger {
            self.table
                .bind(BindTarget::Node(hamburger), EventKind::Click, Action::ToggleMenu);
        }
        if let Some(overlay) = self.contract.mobile_overlay {
            self.table
                .bind(BindTarget::Node(overlay), EventKind::Click, Action::ToggleMenu);
        }

        for (trigger, item) in self.contract.dropdown_triggers.clone() {
            self.table.bind(
                BindTarget::Node(trigger),
                EventKind::Click,
                Action::DropdownToggle { item },
            );
        }
        self.table
            .bind(BindTarget::Document, EventKind::Click, Action::OutsideClick);

        for link in self.contract.plain_links.clone() {
            self.table
                .bind(BindTarget::Node(link), EventKind::Click, Action::MenuLinkClick);
        }
        for link in self.contract.sub_links.clone() {
            self.table
                .bind(BindTarget::Node(link), EventKind::Click, Action::SubLinkClick);
        }

        self.table.bind(
            BindTarget::Node(self.contract.scroll_top),
            EventKind::Click,
            Action::ScrollTopClick,
        );

        if let Some(wrapper) = self.contract.video_wrapper {
            self.table
                .bind(BindTarget::Node(wrapper), EventKind::Click, Action::VideoClick);
        }

        for link in self.contract.anchors.clone() {
            self.table
                .bind(BindTarget::Node(link), EventKind::Click, Action::AnchorClick { link });
        }

        for item in self.contract.gallery_items.clone() {
            self.table
                .bind(BindTarget::Node(item), EventKind::Click, Action::GalleryClick { item });
        }

        self.table
            .bind(BindTarget::Document, EventKind::Scroll, Action::ScrollEffects);
    }

    fn run_action(&mut self, action: Action, event: &Event, outcome: &mut EventOutcome) {
        match action {
            Action::ToggleMenu => self.toggle_mobile_menu(),
            Action::DropdownToggle { item } => {
                outcome.default_prevented = true;
                self.state = reduce(&self.state, &UiMessage::DropdownToggled(item));
                debug!(open = self.state.open_dropdowns.contains(&item), "dropdown toggled");
                self.sync();
            }
            Action::OutsideClick => {
                let Some(target) = event.target() else {
                    return;
                };
                if self.document.closest_with_class(target, "dropdown").is_none()
                    && !self.state.open_dropdowns.is_empty()
                {
                    self.state = reduce(&self.state, &UiMessage::DropdownsClosed);
                    self.sync();
                }
            }
            Action::MenuLinkClick => {
                if self.state.menu == MenuState::Open {
                    self.toggle_mobile_menu();
                }
            }
            Action::SubLinkClick => {
                self.state = reduce(&self.state, &UiMessage::DropdownsClosed);
                self.sync();
                if self.state.menu == MenuState::Open {
                    self.toggle_mobile_menu();
                }
            }
            Action::ScrollTopClick => self.start_smooth_scroll(0.0),
            Action::VideoClick => self.build_video_embed(),
            Action::AnchorClick { link } => self.handle_anchor_click(link, outcome),
            Action::GalleryClick { item } => self.open_lightbox(item),
            Action::LightboxClick => {
                let Some(target) = event.target() else {
                    return;
                };
                let (overlay, close) = match &self.state.lightbox {
                    LightboxPhase::Open(nodes) => (nodes.overlay, nodes.close),
                    _ => return,
                };
                // Clicks on the image clone neither close nor bubble past
                // the overlay binding into a dismissal.
                if target == overlay || target == close || self.document.contains(close, target) {
                    self.begin_lightbox_close();
                }
            }
            Action::LightboxKey => {
                if matches!(event, Event::KeyDown { key: Key::Escape }) {
                    self.begin_lightbox_close();
                }
            }
            Action::CloseHoverEnter => self.set_close_background(CLOSE_BACKGROUND_HOVER),
            Action::CloseHoverLeave => self.set_close_background(CLOSE_BACKGROUND_REST),
            Action::ScrollEffects => self.apply_scroll_effects(),
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::CounterFrame { node } => self.step_counter(node),
            Task::LightboxEnter { overlay, image } => {
                self.document.set_style_property(overlay, "opacity", "1");
                self.document.set_style_property(image, "transform", "scale(1)");
            }
            Task::LightboxRemove { overlay } => {
                let matches_phase = matches!(
                    &self.state.lightbox,
                    LightboxPhase::Closing { nodes, .. } if nodes.overlay == overlay
                );
                if matches_phase {
                    self.remove_lightbox(overlay);
                }
            }
            Task::HeroBadgeReveal { badge } => {
                self.document
                    .set_style_property(badge, "transition", HERO_BADGE_TRANSITION);
                self.document.set_style_property(badge, "opacity", "1");
                self.document
                    .set_style_property(badge, "transform", "translateY(0)");
            }
        }
    }

    fn sync(&mut self) {
        sync_document(&self.state, &self.contract, &mut self.document);
    }

    fn toggle_mobile_menu(&mut self) {
        self.state = reduce(&self.state, &UiMessage::MenuToggled);
        match self.state.menu {
            MenuState::Open => {
                self.document
                    .set_style_property(self.contract.body, "overflow", "hidden");
            }
            MenuState::Closed => {
                self.document
                    .remove_style_property(self.contract.body, "overflow");
            }
        }
        debug!(open = (self.state.menu == MenuState::Open), "mobile menu toggled");
        self.sync();
    }

    fn apply_scroll_effects(&mut self) {
        let scroll_y = self.viewport.scroll_y;

        self.state = reduce(
            &self.state,
            &UiMessage::ScrollTopVisible(scroll_y > self.config.scroll_top_threshold),
        );

        let shadow = if scroll_y > self.config.navbar_shadow_threshold {
            NAVBAR_SHADOW_STRONG
        } else {
            NAVBAR_SHADOW_LIGHT
        };
        self.document
            .set_style_property(self.contract.navbar, "box-shadow", shadow);

        if self.home_page {
            let highlight = self.compute_highlight();
            self.state = reduce(&self.state, &UiMessage::Highlighted(highlight));
        }

        self.sync();
    }

    /// The current section is the LAST one whose lookahead-shifted span
    /// contains the scroll offset; overlaps resolve by document order.
    fn compute_highlight(&self) -> HighlightState {
        let scroll_y = self.viewport.scroll_y;
        let mut current: Option<&str> = None;
        for (node, id) in &self.contract.sections {
            let Some(metrics) = self.document.metrics(*node) else {
                continue;
            };
            let top = metrics.top - self.config.section_lookahead;
            let bottom = top + metrics.height;
            if scroll_y >= top && scroll_y < bottom {
                current = Some(id);
            }
        }
        match current {
            None | Some("hero") => HighlightState::Home,
            Some(id) => HighlightState::Section(id.to_owned()),
        }
    }

    fn handle_anchor_click(&mut self, link: NodeId, outcome: &mut EventOutcome) {
        let Some(href) = self.document.attr(link, "href").map(str::to_owned) else {
            return;
        };
        // Empty and bare `#` hrefs keep their default handling.
        let Some(id) = href.strip_prefix('#').filter(|id| !id.is_empty()) else {
            return;
        };
        let Some(section) = self.document.element_by_id(id) else {
            return;
        };
        let Some(metrics) = self.document.metrics(section) else {
            return;
        };

        outcome.default_prevented = true;
        let navbar_height = self
            .document
            .metrics(self.contract.navbar)
            .map(|m| m.height)
            .unwrap_or(0.0);
        let offset = if navbar_height > 0.0 {
            navbar_height
        } else {
            self.config.anchor_offset_fallback
        };
        self.start_smooth_scroll((metrics.top - offset).max(0.0));
    }

    fn start_smooth_scroll(&mut self, target: f32) {
        self.scroll_animation = Some(ScrollAnimation::new(
            self.viewport.scroll_y,
            target,
            self.scheduler.now(),
            self.config.smooth_scroll_ms,
        ));
        debug!(to = target, "smooth scroll started");
    }

    fn unconsumed_link_href(&self, path: &[NodeId]) -> Option<String> {
        for node in path {
            if self.document.tag(*node) != Some("a") {
                continue;
            }
            let href = self.document.attr(*node, "href")?;
            if href.is_empty() || href.starts_with('#') {
                return None;
            }
            return Some(href.to_owned());
        }
        None
    }

    fn build_video_embed(&mut self) {
        let Some(wrapper) = self.contract.video_wrapper else {
            return;
        };
        for child in self.document.children(wrapper) {
            self.document.remove_subtree(child);
        }
        let iframe = self.document.create_element("iframe");
        self.document.set_attr(iframe, "src", EMBED_VIDEO_URL);
        self.document.set_style_text(iframe, EMBED_IFRAME_CSS);
        self.document.set_attr(iframe, "allow", EMBED_ALLOW);
        self.document.set_attr(iframe, "allowfullscreen", "true");
        self.document
            .set_style_property(wrapper, "background", "#000");
        self.document.append_child(wrapper, iframe);
        debug!("video embed built");
    }

    fn open_lightbox(&mut self, item: NodeId) {
        let image = self
            .document
            .descendants(item)
            .into_iter()
            .find(|node| self.document.tag(*node) == Some("img"));
        let Some(image) = image else {
            return;
        };
        let src = self
            .document
            .attr(image, "src")
            .unwrap_or_default()
            .to_owned();

        // Finish a close still in flight so overlays never stack.
        if let LightboxPhase::Closing { nodes, exit_timer } = self.state.lightbox.clone() {
            self.scheduler.cancel_timer(exit_timer);
            self.remove_lightbox(nodes.overlay);
        }
        if matches!(self.state.lightbox, LightboxPhase::Open(_)) {
            return;
        }

        let overlay = self.document.create_element("div");
        self.document.set_style_text(overlay, LIGHTBOX_OVERLAY_CSS);

        let clone = self.document.create_element("img");
        self.document.set_attr(clone, "src", &src);
        self.document.set_style_text(clone, LIGHTBOX_IMAGE_CSS);

        let close = self.document.create_element("button");
        self.document.set_style_text(close, LIGHTBOX_CLOSE_CSS);
        let icon = self.document.create_element("i");
        self.document.add_class(icon, "fas");
        self.document.add_class(icon, "fa-times");
        self.document.append_child(close, icon);

        self.document.append_child(overlay, clone);
        self.document.append_child(overlay, close);
        self.document.append_child(self.contract.body, overlay);
        self.document
            .set_style_property(self.contract.body, "overflow", "hidden");

        let listeners = vec![
            self.table
                .bind(BindTarget::Node(overlay), EventKind::Click, Action::LightboxClick),
            self.table
                .bind(BindTarget::Document, EventKind::KeyDown, Action::LightboxKey),
            self.table.bind(
                BindTarget::Node(close),
                EventKind::PointerEnter,
                Action::CloseHoverEnter,
            ),
            self.table.bind(
                BindTarget::Node(close),
                EventKind::PointerLeave,
                Action::CloseHoverLeave,
            ),
        ];

        self.state = reduce(
            &self.state,
            &UiMessage::LightboxOpened(LightboxNodes {
                overlay,
                image: clone,
                close,
                listeners,
            }),
        );
        // Entrance transition applies on the next animation frame.
        self.scheduler.request_frame(Task::LightboxEnter {
            overlay,
            image: clone,
        });
        debug!(?overlay, "lightbox opened");
    }

    fn begin_lightbox_close(&mut self) {
        let LightboxPhase::Open(nodes) = self.state.lightbox.clone() else {
            return;
        };
        for listener in &nodes.listeners {
            self.table.unbind(*listener);
        }
        self.document
            .set_style_property(nodes.overlay, "opacity", "0");
        self.document
            .set_style_property(nodes.image, "transform", "scale(0.8)");
        let exit_timer = self.scheduler.schedule_timer(
            self.config.lightbox_exit_ms,
            Task::LightboxRemove {
                overlay: nodes.overlay,
            },
        );
        self.state = reduce(&self.state, &UiMessage::LightboxClosing(exit_timer));
        debug!("lightbox closing");
    }

    fn remove_lightbox(&mut self, overlay: NodeId) {
        self.document.remove_subtree(overlay);
        self.document
            .remove_style_property(self.contract.body, "overflow");
        self.state = reduce(&self.state, &UiMessage::LightboxRemoved);
        debug!("lightbox removed");
    }

    fn set_close_background(&mut self, background: &str) {
        let close = match &self.state.lightbox {
            LightboxPhase::Open(nodes) => nodes.close,
            _ => return,
        };
        self.document
            .set_style_property(close, "background", background);
    }

    fn style_hero_flourishes(&mut self) {
        for (index, stat) in self.contract.hero_stats.clone().into_iter().enumerate() {
            let seconds = (index as u64 * self.config.hero_stat_stagger_ms) as f64 / 1000.0;
            self.document
                .set_style_property(stat, "transition-delay", &format!("{seconds}s"));
        }

        if let Some(badge) = self.contract.hero_badge {
            self.document.set_style_property(badge, "opacity", "0");
            self.document
                .set_style_property(badge, "transform", "translateY(10px)");
            self.scheduler
                .schedule_timer(self.config.hero_badge_delay_ms, Task::HeroBadgeReveal { badge });
        }
    }

    fn run_sweeps(&mut self) {
        let revealed = self.reveal_watch.sweep(&self.viewport, &self.document);
        for node in revealed {
            self.document.add_class(node, "visible");
            self.reveal_watch.unobserve(node);
        }

        let started = self.counter_watch.sweep(&self.viewport, &self.document);
        for node in started {
            self.counter_watch.unobserve(node);
            self.start_counter(node);
        }
    }

    fn start_counter(&mut self, node: NodeId) {
        let Some((_, target)) = self
            .contract
            .counters
            .iter()
            .find(|(counter, _)| *counter == node)
            .copied()
        else {
            return;
        };
        let frames = (self.config.counter_duration_ms / self.config.counter_frame_ms).max(1);
        let run = CounterRun {
            target,
            step: target as f64 / frames as f64,
            current: 0.0,
        };
        self.counter_runs.insert(node, run);
        self.scheduler.request_frame(Task::CounterFrame { node });
        debug!(count_to = target, "counter animation started");
    }

    fn step_counter(&mut self, node: NodeId) {
        let Some(run) = self.counter_runs.get(&node).copied() else {
            return;
        };
        let current = run.current + run.step;
        if current >= run.target as f64 {
            self.counter_runs.remove(&node);
            let text = format!("{}+", group_thousands(run.target));
            self.document.set_text(node, &text);
        } else {
            self.counter_runs.insert(
                node,
                CounterRun {
                    current,
                    ..run
                },
            );
            let shown = current.floor() as i64;
            self.document.set_text(node, &group_thousands(shown));
            self.scheduler.request_frame(Task::CounterFrame { node });
        }
    }
}

/// en-US grouping: comma thousands separators.
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    let lead = digits.len() % 3;
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && index % 3 == lead % 3 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
