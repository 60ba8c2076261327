use crate::EventOutcome;
use crate::HighlightState;
use crate::InteractionConfig;
use crate::LightboxPhase;
use crate::MenuState;
use crate::PageRuntime;
use cd_dom::BoxMetrics;
use cd_dom::Document;
use cd_dom::NodeId;
use cd_events::Event;
use cd_events::Key;
use cd_html::HtmlParser;
use cd_observe::Viewport;

const PAGE: &str = r##"
<html>
<head><title>Gyandeep Public School</title></head>
<body>
  <nav id="navbar">
    <div id="hamburger"></div>
    <ul id="nav-menu">
      <li><a id="nav-home" href="#hero">Home</a></li>
      <li><a id="nav-academics" href="#academics">Academics</a></li>
      <li class="dropdown">
        <a id="about-trigger" href="#">About</a>
        <ul class="dropdown-menu">
          <li><a id="history-link" href="history.html">History</a></li>
        </ul>
      </li>
      <li><a id="nav-gallery" href="#gallery">Gallery</a></li>
    </ul>
  </nav>
  <div id="mobile-overlay"></div>
  <section id="hero">
    <div class="hero-badge"></div>
    <div id="stat-0" class="hero-stat"></div>
    <div id="stat-1" class="hero-stat"></div>
    <div id="stat-2" class="hero-stat"></div>
  </section>
  <section id="academics"><span id="students" data-count="1200"></span></section>
  <section id="gallery">
    <div id="g1" class="gallery-item"><img id="g1-img" src="images/one.jpg"></div>
  </section>
  <div id="video-wrapper"><button id="play"></button></div>
  <div id="reveal-card" class="fade-up"></div>
  <a id="bare-anchor" href="#">noop</a>
  <a id="dangling-anchor" href="#nowhere">gone</a>
  <button id="scroll-top"></button>
</body>
</html>
"##;

fn set_metrics(document: &mut Document, id: &str, top: f32, height: f32) {
    let Some(node) = document.element_by_id(id) else {
        panic!("fixture is missing #{id}");
    };
    document.set_metrics(node, BoxMetrics { top, height });
}

fn fixture_document() -> Document {
    let mut document = HtmlParser.parse(PAGE);
    set_metrics(&mut document, "navbar", 0.0, 72.0);
    set_metrics(&mut document, "hero", 0.0, 700.0);
    set_metrics(&mut document, "academics", 700.0, 600.0);
    set_metrics(&mut document, "gallery", 1300.0, 500.0);
    set_metrics(&mut document, "students", 900.0, 40.0);
    set_metrics(&mut document, "reveal-card", 2000.0, 300.0);
    document
}

fn install_at(url: &str) -> PageRuntime {
    let viewport = Viewport {
        scroll_y: 0.0,
        height: 800.0,
    };
    let runtime = PageRuntime::install(
        fixture_document(),
        url,
        viewport,
        InteractionConfig::default(),
    );
    match runtime {
        Ok(runtime) => runtime,
        Err(error) => panic!("install failed: {error}"),
    }
}

fn install_home() -> PageRuntime {
    install_at("https://school.example/index.html")
}

fn node(runtime: &PageRuntime, id: &str) -> NodeId {
    let Some(node) = runtime.document().element_by_id(id) else {
        panic!("fixture is missing #{id}");
    };
    node
}

fn click(runtime: &mut PageRuntime, id: &str) -> EventOutcome {
    let target = node(runtime, id);
    runtime.dispatch(Event::Click { target })
}

#[test]
fn install_fails_without_the_nav_menu() {
    let document = HtmlParser.parse(
        "<body><nav id='navbar'></nav><button id='scroll-top'></button></body>",
    );
    let viewport = Viewport {
        scroll_y: 0.0,
        height: 800.0,
    };
    let Err(error) = PageRuntime::install(
        document,
        "https://school.example/",
        viewport,
        InteractionConfig::default(),
    ) else {
        panic!("expected install to fail");
    };
    assert_eq!(error.code, "page.nav_menu_missing");
}

#[test]
fn install_rejects_unparseable_page_urls() {
    let Err(error) = PageRuntime::install(
        fixture_document(),
        "not a url",
        Viewport {
            scroll_y: 0.0,
            height: 800.0,
        },
        InteractionConfig::default(),
    ) else {
        panic!("expected install to fail");
    };
    assert_eq!(error.code, "page.url_invalid");
}

#[test]
fn mobile_menu_flags_stay_in_lockstep() {
    let mut runtime = install_home();
    let hamburger = node(&runtime, "hamburger");
    let menu = node(&runtime, "nav-menu");
    let overlay = node(&runtime, "mobile-overlay");
    let body = runtime.document().body();

    click(&mut runtime, "hamburger");
    for flagged in [hamburger, menu, overlay] {
        assert!(runtime.document().has_class(flagged, "active"));
    }
    assert_eq!(
        runtime.document().style(body).and_then(|s| s.get("overflow")),
        Some("hidden")
    );

    click(&mut runtime, "mobile-overlay");
    for flagged in [hamburger, menu, overlay] {
        assert!(!runtime.document().has_class(flagged, "active"));
    }
    assert_eq!(
        runtime.document().style(body).and_then(|s| s.get("overflow")),
        None
    );
}

#[test]
fn selecting_a_nav_link_closes_an_open_menu() {
    let mut runtime = install_home();
    click(&mut runtime, "hamburger");
    assert_eq!(runtime.state().menu, MenuState::Open);

    click(&mut runtime, "nav-academics");
    assert_eq!(runtime.state().menu, MenuState::Closed);
    let menu = node(&runtime, "nav-menu");
    assert!(!runtime.document().has_class(menu, "active"));
}

#[test]
fn at_most_one_dropdown_is_active_and_outside_clicks_close() {
    let mut runtime = install_home();
    let dropdown = {
        let trigger = node(&runtime, "about-trigger");
        let Some(item) = runtime.document().parent(trigger) else {
            panic!("trigger has no parent");
        };
        item
    };

    let outcome = click(&mut runtime, "about-trigger");
    assert!(outcome.default_prevented);
    assert!(runtime.document().has_class(dropdown, "active"));
    assert_eq!(runtime.state().open_dropdowns.len(), 1);

    // Re-clicking the open trigger closes it.
    click(&mut runtime, "about-trigger");
    assert!(!runtime.document().has_class(dropdown, "active"));

    click(&mut runtime, "about-trigger");
    click(&mut runtime, "hero");
    assert!(runtime.state().open_dropdowns.is_empty());
    assert!(!runtime.document().has_class(dropdown, "active"));
}

#[test]
fn sub_link_click_cascades_into_closing_the_menu() {
    let mut runtime = install_home();
    click(&mut runtime, "hamburger");
    click(&mut runtime, "about-trigger");
    assert_eq!(runtime.state().open_dropdowns.len(), 1);

    let outcome = click(&mut runtime, "history-link");
    assert!(runtime.state().open_dropdowns.is_empty());
    assert_eq!(runtime.state().menu, MenuState::Closed);
    // The engine did not consume the click, so the embedder navigates.
    assert_eq!(outcome.navigation.as_deref(), Some("history.html"));
}

#[test]
fn scroll_top_visibility_is_a_strict_threshold_function() {
    let mut runtime = install_home();
    let control = node(&runtime, "scroll-top");

    runtime.dispatch(Event::Scroll { to: 400.0 });
    assert!(!runtime.document().has_class(control, "visible"));

    runtime.dispatch(Event::Scroll { to: 401.0 });
    assert!(runtime.document().has_class(control, "visible"));

    runtime.dispatch(Event::Scroll { to: 10.0 });
    assert!(!runtime.document().has_class(control, "visible"));
}

#[test]
fn scroll_top_click_animates_back_to_the_origin() {
    let mut runtime = install_home();
    runtime.dispatch(Event::Scroll { to: 800.0 });
    click(&mut runtime, "scroll-top");

    runtime.tick(100);
    let midway = runtime.viewport().scroll_y;
    assert!(midway < 800.0);
    assert!(midway > 0.0);

    runtime.tick(300);
    assert_eq!(runtime.viewport().scroll_y, 0.0);
}

#[test]
fn host_scroll_interrupts_a_smooth_scroll() {
    let mut runtime = install_home();
    runtime.dispatch(Event::Scroll { to: 800.0 });
    click(&mut runtime, "scroll-top");
    runtime.tick(100);

    runtime.dispatch(Event::Scroll { to: 500.0 });
    runtime.tick(300);
    assert_eq!(runtime.viewport().scroll_y, 500.0);
}

#[test]
fn navbar_shadow_tracks_the_scroll_offset() {
    let mut runtime = install_home();
    let navbar = node(&runtime, "navbar");

    runtime.dispatch(Event::Scroll { to: 150.0 });
    let strong = runtime
        .document()
        .style(navbar)
        .and_then(|s| s.get("box-shadow"))
        .map(str::to_owned);
    assert_eq!(strong.as_deref(), Some("0 6px 30px rgba(11, 122, 109, 0.4)"));

    runtime.dispatch(Event::Scroll { to: 50.0 });
    let light = runtime
        .document()
        .style(navbar)
        .and_then(|s| s.get("box-shadow"))
        .map(str::to_owned);
    assert_eq!(light.as_deref(), Some("0 4px 20px rgba(11, 122, 109, 0.3)"));
}

#[test]
fn anchor_click_scrolls_past_the_navbar_height() {
    let mut runtime = install_home();
    let outcome = click(&mut runtime, "nav-academics");
    assert!(outcome.default_prevented);
    assert_eq!(outcome.navigation, None);

    runtime.tick(400);
    // Section top 700 minus the navbar's 72-unit height.
    assert_eq!(runtime.viewport().scroll_y, 628.0);
}

#[test]
fn anchor_offset_falls_back_when_the_navbar_has_no_height() {
    let mut document = fixture_document();
    let Some(navbar) = document.element_by_id("navbar") else {
        panic!("navbar missing");
    };
    document.set_metrics(
        navbar,
        BoxMetrics {
            top: 0.0,
            height: 0.0,
        },
    );
    let runtime = PageRuntime::install(
        document,
        "https://school.example/index.html",
        Viewport {
            scroll_y: 0.0,
            height: 800.0,
        },
        InteractionConfig::default(),
    );
    let Ok(mut runtime) = runtime else {
        panic!("install failed");
    };

    click(&mut runtime, "nav-academics");
    runtime.tick(400);
    assert_eq!(runtime.viewport().scroll_y, 640.0);
}

#[test]
fn bare_and_dangling_anchors_keep_default_handling() {
    let mut runtime = install_home();

    let bare = click(&mut runtime, "bare-anchor");
    assert!(!bare.default_prevented);
    assert_eq!(bare.navigation, None);

    let dangling = click(&mut runtime, "dangling-anchor");
    assert!(!dangling.default_prevented);
    assert_eq!(dangling.navigation, None);
    runtime.tick(400);
    assert_eq!(runtime.viewport().scroll_y, 0.0);
}

#[test]
fn highlighting_waits_for_the_first_scroll() {
    let runtime = install_home();
    assert_eq!(runtime.state().highlight, HighlightState::Inactive);
    let home = node(&runtime, "nav-home");
    assert!(!runtime.document().has_class(home, "active"));
}

#[test]
fn scrolling_into_a_section_highlights_its_link_only() {
    let mut runtime = install_home();
    runtime.dispatch(Event::Scroll { to: 700.0 });

    assert_eq!(
        runtime.state().highlight,
        HighlightState::Section("academics".to_owned())
    );
    let academics = node(&runtime, "nav-academics");
    assert!(runtime.document().has_class(academics, "active"));
    for other in ["nav-home", "nav-gallery", "about-trigger"] {
        let link = node(&runtime, other);
        assert!(!runtime.document().has_class(link, "active"));
    }
}

#[test]
fn hero_and_unmatched_offsets_highlight_the_home_link() {
    let mut runtime = install_home();
    runtime.dispatch(Event::Scroll { to: 100.0 });
    assert_eq!(runtime.state().highlight, HighlightState::Home);
    let home = node(&runtime, "nav-home");
    assert!(runtime.document().has_class(home, "active"));
    let academics = node(&runtime, "nav-academics");
    assert!(!runtime.document().has_class(academics, "active"));
}

#[test]
fn overlapping_sections_resolve_to_the_last_match() {
    // Gallery's span is pulled up to overlap academics; document order makes
    // the later section win. Preserved as-is from the page this engine
    // replaces.
    let mut document = fixture_document();
    set_metrics(&mut document, "gallery", 900.0, 500.0);
    let runtime = PageRuntime::install(
        document,
        "https://school.example/index.html",
        Viewport {
            scroll_y: 0.0,
            height: 800.0,
        },
        InteractionConfig::default(),
    );
    let Ok(mut runtime) = runtime else {
        panic!("install failed");
    };

    runtime.dispatch(Event::Scroll { to: 800.0 });
    assert_eq!(
        runtime.state().highlight,
        HighlightState::Section("gallery".to_owned())
    );
}

#[test]
fn highlighting_never_runs_off_the_home_page() {
    let mut runtime = install_at("https://school.example/about.html");
    runtime.dispatch(Event::Scroll { to: 700.0 });
    assert_eq!(runtime.state().highlight, HighlightState::Inactive);
    for id in ["nav-home", "nav-academics", "nav-gallery"] {
        let link = node(&runtime, id);
        assert!(!runtime.document().has_class(link, "active"));
    }
}

#[test]
fn reveal_elements_become_visible_once() {
    let mut runtime = install_home();
    let card = node(&runtime, "reveal-card");
    assert!(!runtime.document().has_class(card, "visible"));

    runtime.dispatch(Event::Scroll { to: 1400.0 });
    assert!(runtime.document().has_class(card, "visible"));

    runtime.dispatch(Event::Scroll { to: 0.0 });
    runtime.dispatch(Event::Scroll { to: 1400.0 });
    assert!(runtime.document().has_class(card, "visible"));
}

#[test]
fn counter_counts_monotonically_to_the_grouped_target() {
    let mut runtime = install_home();
    let counter = node(&runtime, "students");

    runtime.dispatch(Event::Scroll { to: 600.0 });

    let mut last = -1_i64;
    let mut final_text = String::new();
    for _ in 0..200 {
        runtime.tick(16);
        let text = runtime.document().text_content(counter);
        if text.is_empty() {
            continue;
        }
        let numeric: i64 = text
            .trim_end_matches('+')
            .replace(',', "")
            .parse()
            .unwrap_or_else(|_| panic!("unparseable counter text `{text}`"));
        assert!(numeric >= last, "counter went backwards: {last} -> {numeric}");
        last = numeric;
        final_text = text;
    }

    assert_eq!(final_text, "1,200+");

    // One-shot: re-entering the viewport does not restart the animation.
    runtime.dispatch(Event::Scroll { to: 0.0 });
    runtime.dispatch(Event::Scroll { to: 600.0 });
    runtime.tick(16);
    runtime.tick(16);
    assert_eq!(runtime.document().text_content(counter), "1,200+");
}

#[test]
fn video_click_swaps_in_a_single_embed_frame() {
    let mut runtime = install_home();
    let wrapper = node(&runtime, "video-wrapper");

    click(&mut runtime, "play");
    let children = runtime.document().children(wrapper);
    assert_eq!(children.len(), 1);
    let iframe = children[0];
    assert_eq!(runtime.document().tag(iframe), Some("iframe"));
    assert_eq!(
        runtime.document().attr(iframe, "src"),
        Some("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1")
    );
    assert_eq!(
        runtime.document().style(wrapper).and_then(|s| s.get("background")),
        Some("#000")
    );

    // Irreversible: a repeat click rebuilds the embed, never stacks it.
    click(&mut runtime, "video-wrapper");
    assert_eq!(runtime.document().children(wrapper).len(), 1);
}

#[test]
fn lightbox_opens_with_a_matching_clone_and_locks_scroll() {
    let mut runtime = install_home();
    let body = runtime.document().body();
    let before = runtime.document().children(body).len();

    click(&mut runtime, "g1-img");
    let LightboxPhase::Open(nodes) = runtime.state().lightbox.clone() else {
        panic!("lightbox did not open");
    };
    assert_eq!(runtime.document().children(body).len(), before + 1);
    assert_eq!(
        runtime.document().attr(nodes.image, "src"),
        Some("images/one.jpg")
    );
    assert_eq!(
        runtime.document().style(body).and_then(|s| s.get("overflow")),
        Some("hidden")
    );
    assert_eq!(
        runtime.document().style(nodes.overlay).and_then(|s| s.get("opacity")),
        Some("0")
    );

    // Entrance transition lands on the next frame.
    runtime.tick(16);
    assert_eq!(
        runtime.document().style(nodes.overlay).and_then(|s| s.get("opacity")),
        Some("1")
    );
    assert_eq!(
        runtime.document().style(nodes.image).and_then(|s| s.get("transform")),
        Some("scale(1)")
    );
}

#[test]
fn escape_closes_the_lightbox_and_releases_its_listener() {
    let mut runtime = install_home();
    click(&mut runtime, "g1-img");
    runtime.tick(16);
    let LightboxPhase::Open(nodes) = runtime.state().lightbox.clone() else {
        panic!("lightbox did not open");
    };

    runtime.dispatch(Event::KeyDown { key: Key::Escape });
    assert!(matches!(
        runtime.state().lightbox,
        LightboxPhase::Closing { .. }
    ));
    assert_eq!(
        runtime.document().style(nodes.overlay).and_then(|s| s.get("opacity")),
        Some("0")
    );

    // A second escape during the exit fade is ignored.
    runtime.dispatch(Event::KeyDown { key: Key::Escape });
    assert!(matches!(
        runtime.state().lightbox,
        LightboxPhase::Closing { .. }
    ));

    runtime.tick(300);
    assert_eq!(runtime.state().lightbox, LightboxPhase::Closed);
    assert!(!runtime.document().is_live(nodes.overlay));
    let body = runtime.document().body();
    assert_eq!(
        runtime.document().style(body).and_then(|s| s.get("overflow")),
        None
    );

    // The per-open escape listener is gone.
    runtime.dispatch(Event::KeyDown { key: Key::Escape });
    assert_eq!(runtime.state().lightbox, LightboxPhase::Closed);
}

#[test]
fn backdrop_click_closes_but_image_clicks_do_not() {
    let mut runtime = install_home();
    click(&mut runtime, "g1-img");
    let LightboxPhase::Open(nodes) = runtime.state().lightbox.clone() else {
        panic!("lightbox did not open");
    };

    runtime.dispatch(Event::Click {
        target: nodes.image,
    });
    assert!(matches!(runtime.state().lightbox, LightboxPhase::Open(_)));

    runtime.dispatch(Event::Click {
        target: nodes.overlay,
    });
    assert!(matches!(
        runtime.state().lightbox,
        LightboxPhase::Closing { .. }
    ));
    runtime.tick(300);
    assert_eq!(runtime.state().lightbox, LightboxPhase::Closed);
}

#[test]
fn close_control_hover_swaps_its_background() {
    let mut runtime = install_home();
    click(&mut runtime, "g1-img");
    let LightboxPhase::Open(nodes) = runtime.state().lightbox.clone() else {
        panic!("lightbox did not open");
    };

    runtime.dispatch(Event::PointerEnter {
        target: nodes.close,
    });
    assert_eq!(
        runtime.document().style(nodes.close).and_then(|s| s.get("background")),
        Some("rgba(240,168,48,0.8)")
    );
    runtime.dispatch(Event::PointerLeave {
        target: nodes.close,
    });
    assert_eq!(
        runtime.document().style(nodes.close).and_then(|s| s.get("background")),
        Some("rgba(255,255,255,0.15)")
    );
}

#[test]
fn reopening_during_the_exit_fade_never_stacks_overlays() {
    let mut runtime = install_home();
    let body = runtime.document().body();
    let before = runtime.document().children(body).len();

    click(&mut runtime, "g1-img");
    runtime.dispatch(Event::KeyDown { key: Key::Escape });
    // Still fading out when the gallery is clicked again.
    runtime.tick(100);
    click(&mut runtime, "g1-img");

    assert!(matches!(runtime.state().lightbox, LightboxPhase::Open(_)));
    assert_eq!(runtime.document().children(body).len(), before + 1);

    // The cancelled exit timer must not remove the fresh overlay.
    runtime.tick(300);
    assert!(matches!(runtime.state().lightbox, LightboxPhase::Open(_)));
    assert_eq!(runtime.document().children(body).len(), before + 1);
}

#[test]
fn hero_stats_receive_staggered_transition_delays() {
    let runtime = install_home();
    for (index, expected) in [("stat-0", "0s"), ("stat-1", "0.1s"), ("stat-2", "0.2s")] {
        let stat = node(&runtime, index);
        assert_eq!(
            runtime
                .document()
                .style(stat)
                .and_then(|s| s.get("transition-delay")),
            Some(expected)
        );
    }
}

#[test]
fn hero_badge_reveals_after_its_delay() {
    let mut runtime = install_home();
    let badges = runtime.document().elements_with_class("hero-badge");
    assert_eq!(badges.len(), 1);
    let badge = badges[0];

    assert_eq!(
        runtime.document().style(badge).and_then(|s| s.get("opacity")),
        Some("0")
    );

    runtime.tick(299);
    assert_eq!(
        runtime.document().style(badge).and_then(|s| s.get("opacity")),
        Some("0")
    );

    runtime.tick(1);
    assert_eq!(
        runtime.document().style(badge).and_then(|s| s.get("opacity")),
        Some("1")
    );
    assert_eq!(
        runtime.document().style(badge).and_then(|s| s.get("transform")),
        Some("translateY(0)")
    );
}
