//! Viewport model and one-shot intersection watching.

use cd_dom::Document;
use cd_dom::NodeId;

/// Visible window over the document, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_y: f32,
    pub height: f32,
}

/// Trigger settings for a watcher. `bottom_margin` shrinks the viewport's
/// bottom edge before the visibility ratio is computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionSettings {
    pub threshold: f32,
    pub bottom_margin: f32,
}

/// One-shot watch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Pending,
    Triggered,
}

/// Tracks elements until they first become sufficiently visible.
#[derive(Debug, Clone)]
pub struct IntersectionWatcher {
    settings: IntersectionSettings,
    watches: Vec<(NodeId, WatchState)>,
}

impl IntersectionWatcher {
    pub fn new(settings: IntersectionSettings) -> Self {
        Self {
            settings,
            watches: Vec::new(),
        }
    }

    pub fn observe(&mut self, node: NodeId) {
        if self.state(node).is_none() {
            self.watches.push((node, WatchState::Pending));
        }
    }

    pub fn unobserve(&mut self, node: NodeId) {
        self.watches.retain(|(watched, _)| *watched != node);
    }

    pub fn state(&self, node: NodeId) -> Option<WatchState> {
        self.watches
            .iter()
            .find(|(watched, _)| *watched == node)
            .map(|(_, state)| *state)
    }

    pub fn pending_count(&self) -> usize {
        self.watches
            .iter()
            .filter(|(_, state)| *state == WatchState::Pending)
            .count()
    }

    /// Marks and returns every pending watch that now meets the visibility
    /// threshold. A watch fires at most once; the document is not mutated.
    pub fn sweep(&mut self, viewport: &Viewport, document: &Document) -> Vec<NodeId> {
        let mut triggered = Vec::new();
        for (node, state) in &mut self.watches {
            if *state != WatchState::Pending {
                continue;
            }
            let Some(metrics) = document.metrics(*node) else {
                continue;
            };
            let ratio = visibility_ratio(
                metrics.top,
                metrics.height,
                viewport,
                self.settings.bottom_margin,
            );
            if ratio >= self.settings.threshold {
                *state = WatchState::Triggered;
                triggered.push(*node);
            }
        }
        triggered
    }
}

fn visibility_ratio(top: f32, height: f32, viewport: &Viewport, bottom_margin: f32) -> f32 {
    let view_top = viewport.scroll_y;
    let view_bottom = viewport.scroll_y + viewport.height - bottom_margin;
    if view_bottom <= view_top {
        return 0.0;
    }

    let bottom = top + height;
    if height <= 0.0 {
        // Zero-height elements count as fully visible when their edge lies
        // inside the adjusted span.
        return if top >= view_top && top <= view_bottom {
            1.0
        } else {
            0.0
        };
    }

    let overlap = bottom.min(view_bottom) - top.max(view_top);
    (overlap / height).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::IntersectionSettings;
    use super::IntersectionWatcher;
    use super::Viewport;
    use super::WatchState;
    use cd_dom::BoxMetrics;
    use cd_dom::Document;

    const REVEAL: IntersectionSettings = IntersectionSettings {
        threshold: 0.12,
        bottom_margin: 40.0,
    };

    fn doc_with_element(top: f32, height: f32) -> (Document, cd_dom::NodeId) {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.append_child(doc.root(), el);
        doc.set_metrics(el, BoxMetrics { top, height });
        (doc, el)
    }

    #[test]
    fn triggers_once_at_threshold() {
        let (doc, el) = doc_with_element(900.0, 400.0);
        let mut watcher = IntersectionWatcher::new(REVEAL);
        watcher.observe(el);

        let hidden = Viewport {
            scroll_y: 0.0,
            height: 800.0,
        };
        assert!(watcher.sweep(&hidden, &doc).is_empty());
        assert_eq!(watcher.state(el), Some(WatchState::Pending));

        let visible = Viewport {
            scroll_y: 400.0,
            height: 800.0,
        };
        assert_eq!(watcher.sweep(&visible, &doc), vec![el]);
        assert_eq!(watcher.state(el), Some(WatchState::Triggered));

        // One-shot: repeated sweeps do not re-fire.
        assert!(watcher.sweep(&visible, &doc).is_empty());
    }

    #[test]
    fn bottom_margin_shrinks_the_viewport() {
        // Element hangs just past the real viewport bottom; with the 40-unit
        // margin only 10 of its 400 units are inside the adjusted span.
        let (doc, el) = doc_with_element(750.0, 400.0);
        let mut watcher = IntersectionWatcher::new(REVEAL);
        watcher.observe(el);

        let viewport = Viewport {
            scroll_y: 0.0,
            height: 800.0,
        };
        assert!(watcher.sweep(&viewport, &doc).is_empty());

        let mut unmargined = IntersectionWatcher::new(IntersectionSettings {
            threshold: 0.12,
            bottom_margin: 0.0,
        });
        unmargined.observe(el);
        assert_eq!(unmargined.sweep(&viewport, &doc), vec![el]);
    }

    #[test]
    fn elements_without_metrics_never_trigger() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.append_child(doc.root(), el);

        let mut watcher = IntersectionWatcher::new(REVEAL);
        watcher.observe(el);
        let viewport = Viewport {
            scroll_y: 0.0,
            height: 800.0,
        };
        assert!(watcher.sweep(&viewport, &doc).is_empty());
        assert_eq!(watcher.state(el), Some(WatchState::Pending));
    }

    #[test]
    fn unobserve_releases_the_watch() {
        let (doc, el) = doc_with_element(100.0, 200.0);
        let mut watcher = IntersectionWatcher::new(REVEAL);
        watcher.observe(el);
        watcher.observe(el);
        assert_eq!(watcher.pending_count(), 1);

        watcher.unobserve(el);
        assert_eq!(watcher.state(el), None);
        let viewport = Viewport {
            scroll_y: 0.0,
            height: 800.0,
        };
        assert!(watcher.sweep(&viewport, &doc).is_empty());
    }

    #[test]
    fn zero_height_elements_use_edge_containment() {
        let (doc, el) = doc_with_element(500.0, 0.0);
        let mut watcher = IntersectionWatcher::new(IntersectionSettings {
            threshold: 0.5,
            bottom_margin: 0.0,
        });
        watcher.observe(el);
        let viewport = Viewport {
            scroll_y: 0.0,
            height: 800.0,
        };
        assert_eq!(watcher.sweep(&viewport, &doc), vec![el]);
    }
}
