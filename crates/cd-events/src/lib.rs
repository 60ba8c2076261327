//! Event model and dispatch table.
//!
//! Handlers are registered in an [`EventTable`] keyed by (bind target, event
//! kind) instead of being scattered across closures. Dispatch collects the
//! bound actions for an event and hands them back to the caller to run.

use cd_dom::NodeId;

/// Event categories the page engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    KeyDown,
    Scroll,
    PointerEnter,
    PointerLeave,
}

/// Key identity for keydown events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Char(char),
}

/// A host-delivered input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Click { target: NodeId },
    KeyDown { key: Key },
    Scroll { to: f32 },
    PointerEnter { target: NodeId },
    PointerLeave { target: NodeId },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Click { .. } => EventKind::Click,
            Self::KeyDown { .. } => EventKind::KeyDown,
            Self::Scroll { .. } => EventKind::Scroll,
            Self::PointerEnter { .. } => EventKind::PointerEnter,
            Self::PointerLeave { .. } => EventKind::PointerLeave,
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        match self {
            Self::Click { target } | Self::PointerEnter { target } | Self::PointerLeave { target } => {
                Some(*target)
            }
            _ => None,
        }
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget {
    Node(NodeId),
    Document,
}

/// Handle for exact listener removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
struct Listener<A> {
    id: ListenerId,
    target: BindTarget,
    kind: EventKind,
    action: A,
}

/// Dispatch table mapping (target, event kind) to actions.
#[derive(Debug, Clone)]
pub struct EventTable<A> {
    listeners: Vec<Listener<A>>,
    next_id: u64,
}

impl<A> Default for EventTable<A> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<A: Clone> EventTable<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, target: BindTarget, kind: EventKind, action: A) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.push(Listener {
            id,
            target,
            kind,
            action,
        });
        id
    }

    /// Removes one listener by id. Returns whether it was present.
    pub fn unbind(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Actions for a bubbling event whose ancestor path (target first) is
    /// `path`: node bindings in path order, insertion order within a node,
    /// document bindings last.
    pub fn collect(&self, path: &[NodeId], kind: EventKind) -> Vec<A> {
        let mut actions = Vec::new();
        for node in path {
            for listener in &self.listeners {
                if listener.kind == kind && listener.target == BindTarget::Node(*node) {
                    actions.push(listener.action.clone());
                }
            }
        }
        for listener in &self.listeners {
            if listener.kind == kind && listener.target == BindTarget::Document {
                actions.push(listener.action.clone());
            }
        }
        actions
    }

    /// Actions for document-level events (scroll, keydown).
    pub fn collect_document(&self, kind: EventKind) -> Vec<A> {
        self.listeners
            .iter()
            .filter(|listener| listener.kind == kind && listener.target == BindTarget::Document)
            .map(|listener| listener.action.clone())
            .collect()
    }

    /// Actions bound directly to one node, for non-bubbling pointer events.
    pub fn collect_at(&self, node: NodeId, kind: EventKind) -> Vec<A> {
        self.listeners
            .iter()
            .filter(|listener| {
                listener.kind == kind && listener.target == BindTarget::Node(node)
            })
            .map(|listener| listener.action.clone())
            .collect()
    }
}
