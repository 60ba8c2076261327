//! Arena-based document model.
//!
//! Nodes live in a slot arena addressed by [`NodeId`]. Removing a subtree
//! vacates its slots but ids are never reissued, so a stale handle resolves to
//! nothing instead of aliasing a later node.

mod style;

pub use style::StyleMap;

/// Opaque handle addressing a node in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Document-space position of an element, supplied by the embedder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMetrics {
    pub top: f32,
    pub height: f32,
}

/// Ordered class token list with set semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    tokens: Vec<String>,
}

impl ClassList {
    pub fn from_attr(value: &str) -> Self {
        let mut list = Self::default();
        for token in value.split_whitespace() {
            list.add(token);
        }
        list
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|existing| existing == token)
    }

    pub fn add(&mut self, token: &str) {
        if !token.is_empty() && !self.contains(token) {
            self.tokens.push(token.to_owned());
        }
    }

    pub fn remove(&mut self, token: &str) {
        self.tokens.retain(|existing| existing != token);
    }

    /// Returns whether the token is present after the toggle.
    pub fn toggle(&mut self, token: &str) -> bool {
        if self.contains(token) {
            self.remove(token);
            false
        } else {
            self.add(token);
            true
        }
    }

    pub fn set(&mut self, token: &str, present: bool) {
        if present {
            self.add(token);
        } else {
            self.remove(token);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Element payload: tag, identity, classes, attributes, inline style, metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub id: Option<String>,
    pub classes: ClassList,
    pub attrs: Vec<(String, String)>,
    pub style: StyleMap,
    pub metrics: Option<BoxMetrics>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            id: None,
            classes: ClassList::default(),
            attrs: Vec::new(),
            style: StyleMap::default(),
            metrics: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            entry.1 = value.to_owned();
        } else {
            self.attrs.push((name.to_owned(), value.to_owned()));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Parsed page document: node arena plus the root element.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    pub title: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Element(ElementData::new("document")),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
            title: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `body` element, or the root when the markup has none.
    pub fn body(&self) -> NodeId {
        self.elements_with_tag("body")
            .first()
            .copied()
            .unwrap_or(self.root)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_owned()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        if let Some(old_parent) = self.parent(child) {
            if let Some(node) = self.node_mut(old_parent) {
                node.children.retain(|existing| *existing != child);
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Replaces the node's children with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        let children = self.children(node);
        for child in children {
            self.remove_subtree(child);
        }
        let text_node = self.create_text(text);
        self.append_child(node, text_node);
    }

    /// Detaches the node from its parent and vacates every slot beneath it.
    pub fn remove_subtree(&mut self, node: NodeId) {
        if self.node(node).is_none() {
            return;
        }
        if let Some(parent) = self.parent(node) {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|existing| *existing != node);
            }
        }
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if let Some(slot) = self.nodes.get_mut(current.0) {
                if let Some(taken) = slot.take() {
                    pending.extend(taken.children);
                }
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Node ids from `id` up to the root, inclusive at both ends.
    pub fn ancestor_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if self.node(node).is_none() {
                break;
            }
            path.push(node);
            current = self.parent(node);
        }
        path
    }

    /// Nearest ancestor (including `id` itself) carrying the class.
    pub fn closest_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        self.ancestor_path(id)
            .into_iter()
            .find(|candidate| self.has_class(*candidate, class))
    }

    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestor_path(id).contains(&ancestor)
    }

    /// Every live node beneath `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending = self.children(id);
        pending.reverse();
        while let Some(current) = pending.pop() {
            if self.node(current).is_none() {
                continue;
            }
            out.push(current);
            let mut children = self.children(current);
            children.reverse();
            pending.extend(children);
        }
        out
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.all_live_elements()
            .find(|node| self.element(*node).and_then(|el| el.id.as_deref()) == Some(id))
    }

    pub fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        self.all_live_elements()
            .filter(|node| self.has_class(*node, class))
            .collect()
    }

    pub fn elements_with_tag(&self, tag: &str) -> Vec<NodeId> {
        self.all_live_elements()
            .filter(|node| self.tag(*node) == Some(tag))
            .collect()
    }

    fn all_live_elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root)
            .into_iter()
            .chain(std::iter::once(self.root))
            .filter(|id| self.element(*id).is_some())
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn id_of(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|el| el.id.as_deref())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .map(|el| el.classes.contains(class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.classes.add(class);
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.classes.remove(class);
        }
    }

    pub fn set_class(&mut self, id: NodeId, class: &str, present: bool) {
        if let Some(el) = self.element_mut(id) {
            el.classes.set(class, present);
        }
    }

    pub fn style(&self, id: NodeId) -> Option<&StyleMap> {
        self.element(id).map(|el| &el.style)
    }

    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.style.set(name, value);
        }
    }

    pub fn remove_style_property(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.style.remove(name);
        }
    }

    pub fn set_style_text(&mut self, id: NodeId, css_text: &str) {
        if let Some(el) = self.element_mut(id) {
            el.style = StyleMap::parse_inline(css_text);
        }
    }

    pub fn metrics(&self, id: NodeId) -> Option<BoxMetrics> {
        self.element(id).and_then(|el| el.metrics)
    }

    pub fn set_metrics(&mut self, id: NodeId, metrics: BoxMetrics) {
        if let Some(el) = self.element_mut(id) {
            el.metrics = Some(metrics);
        }
    }

    /// Concatenated text of the node's subtree in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for descendant in self.descendants(id) {
            if let Some(text) = self.text(descendant) {
                out.push_str(text);
            }
        }
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
