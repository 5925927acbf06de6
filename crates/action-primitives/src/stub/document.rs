use std::collections::BTreeMap;

use super::selector::{Selector, SelectorError};

/// Index of an element inside a [`Document`] arena.
pub type ElementKey = usize;

/// Builder for a new element.
#[derive(Clone, Debug, Default)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    hidden: bool,
    disabled: bool,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds every whitespace separated token of `classes`.
    pub fn class(mut self, classes: impl AsRef<str>) -> Self {
        for token in classes.as_ref().split_whitespace() {
            if !self.classes.iter().any(|c| c == token) {
                self.classes.push(token.to_string());
            }
        }
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) tag: String,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) text: String,
    pub(crate) value: String,
    pub(crate) hidden: bool,
    pub(crate) disabled: bool,
    pub(crate) detached: bool,
    pub(crate) parent: Option<ElementKey>,
    pub(crate) children: Vec<ElementKey>,
    pub(crate) failing_direct: u32,
    pub(crate) failing_forced: u32,
}

impl NodeData {
    fn from_element(element: Element, parent: Option<ElementKey>) -> Self {
        let value = element.attrs.get("value").cloned().unwrap_or_default();
        Self {
            tag: element.tag,
            id: element.id,
            classes: element.classes,
            attrs: element.attrs,
            text: element.text,
            value,
            hidden: element.hidden,
            disabled: element.disabled,
            detached: false,
            parent,
            children: Vec::new(),
            failing_direct: 0,
            failing_forced: 0,
        }
    }

    fn is_form_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }

    pub(crate) fn attribute(&self, key: &str) -> Option<String> {
        match key {
            "id" => self.id.clone(),
            "class" => (!self.classes.is_empty()).then(|| self.classes.join(" ")),
            "value" if self.is_form_control() => Some(self.value.clone()),
            _ => self.attrs.get(key).cloned(),
        }
    }
}

/// Mutable element tree backing a [`MemoryDriver`](super::MemoryDriver).
///
/// Removed elements stay in the arena marked as detached, so handles to them
/// report stale instead of silently pointing at new content.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::from_element(Element::new("html"), None)],
        }
    }

    pub fn root(&self) -> ElementKey {
        0
    }

    pub(crate) fn node(&self, key: ElementKey) -> Option<&NodeData> {
        self.nodes.get(key)
    }

    fn node_mut(&mut self, key: ElementKey) -> Option<&mut NodeData> {
        self.nodes.get_mut(key)
    }

    pub fn append(&mut self, parent: ElementKey, element: Element) -> ElementKey {
        let key = self.nodes.len();
        self.nodes.push(NodeData::from_element(element, Some(parent)));
        if let Some(node) = self.node_mut(parent) {
            node.children.push(key);
        }
        key
    }

    pub fn is_attached(&self, key: ElementKey) -> bool {
        self.node(key).map(|n| !n.detached).unwrap_or(false)
    }

    /// First attached element with `id`, in document order.
    pub fn by_id(&self, id: &str) -> Option<ElementKey> {
        self.descendants(self.root())
            .into_iter()
            .find(|key| self.nodes[*key].id.as_deref() == Some(id))
    }

    pub fn parent(&self, key: ElementKey) -> Option<ElementKey> {
        self.node(key).and_then(|n| n.parent)
    }

    pub fn children(&self, key: ElementKey) -> Vec<ElementKey> {
        self.node(key)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, key: ElementKey) -> &str {
        self.node(key).map(|n| n.tag.as_str()).unwrap_or("")
    }

    pub fn id_of(&self, key: ElementKey) -> Option<&str> {
        self.node(key).and_then(|n| n.id.as_deref())
    }

    pub fn attr(&self, key: ElementKey, name: &str) -> Option<String> {
        self.node(key).and_then(|n| n.attribute(name))
    }

    pub fn set_attr(&mut self, key: ElementKey, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.node_mut(key) {
            node.attrs.insert(name.into(), value.into());
        }
    }

    pub fn set_hidden(&mut self, key: ElementKey, hidden: bool) {
        if let Some(node) = self.node_mut(key) {
            node.hidden = hidden;
        }
    }

    pub fn set_disabled(&mut self, key: ElementKey, disabled: bool) {
        if let Some(node) = self.node_mut(key) {
            node.disabled = disabled;
        }
    }

    pub fn has_class(&self, key: ElementKey, class: &str) -> bool {
        self.node(key)
            .map(|n| n.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, key: ElementKey, class: &str) {
        if let Some(node) = self.node_mut(key) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, key: ElementKey, class: &str) {
        if let Some(node) = self.node_mut(key) {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn set_text(&mut self, key: ElementKey, text: impl Into<String>) {
        if let Some(node) = self.node_mut(key) {
            node.text = text.into();
        }
    }

    /// Own text followed by the text of every descendant, space separated.
    pub fn text_content(&self, key: ElementKey) -> String {
        let mut parts = Vec::new();
        self.collect_text(key, &mut parts);
        parts.join(" ")
    }

    fn collect_text(&self, key: ElementKey, parts: &mut Vec<String>) {
        let Some(node) = self.node(key) else {
            return;
        };
        let own = node.text.trim();
        if !own.is_empty() {
            parts.push(own.to_string());
        }
        for child in &node.children {
            self.collect_text(*child, parts);
        }
    }

    pub fn value(&self, key: ElementKey) -> &str {
        self.node(key).map(|n| n.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, key: ElementKey, value: impl Into<String>) {
        if let Some(node) = self.node_mut(key) {
            node.value = value.into();
        }
    }

    /// Make the next `direct` native clicks and `forced` script clicks on
    /// `key` fail before anything is dispatched.
    pub fn fail_invokes(&mut self, key: ElementKey, direct: u32, forced: u32) {
        if let Some(node) = self.node_mut(key) {
            node.failing_direct = direct;
            node.failing_forced = forced;
        }
    }

    pub(crate) fn take_direct_fault(&mut self, key: ElementKey) -> bool {
        take_fault(self.node_mut(key).map(|n| &mut n.failing_direct))
    }

    pub(crate) fn take_forced_fault(&mut self, key: ElementKey) -> bool {
        take_fault(self.node_mut(key).map(|n| &mut n.failing_forced))
    }

    /// Detach every child of `key`.
    pub fn clear_children(&mut self, key: ElementKey) {
        let children = self.children(key);
        for child in children {
            self.detach_subtree(child);
        }
        if let Some(node) = self.node_mut(key) {
            node.children.clear();
        }
    }

    /// Detach `key` and its subtree from the document.
    pub fn remove(&mut self, key: ElementKey) {
        if key == self.root() {
            return;
        }
        if let Some(parent) = self.parent(key) {
            if let Some(node) = self.node_mut(parent) {
                node.children.retain(|child| *child != key);
            }
        }
        self.detach_subtree(key);
    }

    fn detach_subtree(&mut self, key: ElementKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node_mut(current) {
                node.detached = true;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Rendered when the element and all of its ancestors are shown.
    pub fn is_visible(&self, key: ElementKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            match self.node(k) {
                Some(node) if !node.hidden && !node.detached => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn is_actionable(&self, key: ElementKey) -> bool {
        self.is_visible(key) && self.node(key).map(|n| !n.disabled).unwrap_or(false)
    }

    /// Attached descendants of `scope` in document order, `scope` excluded.
    pub fn descendants(&self, scope: ElementKey) -> Vec<ElementKey> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementKey> = self.children(scope).into_iter().rev().collect();
        while let Some(key) = stack.pop() {
            let Some(node) = self.node(key) else {
                continue;
            };
            if node.detached {
                continue;
            }
            out.push(key);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Descendants of `scope` matching `selector`, in document order.
    pub fn select_within(
        &self,
        scope: ElementKey,
        selector: &str,
    ) -> Result<Vec<ElementKey>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|key| selector.matches(self, *key))
            .collect())
    }

    /// Elements of the whole document matching `selector`.
    pub fn select(&self, selector: &str) -> Result<Vec<ElementKey>, SelectorError> {
        self.select_within(self.root(), selector)
    }
}

fn take_fault(counter: Option<&mut u32>) -> bool {
    match counter {
        Some(n) if *n > 0 => {
            *n -= 1;
            true
        }
        _ => false,
    }
}
