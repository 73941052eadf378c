//! Owned document tree.
//!
//! A deliberately small model of an HTML document: elements with ordered
//! attributes, escaped text, and raw HTML passthrough. Nodes are addressed
//! by an index path from the root (`[2, 0, 1]` is the second child of the
//! first child of the third top-level node), which lets the batch driver
//! collect matches in a read-only pass and replace them afterwards.
//!
//! Rendering goes through [`maud::Render`], so text and attribute values are
//! escaped by maud and a rendered tree can be spliced into a maud template.

use maud::Render;

/// Elements rendered without a closing tag.
const VOID_ELEMENTS: &[&str] = &["img", "source", "br", "hr", "input"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Plain text, escaped on render.
    Text(String),
    /// Verbatim HTML, emitted as-is.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Element(el) => Some(&el.children),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(el) => Some(&mut el.children),
            _ => None,
        }
    }
}

/// Top of a document tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Root {
    pub children: Vec<Node>,
}

impl Root {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Node at `path`, or `None` if any index is out of range or descends
    /// into a non-element.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for &index in rest {
            node = node.children()?.get(index)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for &index in rest {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Swap the node at `path` for `replacement`, returning the old node.
    pub fn replace(&mut self, path: &[usize], replacement: Node) -> Option<Node> {
        let slot = self.node_at_mut(path)?;
        Some(std::mem::replace(slot, replacement))
    }

    pub fn to_html(&self) -> String {
        self.render().into_string()
    }
}

impl Render for Element {
    fn render_to(&self, buffer: &mut String) {
        buffer.push('<');
        buffer.push_str(&self.tag);
        for (name, value) in &self.attributes {
            buffer.push(' ');
            buffer.push_str(name);
            buffer.push_str("=\"");
            value.as_str().render_to(buffer);
            buffer.push('"');
        }
        buffer.push('>');
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.render_to(buffer);
        }
        buffer.push_str("</");
        buffer.push_str(&self.tag);
        buffer.push('>');
    }
}

impl Render for Node {
    fn render_to(&self, buffer: &mut String) {
        match self {
            Node::Element(el) => el.render_to(buffer),
            Node::Text(text) => text.as_str().render_to(buffer),
            Node::Raw(html) => buffer.push_str(html),
        }
    }
}

impl Render for Root {
    fn render_to(&self, buffer: &mut String) {
        for child in &self.children {
            child.render_to(buffer);
        }
    }
}
