use serde_json::{Map, Value};

use crate::editing::annotation::Annotation;
use crate::editing::node::NodeKind;

/// An element opening: the node kind plus optional attributes.
///
/// Attributes live on the opening marker in the linear data, never on tree
/// nodes; the data array is the ground truth and the tree is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: NodeKind,
    pub attributes: Option<Map<String, Value>>,
}

impl Element {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: None,
        }
    }

    pub fn with_attributes(kind: NodeKind, attributes: Map<String, Value>) -> Self {
        let attributes = if attributes.is_empty() {
            None
        } else {
            Some(attributes)
        };
        Self { kind, attributes }
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.as_ref().and_then(|map| map.get(key))
    }

    pub fn set_attribute(&mut self, key: &str, value: Value) {
        self.attributes
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
    }

    /// Removes an attribute; drops the map entirely when it empties.
    pub fn clear_attribute(&mut self, key: &str) -> Option<Value> {
        let map = self.attributes.as_mut()?;
        let previous = map.remove(key);
        if map.is_empty() {
            self.attributes = None;
        }
        previous
    }
}

/// One slot of the linear document data.
///
/// A document is a flat `Vec<DataItem>`: element openings and closings bracket
/// structure, characters (optionally annotated) form content. Offsets into
/// this array are the universal addressing scheme for the whole engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DataItem {
    Char {
        ch: char,
        annotations: Vec<Annotation>,
    },
    Open(Element),
    Close(NodeKind),
}

impl DataItem {
    pub fn from_char(ch: char) -> Self {
        DataItem::Char {
            ch,
            annotations: Vec::new(),
        }
    }

    pub fn annotated(ch: char, annotations: Vec<Annotation>) -> Self {
        DataItem::Char { ch, annotations }
    }

    pub fn open(kind: NodeKind) -> Self {
        DataItem::Open(Element::new(kind))
    }

    pub fn close(kind: NodeKind) -> Self {
        DataItem::Close(kind)
    }

    pub fn is_element(&self) -> bool {
        matches!(self, DataItem::Open(_) | DataItem::Close(_))
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DataItem::Open(_))
    }

    pub fn is_close(&self) -> bool {
        matches!(self, DataItem::Close(_))
    }

    pub fn char_value(&self) -> Option<char> {
        match self {
            DataItem::Char { ch, .. } => Some(*ch),
            _ => None,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self {
            DataItem::Char { annotations, .. } => annotations,
            _ => &[],
        }
    }

    pub fn open_element(&self) -> Option<&Element> {
        match self {
            DataItem::Open(element) => Some(element),
            _ => None,
        }
    }
}

/// Builds plain (unannotated) character items from a string.
pub fn chars(text: &str) -> Vec<DataItem> {
    text.chars().map(DataItem::from_char).collect()
}

/// Whether any slot in the slice is an element marker.
pub fn contains_elements(data: &[DataItem]) -> bool {
    data.iter().any(DataItem::is_element)
}

/// Whether an offset sits between structure rather than inside leaf content.
///
/// An offset is structural when both of its neighbouring slots (or the
/// document boundary) are element markers. Structural offsets are where whole
/// elements may be inserted without splitting a leaf.
pub fn is_structural_offset(data: &[DataItem], offset: usize) -> bool {
    if offset > data.len() {
        return false;
    }
    let before = offset == 0 || data[offset - 1].is_element();
    let after = offset == data.len() || data[offset].is_element();
    before && after
}

/// Repairs a data fragment so every opening has a matching closing in order.
///
/// Closings with no matching opening are dropped; openings left unclosed at
/// the end get closings appended in reverse order. Content slots pass through
/// untouched. Used when preparing insertions from caller-supplied fragments.
pub fn balance(data: &[DataItem]) -> Vec<DataItem> {
    let mut out = Vec::with_capacity(data.len());
    let mut stack: Vec<NodeKind> = Vec::new();
    for item in data {
        match item {
            DataItem::Open(element) => {
                stack.push(element.kind);
                out.push(item.clone());
            }
            DataItem::Close(kind) => {
                if stack.last() == Some(kind) {
                    stack.pop();
                    out.push(item.clone());
                }
                // orphan closing: dropped
            }
            DataItem::Char { .. } => out.push(item.clone()),
        }
    }
    while let Some(kind) = stack.pop() {
        out.push(DataItem::Close(kind));
    }
    out
}
