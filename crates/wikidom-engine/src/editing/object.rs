use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::editing::annotation::Annotation;
use crate::editing::data::{DataItem, Element};
use crate::editing::document::DocumentModel;
use crate::editing::error::ModelError;
use crate::editing::node::{NodeId, NodeKind};

/// The plain nested-object document representation: the interchange form
/// serializers and renderers consume. A node carries either `content` (leaf)
/// or `children` (branch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentObject {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DocumentObject>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationObject>,
}

/// An annotation over a half-open character range of a content node's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationObject {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    pub range: AnnotationRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRange {
    pub start: usize,
    pub end: usize,
}

/// Flattens a whole document object into a linear data array. The root must
/// be a `document` node; it contributes no markers of its own.
pub fn flatten_document(object: &DocumentObject) -> Result<Vec<DataItem>, ModelError> {
    if object.kind != "document" {
        return Err(ModelError::UnsupportedElement(format!(
            "document root has type {}",
            object.kind
        )));
    }
    let mut out = Vec::new();
    if let Some(children) = &object.children {
        for child in children {
            flatten_node(child, &mut out)?;
        }
    }
    Ok(out)
}

fn flatten_node(object: &DocumentObject, out: &mut Vec<DataItem>) -> Result<(), ModelError> {
    let kind = NodeKind::parse(&object.kind)
        .ok_or_else(|| ModelError::UnsupportedElement(object.kind.clone()))?;
    out.push(DataItem::Open(Element::with_attributes(
        kind,
        object.attributes.clone().unwrap_or_default(),
    )));
    if let Some(content) = &object.content {
        flatten_content(content, out)?;
    }
    if let Some(children) = &object.children {
        for child in children {
            flatten_node(child, out)?;
        }
    }
    out.push(DataItem::Close(kind));
    Ok(())
}

/// One slot per character, each annotation attached to the slots its range
/// covers. Ranges are character indices into `text`.
fn flatten_content(content: &ContentObject, out: &mut Vec<DataItem>) -> Result<(), ModelError> {
    let characters: Vec<char> = content.text.chars().collect();
    let mut slots: Vec<Vec<Annotation>> = vec![Vec::new(); characters.len()];
    for annotation in &content.annotations {
        let AnnotationRange { start, end } = annotation.range;
        if start > end || end > characters.len() {
            return Err(ModelError::OutOfBounds {
                offset: end,
                length: characters.len(),
            });
        }
        let value = Annotation::with_data(
            annotation.kind.clone(),
            annotation.data.clone().unwrap_or_default(),
        );
        for slot in &mut slots[start..end] {
            slot.push(value.clone());
        }
    }
    for (ch, annotations) in characters.into_iter().zip(slots) {
        out.push(DataItem::Char { ch, annotations });
    }
    Ok(())
}

/// Rebuilds the nested-object form of a subtree, re-deriving annotation
/// ranges by scanning for contiguous runs.
///
/// Runs are merged by kind + data structural equality rather than by hash,
/// so independently constructed annotations with equal content collapse into
/// one range.
pub(crate) fn node_to_object(
    model: &DocumentModel,
    id: NodeId,
) -> Result<DocumentObject, ModelError> {
    let kind = model.node_kind(id);
    let attributes = if id == model.root() {
        None
    } else {
        let offset = model.offset_from_node(id)?;
        model
            .data
            .get(offset)
            .and_then(DataItem::open_element)
            .and_then(|element| element.attributes.clone())
    };

    if kind.is_leaf() {
        let slots = model.get_content_data(id, None)?;
        Ok(DocumentObject {
            kind: kind.as_str().to_string(),
            attributes,
            content: Some(content_from_slots(&slots)),
            children: None,
        })
    } else {
        let mut children = Vec::new();
        for &child in model.node_children(id) {
            children.push(node_to_object(model, child)?);
        }
        Ok(DocumentObject {
            kind: kind.as_str().to_string(),
            attributes,
            content: None,
            children: Some(children),
        })
    }
}

fn content_from_slots(slots: &[DataItem]) -> ContentObject {
    let mut text = String::new();
    let mut open: Vec<(Annotation, usize)> = Vec::new();
    let mut finished: Vec<AnnotationObject> = Vec::new();
    for (i, item) in slots.iter().enumerate() {
        if let Some(ch) = item.char_value() {
            text.push(ch);
        }
        let current = item.annotations();
        let mut still_open = Vec::new();
        for (annotation, start) in open.drain(..) {
            if current.iter().any(|a| a.same_content(&annotation)) {
                still_open.push((annotation, start));
            } else {
                finished.push(annotation_object(annotation, start, i));
            }
        }
        open = still_open;
        for annotation in current {
            if !open.iter().any(|(a, _)| a.same_content(annotation)) {
                open.push((annotation.clone(), i));
            }
        }
    }
    let end = slots.len();
    for (annotation, start) in open {
        finished.push(annotation_object(annotation, start, end));
    }
    finished.sort_by_key(|a| (a.range.start, a.range.end));
    ContentObject {
        text,
        annotations: finished,
    }
}

fn annotation_object(annotation: Annotation, start: usize, end: usize) -> AnnotationObject {
    let data = if annotation.data().is_empty() {
        None
    } else {
        Some(annotation.data().clone())
    };
    AnnotationObject {
        kind: annotation.kind().to_string(),
        data,
        range: AnnotationRange { start, end },
    }
}
