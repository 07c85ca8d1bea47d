use serde_json::{Map, Value};

use crate::editing::annotation::{Annotation, AnnotationMatcher};
use crate::editing::data::{balance, contains_elements, is_structural_offset, DataItem, Element};
use crate::editing::error::ModelError;
use crate::editing::node::{NodeArena, NodeId, NodeKind};
use crate::editing::object::{self, DocumentObject};
use crate::editing::patch::Patch;
use crate::editing::processor::TransactionProcessor;
use crate::editing::range::Range;
use crate::editing::transaction::{AnnotationMethod, AttributeMethod, Transaction};

/// One node touched by a range query.
///
/// A fully covered node carries no local `range`; a partially covered node
/// carries the covered sub-range in its own content coordinates plus the
/// global equivalent.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedNode {
    pub id: NodeId,
    pub range: Option<Range>,
    pub global_range: Range,
}

/// Annotation coverage over a range: `full` covers every character, `partial`
/// covers some but not all, `all` is the union in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSummary {
    pub full: Vec<Annotation>,
    pub partial: Vec<Annotation>,
    pub all: Vec<Annotation>,
}

/// Parses a run of linear data into fresh arena nodes, validating nesting
/// against `parent_kind` for top-level elements and each enclosing element
/// for nested ones. Content slots are absorbed into the enclosing node's
/// span. Returns the top-level node ids in document order.
pub(crate) fn parse_forest(
    arena: &mut NodeArena,
    parent_kind: NodeKind,
    data: &[DataItem],
) -> Result<Vec<NodeId>, ModelError> {
    struct Frame {
        id: NodeId,
        kind: NodeKind,
        open_index: usize,
    }

    let mut roots = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    for (i, item) in data.iter().enumerate() {
        match item {
            DataItem::Open(element) => {
                let container = stack.last().map(|f| f.kind).unwrap_or(parent_kind);
                if !container.can_contain(element.kind) {
                    return Err(ModelError::UnsupportedElement(format!(
                        "{container} cannot contain {}",
                        element.kind
                    )));
                }
                let id = arena.alloc(element.kind);
                stack.push(Frame {
                    id,
                    kind: element.kind,
                    open_index: i,
                });
            }
            DataItem::Close(kind) => {
                let frame = stack.pop().ok_or_else(|| {
                    ModelError::UnbalancedData(format!("closing {kind} with no open element"))
                })?;
                if frame.kind != *kind {
                    return Err(ModelError::UnbalancedData(format!(
                        "closing {kind} inside open {}",
                        frame.kind
                    )));
                }
                arena.set_content_length_raw(frame.id, i - frame.open_index - 1);
                match stack.last() {
                    Some(parent) => arena.append_child_raw(parent.id, frame.id),
                    None => roots.push(frame.id),
                }
            }
            DataItem::Char { .. } => {
                let container = stack.last().map(|f| f.kind).unwrap_or(parent_kind);
                if container.is_branch() {
                    return Err(ModelError::UnbalancedData(format!(
                        "character content directly inside {container} branch"
                    )));
                }
            }
        }
    }
    if let Some(frame) = stack.last() {
        return Err(ModelError::UnbalancedData(format!("unclosed {}", frame.kind)));
    }
    Ok(roots)
}

/// The document: a linear data array plus a node tree kept in exact
/// correspondence with it.
///
/// The array is the ground truth; the tree is built once at construction and
/// incrementally patched by the transaction processor, never rebuilt
/// wholesale. All offsets are slot indices into the array.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    pub(crate) data: Vec<DataItem>,
    pub(crate) arena: NodeArena,
    pub(crate) root: NodeId,
    pub(crate) version: u64,
}

impl DocumentModel {
    /// Builds the model and its tree from a linear data array.
    pub fn from_data(data: Vec<DataItem>) -> Result<Self, ModelError> {
        let mut arena = NodeArena::new();
        let root = arena.alloc(NodeKind::Document);
        let children = parse_forest(&mut arena, NodeKind::Document, &data)?;
        for child in children {
            arena.append_child_raw(root, child);
        }
        arena.set_content_length_raw(root, data.len());
        Ok(Self {
            data,
            arena,
            root,
            version: 0,
        })
    }

    /// Builds the model from the plain nested-object representation.
    pub fn from_object(object: &DocumentObject) -> Result<Self, ModelError> {
        Self::from_data(object::flatten_document(object)?)
    }

    /// Produces the plain nested-object representation of the whole document.
    pub fn to_object(&self) -> Result<DocumentObject, ModelError> {
        object::node_to_object(self, self.root)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_kind(&self, id: NodeId) -> NodeKind {
        self.arena.kind(id)
    }

    pub fn node_parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.parent(id)
    }

    pub fn node_children(&self, id: NodeId) -> &[NodeId] {
        self.arena.children(id)
    }

    pub fn content_length(&self, id: NodeId) -> usize {
        self.arena.content_length(id)
    }

    pub fn element_length(&self, id: NodeId) -> usize {
        self.arena.element_length(id)
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Monotonic change counter, bumped by every commit and rollback.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    // ---- data access -------------------------------------------------------

    /// A copy of the linear data, optionally restricted to a range.
    pub fn get_data(&self, range: Option<Range>) -> Result<Vec<DataItem>, ModelError> {
        match range {
            None => Ok(self.data.clone()),
            Some(range) => {
                let range = range.normalized();
                self.check_range(range)?;
                Ok(self.data[range.start()..range.end()].to_vec())
            }
        }
    }

    /// A node's content slots, optionally restricted to a range local to its
    /// content.
    pub fn get_content_data(
        &self,
        id: NodeId,
        range: Option<Range>,
    ) -> Result<Vec<DataItem>, ModelError> {
        let inner = self.inner_start(id)?;
        let length = self.arena.content_length(id);
        let (from, to) = match range {
            None => (0, length),
            Some(range) => {
                let range = range.normalized();
                if range.end() > length {
                    return Err(ModelError::OutOfBounds {
                        offset: range.end(),
                        length,
                    });
                }
                (range.start(), range.end())
            }
        };
        Ok(self.data[inner + from..inner + to].to_vec())
    }

    /// A node's full outer span, markers included (the whole array for the
    /// markerless root).
    pub fn get_element_data_from_node(&self, id: NodeId) -> Result<Vec<DataItem>, ModelError> {
        let range = self.range_from_node(id)?;
        Ok(self.data[range.start()..range.end()].to_vec())
    }

    /// The characters of a range with markers skipped.
    pub fn get_plain_text(&self, range: Range) -> Result<String, ModelError> {
        let range = range.normalized();
        self.check_range(range)?;
        Ok(self.data[range.start()..range.end()]
            .iter()
            .filter_map(DataItem::char_value)
            .collect())
    }

    fn check_range(&self, range: Range) -> Result<(), ModelError> {
        if range.end() > self.len() {
            return Err(ModelError::OutOfBounds {
                offset: range.end(),
                length: self.len(),
            });
        }
        Ok(())
    }

    // ---- offset <-> node translation ---------------------------------------

    /// The deepest node containing `offset`: a leaf when the offset falls
    /// inside leaf content, otherwise the branch whose boundary it sits on.
    pub fn node_from_offset(&self, offset: usize) -> NodeId {
        self.node_at(offset, false)
    }

    /// Like [`node_from_offset`](Self::node_from_offset) but descends at most
    /// one level below the root.
    pub fn node_from_offset_shallow(&self, offset: usize) -> NodeId {
        self.node_at(offset, true)
    }

    pub(crate) fn node_at(&self, offset: usize, shallow: bool) -> NodeId {
        let mut current = self.root;
        let mut inner_start = 0;
        let mut depth = 0;
        loop {
            if self.arena.is_leaf(current) || (shallow && depth > 0) {
                return current;
            }
            let mut child_start = inner_start;
            let mut descended = false;
            for &child in self.arena.children(current) {
                let child_end = child_start + self.arena.element_length(child);
                if offset > child_start && offset < child_end {
                    current = child;
                    inner_start = child_start + 1;
                    depth += 1;
                    descended = true;
                    break;
                }
                child_start = child_end;
            }
            if !descended {
                return current;
            }
        }
    }

    /// Offset of the node's opening marker (0 for the root).
    pub fn offset_from_node(&self, id: NodeId) -> Result<usize, ModelError> {
        if id == self.root {
            return Ok(0);
        }
        let mut offset = 0;
        let mut current = id;
        loop {
            let parent = match self.arena.parent(current) {
                Some(parent) => parent,
                None => {
                    return Err(ModelError::TreeCorruption(
                        "offset query on a detached node".to_string(),
                    ))
                }
            };
            for &sibling in self.arena.children(parent) {
                if sibling == current {
                    break;
                }
                offset += self.arena.element_length(sibling);
            }
            if self.arena.kind(parent) != NodeKind::Document {
                offset += 1;
            }
            if parent == self.root {
                return Ok(offset);
            }
            current = parent;
        }
    }

    /// Offset of the first slot inside the node's content.
    pub(crate) fn inner_start(&self, id: NodeId) -> Result<usize, ModelError> {
        if id == self.root {
            Ok(0)
        } else {
            Ok(self.offset_from_node(id)? + 1)
        }
    }

    /// The node's outer span in global offsets.
    pub fn range_from_node(&self, id: NodeId) -> Result<Range, ModelError> {
        let start = self.offset_from_node(id)?;
        Ok(Range::new(start, start + self.arena.element_length(id)))
    }

    /// Child index at which a structural offset falls inside a branch, usable
    /// directly as an insertion index.
    pub fn index_from_offset(&self, parent: NodeId, offset: usize) -> Result<usize, ModelError> {
        let mut child_start = self.inner_start(parent)?;
        for (index, &child) in self.arena.children(parent).iter().enumerate() {
            if offset <= child_start {
                return Ok(index);
            }
            child_start += self.arena.element_length(child);
        }
        Ok(self.arena.children(parent).len())
    }

    /// Every node touched by `range`, in document order. See [`SelectedNode`].
    ///
    /// An empty range yields a single zero-length entry on the node at that
    /// offset rather than descending further.
    pub fn select_nodes(&self, range: Range, shallow: bool) -> Result<Vec<SelectedNode>, ModelError> {
        let range = range.normalized();
        self.check_range(range)?;
        if range.is_empty() {
            let id = self.node_at(range.start(), shallow);
            let inner = self.inner_start(id)?;
            let local = range.start().saturating_sub(inner);
            return Ok(vec![SelectedNode {
                id,
                range: Some(Range::new(local, local)),
                global_range: range,
            }]);
        }
        let mut out = Vec::new();
        self.collect_selected(self.root, 0, range, shallow, &mut out);
        Ok(out)
    }

    fn collect_selected(
        &self,
        branch: NodeId,
        inner_start: usize,
        range: Range,
        shallow: bool,
        out: &mut Vec<SelectedNode>,
    ) {
        let mut child_start = inner_start;
        for &child in self.arena.children(branch) {
            let child_end = child_start + self.arena.element_length(child);
            if child_end <= range.start() || child_start >= range.end() {
                child_start = child_end;
                continue;
            }
            if range.start() <= child_start && range.end() >= child_end {
                out.push(SelectedNode {
                    id: child,
                    range: None,
                    global_range: Range::new(child_start, child_end),
                });
            } else if self.arena.is_branch(child) && !shallow {
                self.collect_selected(child, child_start + 1, range, shallow, out);
            } else {
                let inner_s = child_start + 1;
                let inner_e = child_end - 1;
                let global_start = range.start().max(inner_s);
                let global_end = range.end().min(inner_e);
                out.push(SelectedNode {
                    id: child,
                    range: Some(Range::new(global_start - inner_s, global_end - inner_s)),
                    global_range: Range::new(global_start, global_end),
                });
            }
            child_start = child_end;
        }
    }

    /// Whether removing everything between two nodes would produce a valid
    /// merge: equal depth and matching kinds at every level up to a common
    /// ancestor.
    pub fn can_merge(&self, a: NodeId, b: NodeId) -> bool {
        let mut x = a;
        let mut y = b;
        loop {
            if x == y {
                return true;
            }
            if self.arena.kind(x) != self.arena.kind(y) {
                return false;
            }
            match (self.arena.parent(x), self.arena.parent(y)) {
                (Some(px), Some(py)) => {
                    x = px;
                    y = py;
                }
                _ => return false,
            }
        }
    }

    // ---- annotation & word queries -----------------------------------------

    /// Coverage summary for the characters of a range; marker slots are
    /// excluded from the denominator.
    pub fn annotations_from_range(&self, range: Range) -> Result<AnnotationSummary, ModelError> {
        let range = range.normalized();
        self.check_range(range)?;
        let mut counts: Vec<(Annotation, usize)> = Vec::new();
        let mut char_count = 0usize;
        for item in &self.data[range.start()..range.end()] {
            if let DataItem::Char { annotations, .. } = item {
                char_count += 1;
                for annotation in annotations {
                    match counts.iter_mut().find(|(seen, _)| seen == annotation) {
                        Some((_, count)) => *count += 1,
                        None => counts.push((annotation.clone(), 1)),
                    }
                }
            }
        }
        let mut summary = AnnotationSummary::default();
        for (annotation, count) in counts {
            if char_count > 0 && count == char_count {
                summary.full.push(annotation.clone());
            } else {
                summary.partial.push(annotation.clone());
            }
            summary.all.push(annotation);
        }
        Ok(summary)
    }

    /// The maximal run of slots around `offset` covered by `annotation`
    /// (matched by hash, or by kind alone when `kind_only`), or `None` when
    /// the slot at `offset` is not covered.
    pub fn annotation_boundaries(
        &self,
        offset: usize,
        annotation: &Annotation,
        kind_only: bool,
    ) -> Option<Range> {
        let covered = |slot: usize| -> bool {
            match self.data.get(slot) {
                Some(DataItem::Char { annotations, .. }) => annotations.iter().any(|a| {
                    if kind_only {
                        a.kind() == annotation.kind()
                    } else {
                        a == annotation
                    }
                }),
                _ => false,
            }
        };
        if !covered(offset) {
            return None;
        }
        let mut start = offset;
        while start > 0 && covered(start - 1) {
            start -= 1;
        }
        let mut end = offset + 1;
        while covered(end) {
            end += 1;
        }
        Some(Range::new(start, end))
    }

    /// The word (or non-word run) around a content slot, or `None` at
    /// structural and marker offsets.
    pub fn word_boundaries(&self, offset: usize) -> Option<Range> {
        if is_structural_offset(&self.data, offset) {
            return None;
        }
        let ch = self.data.get(offset)?.char_value()?;
        let class = is_word_char(ch);
        let in_class = |slot: usize| -> bool {
            self.data
                .get(slot)
                .and_then(DataItem::char_value)
                .is_some_and(|c| is_word_char(c) == class)
        };
        let mut start = offset;
        while start > 0 && in_class(start - 1) {
            start -= 1;
        }
        let mut end = offset + 1;
        while in_class(end) {
            end += 1;
        }
        Some(Range::new(start, end))
    }

    /// Steps `|distance|` content-bearing offsets from `offset` in the sign
    /// of `distance`, never landing on a structural offset; stops early at
    /// the array bounds.
    pub fn relative_content_offset(&self, offset: usize, distance: isize) -> usize {
        if distance == 0 {
            return offset;
        }
        let step: isize = if distance > 0 { 1 } else { -1 };
        let mut remaining = distance.unsigned_abs();
        let mut current = offset as isize;
        let mut last_valid = offset;
        loop {
            let next = current + step;
            if next < 0 || next > self.len() as isize {
                return last_valid;
            }
            current = next;
            let candidate = current as usize;
            if !is_structural_offset(&self.data, candidate)
                && self.arena.is_leaf(self.node_at(candidate, false))
            {
                last_valid = candidate;
                remaining -= 1;
                if remaining == 0 {
                    return last_valid;
                }
            }
        }
    }

    // ---- transaction builders ----------------------------------------------

    /// Builds the transaction inserting `data` at `offset`.
    ///
    /// Element data must begin with an opening marker; it is balanced, and at
    /// a content offset wrapped in a close+reopen of the enclosing leaf so
    /// the insertion splits that leaf instead of corrupting it. Pure content
    /// at a structural offset is wrapped in a paragraph. An offset inside a
    /// leaf counts as a content offset even when the leaf is empty and both
    /// neighbours are markers.
    pub fn prepare_insertion(
        &self,
        offset: usize,
        data: Vec<DataItem>,
    ) -> Result<Transaction, ModelError> {
        if offset > self.len() {
            return Err(ModelError::OutOfBounds {
                offset,
                length: self.len(),
            });
        }
        let structural = is_structural_offset(&self.data, offset)
            && self.arena.is_branch(self.node_at(offset, false));
        let insert = if contains_elements(&data) {
            if !data.first().is_some_and(DataItem::is_open) {
                return Err(ModelError::MalformedTransaction(
                    "element insertion must begin with an opening marker".to_string(),
                ));
            }
            let balanced = balance(&data);
            if structural {
                balanced
            } else {
                let leaf = self.node_at(offset, false);
                let open_offset = self.offset_from_node(leaf)?;
                let element = self.data[open_offset].open_element().cloned().ok_or_else(|| {
                    ModelError::TreeCorruption(format!(
                        "no opening marker at node offset {open_offset}"
                    ))
                })?;
                let mut wrapped = Vec::with_capacity(balanced.len() + 2);
                wrapped.push(DataItem::Close(element.kind));
                wrapped.extend(balanced);
                wrapped.push(DataItem::Open(element));
                wrapped
            }
        } else if structural {
            let mut wrapped = Vec::with_capacity(data.len() + 2);
            wrapped.push(DataItem::open(NodeKind::Paragraph));
            wrapped.extend(data);
            wrapped.push(DataItem::close(NodeKind::Paragraph));
            wrapped
        } else {
            data
        };
        let mut tx = Transaction::new();
        tx.push_retain(offset);
        tx.push_insert(insert);
        tx.push_retain(self.len() - offset);
        Ok(tx)
    }

    /// Builds the transaction removing `range`.
    ///
    /// An empty range produces a retain-to-end no-op. When the first and last
    /// touched nodes are mergeable the removal is a single flat span;
    /// otherwise each touched node's covered span is removed separately,
    /// leaving the markers of partially covered elements in place.
    pub fn prepare_removal(&self, range: Range) -> Result<Transaction, ModelError> {
        let range = range.normalized();
        self.check_range(range)?;
        let mut tx = Transaction::new();
        if range.is_empty() {
            tx.push_retain(self.len());
            return Ok(tx);
        }
        let selected = self.select_nodes(range, false)?;
        let first = selected.first().map(|s| s.id);
        let last = selected.last().map(|s| s.id);
        let flat = match (first, last) {
            (Some(first), Some(last)) => first == last || self.can_merge(first, last),
            _ => true,
        };
        if flat {
            tx.push_retain(range.start());
            tx.push_remove(self.data[range.start()..range.end()].to_vec());
            tx.push_retain(self.len() - range.end());
            return Ok(tx);
        }
        let mut cursor = 0;
        for entry in &selected {
            let span = entry.global_range;
            if span.is_empty() {
                continue;
            }
            tx.push_retain(span.start() - cursor);
            tx.push_remove(self.data[span.start()..span.end()].to_vec());
            cursor = span.end();
        }
        tx.push_retain(self.len() - cursor);
        Ok(tx)
    }

    /// Builds the transaction setting or clearing an annotation over the
    /// characters of `range`. Marker slots force span boundaries and are
    /// never annotated. Setting requires an exact annotation; clearing also
    /// accepts kind and pattern matchers.
    pub fn prepare_content_annotation(
        &self,
        range: Range,
        method: AnnotationMethod,
        matcher: AnnotationMatcher,
    ) -> Result<Transaction, ModelError> {
        let range = range.normalized();
        self.check_range(range)?;
        if method == AnnotationMethod::Set && matcher.annotation().is_none() {
            return Err(ModelError::MalformedTransaction(
                "annotation set requires an exact annotation, not a matcher".to_string(),
            ));
        }
        let mut tx = Transaction::new();
        tx.push_retain(range.start());
        let mut active = false;
        let mut span = 0usize;
        for item in &self.data[range.start()..range.end()] {
            let wanted = match item {
                DataItem::Char { annotations, .. } => {
                    let covered = annotations.iter().any(|a| matcher.matches(a));
                    match method {
                        AnnotationMethod::Set => !covered,
                        AnnotationMethod::Clear => covered,
                    }
                }
                _ => false,
            };
            if wanted != active {
                tx.push_retain(span);
                span = 0;
                if wanted {
                    tx.push_start_annotating(method, matcher.clone());
                } else {
                    tx.push_stop_annotating(method, matcher.clone());
                }
                active = wanted;
            }
            span += 1;
        }
        tx.push_retain(span);
        if active {
            tx.push_stop_annotating(method, matcher.clone());
        }
        tx.push_retain(self.len() - range.end());
        Ok(tx)
    }

    /// Builds the transaction setting or clearing one attribute on the
    /// element opening at `offset`.
    pub fn prepare_element_attribute_change(
        &self,
        offset: usize,
        method: AttributeMethod,
        key: &str,
        value: Value,
    ) -> Result<Transaction, ModelError> {
        if !self.data.get(offset).is_some_and(DataItem::is_open) {
            return Err(ModelError::InvalidElementOffset(offset));
        }
        let mut tx = Transaction::new();
        tx.push_retain(offset);
        tx.push_attribute(method, key.to_string(), value);
        tx.push_retain(self.len() - offset);
        Ok(tx)
    }

    /// Builds remove+reinsert transaction pairs retyping every leaf touched
    /// by `range` into `kind` with the given attributes. Each pair is net
    /// length preserving, so later pairs stay valid as the sequence is
    /// committed in order.
    pub fn prepare_leaf_conversion(
        &self,
        range: Range,
        kind: NodeKind,
        attributes: Option<Map<String, Value>>,
    ) -> Result<Vec<Transaction>, ModelError> {
        if !kind.is_leaf() {
            return Err(ModelError::MalformedTransaction(format!(
                "cannot convert leaves to branch kind {kind}"
            )));
        }
        let selected = self.select_nodes(range.normalized(), false)?;
        let length = self.len();
        let mut transactions = Vec::new();
        for entry in &selected {
            if !self.arena.is_leaf(entry.id) {
                continue;
            }
            let span = self.range_from_node(entry.id)?;
            let old = self.data[span.start()..span.end()].to_vec();

            let mut removal = Transaction::new();
            removal.push_retain(span.start());
            removal.push_remove(old.clone());
            removal.push_retain(length - span.end());
            transactions.push(removal);

            let mut replacement = Vec::with_capacity(old.len());
            replacement.push(DataItem::Open(Element::with_attributes(
                kind,
                attributes.clone().unwrap_or_default(),
            )));
            replacement.extend(old[1..old.len() - 1].iter().cloned());
            replacement.push(DataItem::Close(kind));

            let mut insertion = Transaction::new();
            insertion.push_retain(span.start());
            insertion.push_insert(replacement);
            insertion.push_retain(length - span.end());
            transactions.push(insertion);
        }
        Ok(transactions)
    }

    // ---- transaction application -------------------------------------------

    /// Applies a transaction in the forward direction.
    pub fn commit(&mut self, tx: &Transaction) -> Result<Patch, ModelError> {
        TransactionProcessor::new(self, false).process(tx)
    }

    /// Applies a transaction in the inverse direction, undoing a prior
    /// commit of the same transaction.
    pub fn rollback(&mut self, tx: &Transaction) -> Result<Patch, ModelError> {
        TransactionProcessor::new(self, true).process(tx)
    }

    // ---- consistency audit -------------------------------------------------

    /// Recomputes every node span from the data array and checks marker
    /// placement, stored lengths and parent-link symmetry. Used by tests and
    /// the inspector; any mismatch is [`ModelError::TreeCorruption`].
    pub fn verify_tree(&self) -> Result<(), ModelError> {
        if self.arena.content_length(self.root) != self.data.len() {
            return Err(ModelError::TreeCorruption(format!(
                "root length {} != data length {}",
                self.arena.content_length(self.root),
                self.data.len()
            )));
        }
        self.verify_branch(self.root, 0, self.data.len())
    }

    fn verify_branch(&self, id: NodeId, start: usize, end: usize) -> Result<(), ModelError> {
        let mut cursor = start;
        for &child in self.arena.children(id) {
            if self.arena.parent(child) != Some(id) {
                return Err(ModelError::TreeCorruption(
                    "child parent link does not point back".to_string(),
                ));
            }
            let kind = self.arena.kind(child);
            let span = self.arena.element_length(child);
            if cursor + span > end {
                return Err(ModelError::TreeCorruption(format!(
                    "{kind} node overruns its parent span"
                )));
            }
            let opens = self.data[cursor]
                .open_element()
                .is_some_and(|element| element.kind == kind);
            let closes = self.data[cursor + span - 1] == DataItem::Close(kind);
            if !opens || !closes {
                return Err(ModelError::TreeCorruption(format!(
                    "markers at {cursor} do not bracket a {kind} node"
                )));
            }
            if self.arena.is_branch(child) {
                self.verify_branch(child, cursor + 1, cursor + span - 1)?;
            } else if self.data[cursor + 1..cursor + span - 1]
                .iter()
                .any(DataItem::is_element)
            {
                return Err(ModelError::TreeCorruption(format!(
                    "{kind} leaf contains element markers"
                )));
            }
            cursor += span;
        }
        if cursor != end {
            return Err(ModelError::TreeCorruption(format!(
                "{} node spans {} slots but its children cover {}",
                self.arena.kind(id),
                end - start,
                cursor - start
            )));
        }
        Ok(())
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::data::chars;
    use pretty_assertions::assert_eq;

    // [<p>, a, b, c, </p>]
    fn paragraph_abc() -> DocumentModel {
        let mut data = vec![DataItem::open(NodeKind::Paragraph)];
        data.extend(chars("abc"));
        data.push(DataItem::close(NodeKind::Paragraph));
        DocumentModel::from_data(data).unwrap()
    }

    // [<h>, a, </h>, <p>, d, </p>]
    fn heading_and_paragraph() -> DocumentModel {
        let mut data = vec![DataItem::open(NodeKind::Heading)];
        data.extend(chars("a"));
        data.push(DataItem::close(NodeKind::Heading));
        data.push(DataItem::open(NodeKind::Paragraph));
        data.extend(chars("d"));
        data.push(DataItem::close(NodeKind::Paragraph));
        DocumentModel::from_data(data).unwrap()
    }

    // ============ Construction ============

    #[test]
    fn test_construction_builds_tree() {
        let doc = paragraph_abc();
        let root = doc.root();
        assert_eq!(doc.node_kind(root), NodeKind::Document);
        assert_eq!(doc.node_children(root).len(), 1);
        let paragraph = doc.node_children(root)[0];
        assert_eq!(doc.node_kind(paragraph), NodeKind::Paragraph);
        assert_eq!(doc.content_length(paragraph), 3);
        assert_eq!(doc.element_length(paragraph), 5);
        assert_eq!(doc.content_length(root), 5);
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_construction_rejects_violated_nesting() {
        let data = vec![
            DataItem::open(NodeKind::List),
            DataItem::open(NodeKind::Paragraph),
            DataItem::close(NodeKind::Paragraph),
            DataItem::close(NodeKind::List),
        ];
        let err = DocumentModel::from_data(data).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedElement(_)));
    }

    #[test]
    fn test_construction_rejects_unbalanced_data() {
        let data = vec![DataItem::open(NodeKind::Paragraph)];
        let err = DocumentModel::from_data(data).unwrap_err();
        assert!(matches!(err, ModelError::UnbalancedData(_)));

        let data = vec![
            DataItem::open(NodeKind::Paragraph),
            DataItem::close(NodeKind::Heading),
        ];
        let err = DocumentModel::from_data(data).unwrap_err();
        assert!(matches!(err, ModelError::UnbalancedData(_)));
    }

    #[test]
    fn test_construction_rejects_top_level_characters() {
        let err = DocumentModel::from_data(chars("ab")).unwrap_err();
        assert!(matches!(err, ModelError::UnbalancedData(_)));
    }

    #[test]
    fn test_nested_list_construction() {
        // [<list>, <li>, <p>, x, </p>, </li>, </list>]
        let data = vec![
            DataItem::open(NodeKind::List),
            DataItem::open(NodeKind::ListItem),
            DataItem::open(NodeKind::Paragraph),
            DataItem::from_char('x'),
            DataItem::close(NodeKind::Paragraph),
            DataItem::close(NodeKind::ListItem),
            DataItem::close(NodeKind::List),
        ];
        let doc = DocumentModel::from_data(data).unwrap();
        let list = doc.node_children(doc.root())[0];
        let item = doc.node_children(list)[0];
        let paragraph = doc.node_children(item)[0];
        assert_eq!(doc.content_length(list), 5);
        assert_eq!(doc.content_length(item), 3);
        assert_eq!(doc.content_length(paragraph), 1);
        doc.verify_tree().unwrap();
    }

    // ============ Offset translation ============

    #[test]
    fn test_node_from_offset() {
        let doc = heading_and_paragraph();
        let heading = doc.node_children(doc.root())[0];
        let paragraph = doc.node_children(doc.root())[1];
        assert_eq!(doc.node_from_offset(0), doc.root());
        assert_eq!(doc.node_from_offset(1), heading);
        assert_eq!(doc.node_from_offset(2), heading);
        assert_eq!(doc.node_from_offset(3), doc.root());
        assert_eq!(doc.node_from_offset(4), paragraph);
        assert_eq!(doc.node_from_offset(6), doc.root());
    }

    #[test]
    fn test_offset_from_node_roundtrip() {
        let doc = heading_and_paragraph();
        let heading = doc.node_children(doc.root())[0];
        let paragraph = doc.node_children(doc.root())[1];
        assert_eq!(doc.offset_from_node(heading).unwrap(), 0);
        assert_eq!(doc.offset_from_node(paragraph).unwrap(), 3);
        assert_eq!(doc.range_from_node(paragraph).unwrap(), Range::new(3, 6));
        // non-structural position inside each node maps back to it
        for node in [heading, paragraph] {
            let offset = doc.offset_from_node(node).unwrap();
            assert_eq!(doc.node_from_offset(offset + 1), node);
        }
    }

    #[test]
    fn test_index_from_offset() {
        let doc = heading_and_paragraph();
        assert_eq!(doc.index_from_offset(doc.root(), 0).unwrap(), 0);
        assert_eq!(doc.index_from_offset(doc.root(), 3).unwrap(), 1);
        assert_eq!(doc.index_from_offset(doc.root(), 6).unwrap(), 2);
    }

    // ============ select_nodes ============

    #[test]
    fn test_select_nodes_partial_leaf() {
        let doc = paragraph_abc();
        let paragraph = doc.node_children(doc.root())[0];
        let selected = doc.select_nodes(Range::new(1, 4), false).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, paragraph);
        assert_eq!(selected[0].range, Some(Range::new(0, 3)));
        assert_eq!(selected[0].global_range, Range::new(1, 4));
    }

    #[test]
    fn test_select_nodes_full_cover_omits_local_range() {
        let doc = heading_and_paragraph();
        let heading = doc.node_children(doc.root())[0];
        let selected = doc.select_nodes(Range::new(0, 3), false).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, heading);
        assert_eq!(selected[0].range, None);
        assert_eq!(selected[0].global_range, Range::new(0, 3));
    }

    #[test]
    fn test_select_nodes_spanning_two_leaves() {
        let doc = heading_and_paragraph();
        let heading = doc.node_children(doc.root())[0];
        let paragraph = doc.node_children(doc.root())[1];
        let selected = doc.select_nodes(Range::new(1, 5), false).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].id, heading);
        assert_eq!(selected[0].global_range, Range::new(1, 2));
        assert_eq!(selected[1].id, paragraph);
        assert_eq!(selected[1].global_range, Range::new(4, 5));
    }

    #[test]
    fn test_select_nodes_empty_range_at_boundary() {
        let doc = heading_and_paragraph();
        let selected = doc.select_nodes(Range::new(3, 3), false).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, doc.root());
        assert_eq!(selected[0].global_range, Range::new(3, 3));
    }

    #[test]
    fn test_select_nodes_out_of_bounds() {
        let doc = paragraph_abc();
        let err = doc.select_nodes(Range::new(0, 6), false).unwrap_err();
        assert!(matches!(err, ModelError::OutOfBounds { .. }));
    }

    // ============ Annotation & word queries ============

    fn bold() -> Annotation {
        Annotation::new("textStyle/bold")
    }

    fn paragraph_with_bold_b() -> DocumentModel {
        let mut doc = paragraph_abc();
        let tx = doc
            .prepare_content_annotation(
                Range::new(2, 3),
                AnnotationMethod::Set,
                AnnotationMatcher::Exact(bold()),
            )
            .unwrap();
        doc.commit(&tx).unwrap();
        doc
    }

    #[test]
    fn test_annotations_from_range_partial() {
        let doc = paragraph_with_bold_b();
        let summary = doc.annotations_from_range(Range::new(1, 4)).unwrap();
        assert_eq!(summary.full, vec![]);
        assert_eq!(summary.partial, vec![bold()]);
        assert_eq!(summary.all, vec![bold()]);
    }

    #[test]
    fn test_annotations_from_range_full() {
        let doc = paragraph_with_bold_b();
        let summary = doc.annotations_from_range(Range::new(2, 3)).unwrap();
        assert_eq!(summary.full, vec![bold()]);
        assert_eq!(summary.partial, vec![]);
    }

    #[test]
    fn test_annotation_boundaries() {
        let doc = paragraph_with_bold_b();
        assert_eq!(
            doc.annotation_boundaries(2, &bold(), false),
            Some(Range::new(2, 3))
        );
        assert_eq!(doc.annotation_boundaries(1, &bold(), false), None);
        assert_eq!(doc.annotation_boundaries(0, &bold(), false), None);
    }

    #[test]
    fn test_word_boundaries() {
        // [<p>, h, i, ' ', y, o, </p>]
        let mut data = vec![DataItem::open(NodeKind::Paragraph)];
        data.extend(chars("hi yo"));
        data.push(DataItem::close(NodeKind::Paragraph));
        let doc = DocumentModel::from_data(data).unwrap();
        assert_eq!(doc.word_boundaries(1), Some(Range::new(1, 3)));
        assert_eq!(doc.word_boundaries(2), Some(Range::new(1, 3)));
        assert_eq!(doc.word_boundaries(3), Some(Range::new(3, 4)));
        assert_eq!(doc.word_boundaries(4), Some(Range::new(4, 6)));
        assert_eq!(doc.word_boundaries(0), None);
        assert_eq!(doc.word_boundaries(7), None);
    }

    #[test]
    fn test_relative_content_offset() {
        let doc = heading_and_paragraph();
        // content offsets are 1, 2 (heading) and 4, 5 (paragraph)
        assert_eq!(doc.relative_content_offset(1, 1), 2);
        assert_eq!(doc.relative_content_offset(2, 1), 4);
        assert_eq!(doc.relative_content_offset(4, -1), 2);
        assert_eq!(doc.relative_content_offset(5, 3), 5);
        assert_eq!(doc.relative_content_offset(1, -4), 1);
    }

    // ============ get_* helpers ============

    #[test]
    fn test_get_plain_text() {
        let doc = heading_and_paragraph();
        assert_eq!(doc.get_plain_text(Range::new(0, 6)).unwrap(), "ad");
        assert_eq!(doc.get_plain_text(Range::new(4, 5)).unwrap(), "d");
    }

    #[test]
    fn test_get_content_and_element_data() {
        let doc = heading_and_paragraph();
        let paragraph = doc.node_children(doc.root())[1];
        assert_eq!(doc.get_content_data(paragraph, None).unwrap(), chars("d"));
        let element = doc.get_element_data_from_node(paragraph).unwrap();
        assert_eq!(element.len(), 3);
        assert!(element[0].is_open());
        assert!(element[2].is_close());
    }

    // ============ prepare_insertion ============

    #[test]
    fn test_insert_content_into_leaf() {
        let mut doc = paragraph_abc();
        let tx = doc.prepare_insertion(2, chars("X")).unwrap();
        doc.commit(&tx).unwrap();
        let mut expected = vec![DataItem::open(NodeKind::Paragraph)];
        expected.extend(chars("aXbc"));
        expected.push(DataItem::close(NodeKind::Paragraph));
        assert_eq!(doc.get_data(None).unwrap(), expected);
        let paragraph = doc.node_children(doc.root())[0];
        assert_eq!(doc.content_length(paragraph), 4);
        assert_eq!(doc.content_length(doc.root()), 6);
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_insert_content_at_structural_offset_wraps_in_paragraph() {
        let mut doc = paragraph_abc();
        let tx = doc.prepare_insertion(5, chars("d")).unwrap();
        doc.commit(&tx).unwrap();
        assert_eq!(doc.len(), 8);
        assert_eq!(doc.node_children(doc.root()).len(), 2);
        let second = doc.node_children(doc.root())[1];
        assert_eq!(doc.node_kind(second), NodeKind::Paragraph);
        assert_eq!(doc.content_length(second), 1);
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_insert_element_at_content_offset_splits_leaf() {
        let mut doc = paragraph_abc();
        let insert = vec![
            DataItem::open(NodeKind::Heading),
            DataItem::from_char('x'),
            DataItem::close(NodeKind::Heading),
        ];
        let tx = doc.prepare_insertion(2, insert).unwrap();
        doc.commit(&tx).unwrap();
        let kinds: Vec<NodeKind> = doc
            .node_children(doc.root())
            .iter()
            .map(|&id| doc.node_kind(id))
            .collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Paragraph, NodeKind::Heading, NodeKind::Paragraph]
        );
        assert_eq!(doc.get_plain_text(Range::new(0, doc.len())).unwrap(), "axbc");
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_insert_element_at_structural_offset() {
        let mut doc = paragraph_abc();
        let insert = vec![
            DataItem::open(NodeKind::Heading),
            DataItem::from_char('t'),
            DataItem::close(NodeKind::Heading),
        ];
        let tx = doc.prepare_insertion(5, insert).unwrap();
        doc.commit(&tx).unwrap();
        assert_eq!(doc.node_children(doc.root()).len(), 2);
        assert_eq!(
            doc.node_kind(doc.node_children(doc.root())[1]),
            NodeKind::Heading
        );
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_insert_balances_unclosed_elements() {
        let mut doc = paragraph_abc();
        // unclosed heading gets auto-closed by balancing
        let insert = vec![DataItem::open(NodeKind::Heading), DataItem::from_char('t')];
        let tx = doc.prepare_insertion(0, insert).unwrap();
        doc.commit(&tx).unwrap();
        assert_eq!(
            doc.node_kind(doc.node_children(doc.root())[0]),
            NodeKind::Heading
        );
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_insert_element_not_starting_with_open_is_malformed() {
        let doc = paragraph_abc();
        let insert = vec![DataItem::from_char('x'), DataItem::close(NodeKind::Paragraph)];
        let err = doc.prepare_insertion(0, insert).unwrap_err();
        assert!(matches!(err, ModelError::MalformedTransaction(_)));
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let doc = paragraph_abc();
        let err = doc.prepare_insertion(6, chars("x")).unwrap_err();
        assert!(matches!(err, ModelError::OutOfBounds { .. }));
    }

    // ============ prepare_removal ============

    #[test]
    fn test_remove_content_then_rollback() {
        let mut doc = paragraph_abc();
        let original = doc.get_data(None).unwrap();
        let tx = doc.prepare_removal(Range::new(1, 4)).unwrap();

        doc.commit(&tx).unwrap();
        assert_eq!(
            doc.get_data(None).unwrap(),
            vec![
                DataItem::open(NodeKind::Paragraph),
                DataItem::close(NodeKind::Paragraph),
            ]
        );
        let paragraph = doc.node_children(doc.root())[0];
        assert_eq!(doc.content_length(paragraph), 0);
        doc.verify_tree().unwrap();

        doc.rollback(&tx).unwrap();
        assert_eq!(doc.get_data(None).unwrap(), original);
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_remove_empty_range_is_retain_to_end() {
        let doc = paragraph_abc();
        let tx = doc.prepare_removal(Range::new(2, 2)).unwrap();
        assert_eq!(tx.length_difference(), 0);
        assert_eq!(tx.operations().len(), 1);
    }

    #[test]
    fn test_remove_merges_adjacent_paragraphs() {
        // [<p>, a, </p>, <p>, d, </p>] remove the middle markers
        let mut data = vec![DataItem::open(NodeKind::Paragraph)];
        data.extend(chars("a"));
        data.push(DataItem::close(NodeKind::Paragraph));
        data.push(DataItem::open(NodeKind::Paragraph));
        data.extend(chars("d"));
        data.push(DataItem::close(NodeKind::Paragraph));
        let mut doc = DocumentModel::from_data(data.clone()).unwrap();
        let first = doc.node_children(doc.root())[0];

        let tx = doc.prepare_removal(Range::new(2, 4)).unwrap();
        doc.commit(&tx).unwrap();
        let mut merged = vec![DataItem::open(NodeKind::Paragraph)];
        merged.extend(chars("ad"));
        merged.push(DataItem::close(NodeKind::Paragraph));
        assert_eq!(doc.get_data(None).unwrap(), merged);
        assert_eq!(doc.node_children(doc.root()).len(), 1);
        // the surviving paragraph keeps the first leaf's identity
        assert_eq!(doc.node_children(doc.root())[0], first);
        doc.verify_tree().unwrap();

        doc.rollback(&tx).unwrap();
        assert_eq!(doc.get_data(None).unwrap(), data);
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_remove_across_unmergeable_nodes_keeps_markers() {
        let mut doc = heading_and_paragraph();
        let tx = doc.prepare_removal(Range::new(1, 5)).unwrap();
        doc.commit(&tx).unwrap();
        assert_eq!(
            doc.get_data(None).unwrap(),
            vec![
                DataItem::open(NodeKind::Heading),
                DataItem::close(NodeKind::Heading),
                DataItem::open(NodeKind::Paragraph),
                DataItem::close(NodeKind::Paragraph),
            ]
        );
        assert_eq!(doc.node_children(doc.root()).len(), 2);
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_remove_whole_element() {
        let mut doc = heading_and_paragraph();
        let tx = doc.prepare_removal(Range::new(0, 3)).unwrap();
        doc.commit(&tx).unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.node_children(doc.root()).len(), 1);
        assert_eq!(
            doc.node_kind(doc.node_children(doc.root())[0]),
            NodeKind::Paragraph
        );
        doc.verify_tree().unwrap();
    }

    // ============ prepare_content_annotation ============

    #[test]
    fn test_annotate_then_clear_roundtrip() {
        let mut doc = paragraph_abc();
        let original = doc.get_data(None).unwrap();
        let set = doc
            .prepare_content_annotation(
                Range::new(1, 4),
                AnnotationMethod::Set,
                AnnotationMatcher::Exact(bold()),
            )
            .unwrap();
        doc.commit(&set).unwrap();
        let summary = doc.annotations_from_range(Range::new(1, 4)).unwrap();
        assert_eq!(summary.full, vec![bold()]);

        let clear = doc
            .prepare_content_annotation(
                Range::new(1, 4),
                AnnotationMethod::Clear,
                AnnotationMatcher::Exact(bold()),
            )
            .unwrap();
        doc.commit(&clear).unwrap();
        assert_eq!(doc.get_data(None).unwrap(), original);
    }

    #[test]
    fn test_annotate_set_skips_already_covered_spans() {
        let doc = paragraph_with_bold_b();
        let tx = doc
            .prepare_content_annotation(
                Range::new(1, 4),
                AnnotationMethod::Set,
                AnnotationMatcher::Exact(bold()),
            )
            .unwrap();
        // 'b' is already bold, so two separate annotate runs bracket it
        let starts = tx
            .operations()
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    crate::editing::transaction::Operation::Annotate {
                        bias: crate::editing::transaction::Bias::Start,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(starts, 2);
    }

    #[test]
    fn test_clear_by_pattern() {
        let mut doc = paragraph_abc();
        let set = doc
            .prepare_content_annotation(
                Range::new(1, 4),
                AnnotationMethod::Set,
                AnnotationMatcher::Exact(bold()),
            )
            .unwrap();
        doc.commit(&set).unwrap();
        let pattern = AnnotationMatcher::Pattern(regex::Regex::new("^textStyle/").unwrap());
        let clear = doc
            .prepare_content_annotation(Range::new(0, 5), AnnotationMethod::Clear, pattern)
            .unwrap();
        doc.commit(&clear).unwrap();
        let summary = doc.annotations_from_range(Range::new(1, 4)).unwrap();
        assert!(summary.all.is_empty());
    }

    #[test]
    fn test_set_by_pattern_is_malformed() {
        let doc = paragraph_abc();
        let pattern = AnnotationMatcher::Pattern(regex::Regex::new("^textStyle/").unwrap());
        let err = doc
            .prepare_content_annotation(Range::new(1, 4), AnnotationMethod::Set, pattern)
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedTransaction(_)));
    }

    // ============ prepare_element_attribute_change ============

    #[test]
    fn test_attribute_change_roundtrip() {
        let mut doc = heading_and_paragraph();
        let tx = doc
            .prepare_element_attribute_change(0, AttributeMethod::Set, "level", serde_json::json!(2))
            .unwrap();
        doc.commit(&tx).unwrap();
        let element = doc.get_data(None).unwrap()[0].open_element().cloned().unwrap();
        assert_eq!(element.attribute("level"), Some(&serde_json::json!(2)));

        doc.rollback(&tx).unwrap();
        let element = doc.get_data(None).unwrap()[0].open_element().cloned().unwrap();
        assert_eq!(element.attribute("level"), None);
    }

    #[test]
    fn test_attribute_change_rejects_non_open_offset() {
        let doc = paragraph_abc();
        let err = doc
            .prepare_element_attribute_change(1, AttributeMethod::Set, "k", serde_json::json!(1))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidElementOffset(1)));
    }

    // ============ prepare_leaf_conversion ============

    #[test]
    fn test_leaf_conversion_paragraph_to_heading() {
        let mut doc = paragraph_abc();
        let mut attributes = Map::new();
        attributes.insert("level".to_string(), serde_json::json!(1));
        let transactions = doc
            .prepare_leaf_conversion(Range::new(1, 4), NodeKind::Heading, Some(attributes))
            .unwrap();
        assert_eq!(transactions.len(), 2);
        for tx in &transactions {
            doc.commit(tx).unwrap();
        }
        let node = doc.node_children(doc.root())[0];
        assert_eq!(doc.node_kind(node), NodeKind::Heading);
        assert_eq!(doc.content_length(node), 3);
        assert_eq!(doc.get_plain_text(Range::new(0, doc.len())).unwrap(), "abc");
        let element = doc.get_data(None).unwrap()[0].open_element().cloned().unwrap();
        assert_eq!(element.attribute("level"), Some(&serde_json::json!(1)));
        doc.verify_tree().unwrap();
    }

    #[test]
    fn test_leaf_conversion_to_branch_is_malformed() {
        let doc = paragraph_abc();
        let err = doc
            .prepare_leaf_conversion(Range::new(1, 4), NodeKind::List, None)
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedTransaction(_)));
    }

    // ============ can_merge ============

    #[test]
    fn test_can_merge() {
        let doc = heading_and_paragraph();
        let heading = doc.node_children(doc.root())[0];
        let paragraph = doc.node_children(doc.root())[1];
        assert!(!doc.can_merge(heading, paragraph));
        assert!(doc.can_merge(heading, heading));
    }

    // ============ version ============

    #[test]
    fn test_version_bumps_on_commit_and_rollback() {
        let mut doc = paragraph_abc();
        assert_eq!(doc.version(), 0);
        let tx = doc.prepare_insertion(2, chars("X")).unwrap();
        let patch = doc.commit(&tx).unwrap();
        assert_eq!(patch.version, 1);
        let patch = doc.rollback(&tx).unwrap();
        assert_eq!(patch.version, 2);
    }
}
