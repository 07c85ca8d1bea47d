use serde_json::Value;

use crate::editing::annotation::{Annotation, AnnotationMatcher};
use crate::editing::data::{contains_elements, is_structural_offset, DataItem};
use crate::editing::document::{parse_forest, DocumentModel};
use crate::editing::error::ModelError;
use crate::editing::node::NodeId;
use crate::editing::patch::Patch;
use crate::editing::transaction::{
    AnnotationMethod, AttributeMethod, Bias, Operation, Transaction,
};

/// Applies one transaction against a document, forward or reversed.
///
/// The processor walks the operation list once, keeping a cursor into the
/// linear array. Reversed application maps each operation to its dual
/// (insert<->remove, attribute set<->clear, annotate set<->clear), which is
/// exactly the inverse of a prior forward application of the same
/// transaction. Failures are immediate and leave the document partially
/// modified; callers validate preconditions when building transactions.
pub(crate) struct TransactionProcessor<'a> {
    model: &'a mut DocumentModel,
    reversed: bool,
    cursor: usize,
    to_set: Vec<AnnotationMatcher>,
    to_clear: Vec<AnnotationMatcher>,
    changed: Vec<std::ops::Range<usize>>,
}

impl<'a> TransactionProcessor<'a> {
    pub(crate) fn new(model: &'a mut DocumentModel, reversed: bool) -> Self {
        Self {
            model,
            reversed,
            cursor: 0,
            to_set: Vec::new(),
            to_clear: Vec::new(),
            changed: Vec::new(),
        }
    }

    pub(crate) fn process(mut self, tx: &Transaction) -> Result<Patch, ModelError> {
        for op in tx.operations() {
            match op {
                Operation::Retain { length } => self.retain(*length)?,
                Operation::Insert { data } => {
                    if self.reversed {
                        self.remove(data)?;
                    } else {
                        self.insert(data)?;
                    }
                }
                Operation::Remove { data } => {
                    if self.reversed {
                        self.insert(data)?;
                    } else {
                        self.remove(data)?;
                    }
                }
                Operation::Attribute { method, key, value } => {
                    self.attribute(*method, key, value)?;
                }
                Operation::Annotate {
                    method,
                    bias,
                    annotation,
                } => self.annotate(*method, *bias, annotation)?,
            }
        }
        if !self.to_set.is_empty() || !self.to_clear.is_empty() {
            return Err(ModelError::MalformedTransaction(
                "annotate run left open at end of transaction".to_string(),
            ));
        }
        self.model.bump_version();
        Ok(Patch {
            changed: self.changed,
            version: self.model.version(),
        })
    }

    /// Advances over untouched slots, applying any armed annotation changes
    /// to the characters passed over.
    fn retain(&mut self, length: usize) -> Result<(), ModelError> {
        let end = self.cursor + length;
        if end > self.model.len() {
            return Err(ModelError::OutOfBounds {
                offset: end,
                length: self.model.len(),
            });
        }
        if !self.to_set.is_empty() || !self.to_clear.is_empty() {
            let mut adds: Vec<Annotation> = Vec::new();
            for matcher in &self.to_set {
                match matcher.annotation() {
                    Some(annotation) => {
                        if !adds.contains(annotation) {
                            adds.push(annotation.clone());
                        }
                    }
                    None => {
                        return Err(ModelError::MalformedTransaction(
                            "annotation set requires an exact annotation".to_string(),
                        ))
                    }
                }
            }
            let clears = &self.to_clear;
            for item in &mut self.model.data[self.cursor..end] {
                if let DataItem::Char { annotations, .. } = item {
                    annotations.retain(|a| !clears.iter().any(|m| m.matches(a)));
                    for add in &adds {
                        if !annotations.contains(add) {
                            annotations.push(add.clone());
                        }
                    }
                }
            }
            self.changed.push(self.cursor..end);
        }
        self.cursor = end;
        Ok(())
    }

    fn insert(&mut self, data: &[DataItem]) -> Result<(), ModelError> {
        let at = self.cursor;
        let n = data.len();
        if at > self.model.len() {
            return Err(ModelError::OutOfBounds {
                offset: at,
                length: self.model.len(),
            });
        }
        if !contains_elements(data) {
            // content fast path: no structure changes, just a longer leaf
            let leaf = self.model.node_at(at, false);
            self.model.data.splice(at..at, data.iter().cloned());
            self.model.arena.adjust_content_length(leaf, n as isize)?;
        } else if is_structural_offset(&self.model.data, at)
            && self.model.arena.is_branch(self.model.node_at(at, false))
        {
            let parent = self.model.node_at(at, false);
            let index = self.model.index_from_offset(parent, at)?;
            let parent_kind = self.model.arena.kind(parent);
            // parse_forest rejects stray top-level content under a branch
            // parent, so the new nodes always cover the spliced span exactly
            let new_ids = parse_forest(&mut self.model.arena, parent_kind, data)?;
            self.model.data.splice(at..at, data.iter().cloned());
            self.model.arena.splice_children(parent, index, 0, new_ids)?;
        } else {
            // element data at a content offset splits the enclosing leaf;
            // rebuild from the ancestor level the data's closings reach up to
            let levels = scope_levels(data);
            let mut scope = self.model.node_at(at, false);
            for _ in 0..levels {
                match self.model.arena.parent(scope) {
                    Some(parent) => scope = parent,
                    None => break,
                }
            }
            self.model.data.splice(at..at, data.iter().cloned());
            self.rebuild_scope(scope, n as isize)?;
        }
        self.changed.push(at..at + n);
        self.cursor += n;
        Ok(())
    }

    fn remove(&mut self, data: &[DataItem]) -> Result<(), ModelError> {
        let at = self.cursor;
        let n = data.len();
        if at + n > self.model.len() {
            return Err(ModelError::OutOfBounds {
                offset: at + n,
                length: self.model.len(),
            });
        }
        if !contains_elements(&self.model.data[at..at + n]) {
            let leaf = self.model.node_at(at, false);
            self.model.data.splice(at..at + n, std::iter::empty());
            self.model.arena.adjust_content_length(leaf, -(n as isize))?;
        } else {
            let scope = self.scope_for_range(at, at + n);
            self.model.data.splice(at..at + n, std::iter::empty());
            self.rebuild_scope(scope, -(n as isize))?;
        }
        self.changed.push(at..at);
        Ok(())
    }

    fn attribute(
        &mut self,
        method: AttributeMethod,
        key: &str,
        value: &Value,
    ) -> Result<(), ModelError> {
        let set = (method == AttributeMethod::Set) != self.reversed;
        match self.model.data.get_mut(self.cursor) {
            Some(DataItem::Open(element)) => {
                if set {
                    element.set_attribute(key, value.clone());
                } else {
                    element.clear_attribute(key);
                }
            }
            _ => return Err(ModelError::InvalidElementOffset(self.cursor)),
        }
        self.changed.push(self.cursor..self.cursor + 1);
        Ok(())
    }

    fn annotate(
        &mut self,
        method: AnnotationMethod,
        bias: Bias,
        matcher: &AnnotationMatcher,
    ) -> Result<(), ModelError> {
        let set = (method == AnnotationMethod::Set) != self.reversed;
        if set && matcher.annotation().is_none() {
            return Err(ModelError::MalformedTransaction(
                "annotation set requires an exact annotation".to_string(),
            ));
        }
        let list = if set { &mut self.to_set } else { &mut self.to_clear };
        match bias {
            Bias::Start => list.push(matcher.clone()),
            Bias::Stop => {
                let position = list
                    .iter()
                    .position(|m| m == matcher)
                    .ok_or_else(|| ModelError::AnnotationStackUnderflow(matcher.to_string()))?;
                list.remove(position);
            }
        }
        Ok(())
    }

    /// The deepest branch whose interior fully contains `[start, end)`;
    /// its children are what a marker-crossing removal rebuilds.
    fn scope_for_range(&self, start: usize, end: usize) -> NodeId {
        let mut current = self.model.root;
        let mut inner_start = 0;
        loop {
            let mut child_start = inner_start;
            let mut descended = false;
            for &child in self.model.arena.children(current) {
                let child_end = child_start + self.model.arena.element_length(child);
                if self.model.arena.is_branch(child)
                    && start >= child_start + 1
                    && end <= child_end - 1
                {
                    current = child;
                    inner_start = child_start + 1;
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

    /// Re-parses a branch's interior from the (already spliced) data array
    /// and replaces its children, keeping the first old child's identity when
    /// it is a leaf of the same kind as the first new one.
    fn rebuild_scope(&mut self, scope: NodeId, delta: isize) -> Result<(), ModelError> {
        let model = &mut *self.model;
        let inner = model.inner_start(scope)?;
        let old_length = model.arena.content_length(scope);
        let new_length = old_length.checked_add_signed(delta).ok_or_else(|| {
            ModelError::TreeCorruption(format!(
                "rebuild length underflow ({old_length} {delta:+})"
            ))
        })?;
        let slice = model.data[inner..inner + new_length].to_vec();
        let kind = model.arena.kind(scope);
        let mut new_ids = parse_forest(&mut model.arena, kind, &slice).map_err(|e| match e {
            ModelError::UnbalancedData(message) => ModelError::InvalidMerge(message),
            other => other,
        })?;

        let old_children = model.arena.take_children(scope);
        let mut reused = None;
        if let (Some(&old_first), Some(&new_first)) = (old_children.first(), new_ids.first()) {
            if model.arena.is_leaf(old_first)
                && model.arena.is_leaf(new_first)
                && model.arena.kind(old_first) == model.arena.kind(new_first)
            {
                let length = model.arena.content_length(new_first);
                model.arena.set_content_length_raw(old_first, length);
                model.arena.free_subtree(new_first);
                new_ids[0] = old_first;
                reused = Some(old_first);
            }
        }
        for old in old_children {
            if reused != Some(old) {
                model.arena.free_subtree(old);
            }
        }
        model.arena.set_children_raw(scope, new_ids);
        model.arena.set_content_length_raw(scope, new_length);
        model.arena.adjust_ancestors(scope, delta)?;
        Ok(())
    }
}

/// How many ancestor levels an insertion's data reaches above the enclosing
/// leaf: one per unmatched closing at its running-depth minimum, at least one.
fn scope_levels(data: &[DataItem]) -> usize {
    let mut depth: isize = 0;
    let mut min_depth: isize = 0;
    for item in data {
        match item {
            DataItem::Open(_) => depth += 1,
            DataItem::Close(_) => {
                depth -= 1;
                min_depth = min_depth.min(depth);
            }
            DataItem::Char { .. } => {}
        }
    }
    (-min_depth).max(1) as usize
}
