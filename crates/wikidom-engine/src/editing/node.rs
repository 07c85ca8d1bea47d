use crate::editing::error::ModelError;

/// Every element type the engine understands, as a closed set.
///
/// Branch kinds hold child nodes; leaf kinds hold character content directly.
/// The source interchange format spells these in camelCase (`listItem`),
/// mapped by [`NodeKind::as_str`] / [`NodeKind::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    Paragraph,
    Heading,
    Pre,
}

impl NodeKind {
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::List
                | NodeKind::ListItem
                | NodeKind::Table
                | NodeKind::TableRow
                | NodeKind::TableCell
        )
    }

    pub fn is_leaf(self) -> bool {
        !self.is_branch()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::List => "list",
            NodeKind::ListItem => "listItem",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableCell => "tableCell",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Pre => "pre",
        }
    }

    pub fn parse(name: &str) -> Option<NodeKind> {
        Some(match name {
            "document" => NodeKind::Document,
            "list" => NodeKind::List,
            "listItem" => NodeKind::ListItem,
            "table" => NodeKind::Table,
            "tableRow" => NodeKind::TableRow,
            "tableCell" => NodeKind::TableCell,
            "paragraph" => NodeKind::Paragraph,
            "heading" => NodeKind::Heading,
            "pre" => NodeKind::Pre,
            _ => return None,
        })
    }

    /// Parent kinds this kind may appear under; `None` means unconstrained.
    pub fn allowed_parents(self) -> Option<&'static [NodeKind]> {
        match self {
            NodeKind::ListItem => Some(&[NodeKind::List]),
            NodeKind::TableRow => Some(&[NodeKind::Table]),
            NodeKind::TableCell => Some(&[NodeKind::TableRow]),
            _ => None,
        }
    }

    /// Child kinds this kind may contain; `None` means any, `Some(&[])` none.
    pub fn allowed_children(self) -> Option<&'static [NodeKind]> {
        match self {
            NodeKind::List => Some(&[NodeKind::ListItem]),
            NodeKind::Table => Some(&[NodeKind::TableRow]),
            NodeKind::TableRow => Some(&[NodeKind::TableCell]),
            NodeKind::Paragraph | NodeKind::Heading | NodeKind::Pre => Some(&[]),
            _ => None,
        }
    }

    /// Whether `child` may be nested directly under `self`, per both the
    /// parent's child rules and the child's parent rules.
    pub fn can_contain(self, child: NodeKind) -> bool {
        if child == NodeKind::Document {
            return false;
        }
        if let Some(children) = self.allowed_children() {
            if !children.contains(&child) {
                return false;
            }
        }
        if let Some(parents) = child.allowed_parents() {
            if !parents.contains(&self) {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index handle into a [`NodeArena`]. Stable for the lifetime of the node;
/// slots are recycled through a free list after `free_subtree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Number of data slots strictly between this node's markers. For the
    /// markerless document root this is the whole data length.
    content_length: usize,
}

/// Flat-pool node tree mirroring the linear document data.
///
/// Nodes are owned by a `Vec` and addressed by index; parents are back-links.
/// Length bookkeeping is explicit: structural mutation methods either adjust
/// ancestor lengths themselves (`splice_children`, `adjust_content_length`) or
/// are `_raw` and leave lengths to the caller.
#[derive(Debug, Clone)]
pub struct NodeArena {
    nodes: Vec<Node>,
    free: Vec<usize>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
            content_length: 0,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                NodeId(slot)
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn is_branch(&self, id: NodeId) -> bool {
        self.kind(id).is_branch()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.kind(id).is_leaf()
    }

    pub fn content_length(&self, id: NodeId) -> usize {
        self.nodes[id.0].content_length
    }

    /// Outer length in data slots: content plus the two markers, except the
    /// markerless document root, whose element length equals its content.
    pub fn element_length(&self, id: NodeId) -> usize {
        match self.kind(id) {
            NodeKind::Document => self.content_length(id),
            _ => self.content_length(id) + 2,
        }
    }

    /// Sets a node's content length without touching ancestors.
    pub fn set_content_length_raw(&mut self, id: NodeId, length: usize) {
        self.nodes[id.0].content_length = length;
    }

    /// Attaches a child at the end without any length bookkeeping.
    pub fn append_child_raw(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Applies a signed length delta to a node and every ancestor.
    pub fn adjust_content_length(&mut self, id: NodeId, delta: isize) -> Result<(), ModelError> {
        let current = self.nodes[id.0].content_length;
        let updated = current.checked_add_signed(delta).ok_or_else(|| {
            ModelError::TreeCorruption(format!(
                "content length underflow on {} node ({current} {delta:+})",
                self.kind(id)
            ))
        })?;
        self.nodes[id.0].content_length = updated;
        if let Some(parent) = self.nodes[id.0].parent {
            self.adjust_content_length(parent, delta)?;
        }
        Ok(())
    }

    /// Applies a delta to a node's ancestors only, leaving the node itself.
    pub fn adjust_ancestors(&mut self, id: NodeId, delta: isize) -> Result<(), ModelError> {
        if let Some(parent) = self.nodes[id.0].parent {
            self.adjust_content_length(parent, delta)?;
        }
        Ok(())
    }

    /// Replaces `remove_count` children of `parent` starting at `index` with
    /// `new_ids`, detaching/attaching and adjusting ancestor lengths by the
    /// net element-length difference. Returns the detached children.
    pub fn splice_children(
        &mut self,
        parent: NodeId,
        index: usize,
        remove_count: usize,
        new_ids: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, ModelError> {
        let removed: Vec<NodeId> = self.nodes[parent.0]
            .children
            .splice(index..index + remove_count, new_ids.iter().copied())
            .collect();
        for &id in &removed {
            self.nodes[id.0].parent = None;
        }
        let mut delta: isize = 0;
        for &id in &new_ids {
            self.nodes[id.0].parent = Some(parent);
            delta += self.element_length(id) as isize;
        }
        for &id in &removed {
            delta -= self.element_length(id) as isize;
        }
        if delta != 0 {
            self.adjust_content_length(parent, delta)?;
        }
        Ok(removed)
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ModelError> {
        let index = self.nodes[parent.0].children.len();
        self.splice_children(parent, index, 0, vec![child])?;
        Ok(())
    }

    pub fn unshift_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ModelError> {
        self.splice_children(parent, 0, 0, vec![child])?;
        Ok(())
    }

    pub fn pop_child(&mut self, parent: NodeId) -> Result<Option<NodeId>, ModelError> {
        let count = self.nodes[parent.0].children.len();
        if count == 0 {
            return Ok(None);
        }
        let removed = self.splice_children(parent, count - 1, 1, Vec::new())?;
        Ok(removed.into_iter().next())
    }

    pub fn shift_child(&mut self, parent: NodeId) -> Result<Option<NodeId>, ModelError> {
        if self.nodes[parent.0].children.is_empty() {
            return Ok(None);
        }
        let removed = self.splice_children(parent, 0, 1, Vec::new())?;
        Ok(removed.into_iter().next())
    }

    /// Reorders children in place; lengths are unaffected.
    pub fn sort_children_by<F>(&mut self, parent: NodeId, mut cmp: F)
    where
        F: FnMut(&NodeArena, NodeId, NodeId) -> std::cmp::Ordering,
    {
        let mut children = std::mem::take(&mut self.nodes[parent.0].children);
        children.sort_by(|&a, &b| cmp(self, a, b));
        self.nodes[parent.0].children = children;
    }

    pub fn reverse_children(&mut self, parent: NodeId) {
        self.nodes[parent.0].children.reverse();
    }

    /// Drains all children without any length bookkeeping, clearing their
    /// parent links. Used by subtree rebuilds that re-derive lengths.
    pub fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[parent.0].children);
        for &child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    /// Installs a full child list without any length bookkeeping.
    pub fn set_children_raw(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0].children = children;
    }

    /// Zero-based position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id.0].parent?;
        self.nodes[parent.0].children.iter().position(|&c| c == id)
    }

    /// Walks parent links to the tree root.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current
    }

    /// Detaches a node from its parent (if attached) and returns the whole
    /// subtree's slots to the free list.
    pub fn free_subtree(&mut self, id: NodeId) {
        if let Some(index) = self.index_in_parent(id) {
            let parent = self.nodes[id.0].parent.take();
            if let Some(parent) = parent {
                self.nodes[parent.0].children.remove(index);
            }
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            stack.extend(self.nodes[current.0].children.drain(..));
            self.nodes[current.0].parent = None;
            self.free.push(current.0);
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}
