/// Errors raised by the document model, transaction processor and surface.
///
/// All of these are immediate hard failures. Nothing in the engine catches or
/// retries them; they propagate to the caller, which is expected to validate
/// preconditions before building transactions. There is no automatic
/// rollback-on-failure: operations already applied before a mid-transaction
/// error remain applied.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Element type unknown to the node registry, or an element placed where
    /// its nesting rules forbid it.
    #[error("unsupported element: {0}")]
    UnsupportedElement(String),

    /// A linear data array with mismatched or unclosed element markers.
    #[error("unbalanced document data: {0}")]
    UnbalancedData(String),

    /// A removal or rebuild tried to merge nodes that have no common ancestor,
    /// unequal depth, or mismatched types along the ancestor path.
    #[error("invalid merge: {0}")]
    InvalidMerge(String),

    /// Offset or range outside `[0, length]`.
    #[error("offset {offset} out of bounds for document of length {length}")]
    OutOfBounds { offset: usize, length: usize },

    /// An attribute change or element split targeted a slot that is not an
    /// element opening.
    #[error("offset {0} is not an element opening")]
    InvalidElementOffset(usize),

    /// A stop-bias annotate operation had no matching active start.
    #[error("annotation stop without matching start: {0}")]
    AnnotationStackUnderflow(String),

    /// An internal consistency check failed; indicates a prior invariant
    /// violation and is always fatal.
    #[error("document tree corrupted: {0}")]
    TreeCorruption(String),

    /// A structurally invalid operation or operation sequence.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),
}
