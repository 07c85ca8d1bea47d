/*!
 * # Editing Core Module
 *
 * The WikiDom document model and transaction engine.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: the Linear Data Array
 * - The entire document is a flat `Vec<DataItem>` mixing element markers and
 *   (possibly annotated) characters
 * - Every offset in the engine is a slot index into this array
 * - The node tree is derived from it and kept in exact correspondence,
 *   patched incrementally rather than rebuilt on every edit
 *
 * ### 2. Transaction-Based Editing
 * - All edits are `Transaction`s: ordered lists of retain/insert/remove/
 *   attribute/annotate operations built by the `prepare_*` methods on
 *   `DocumentModel`
 * - Transactions carry the removed data, so every commit is exactly
 *   invertible by `rollback`
 *
 * ### 3. Minimal Subtree Rebuilds
 * - Content-only edits fast-path to an array splice plus a length adjustment
 * - Edits crossing element markers re-parse only the smallest enclosing
 *   branch's interior, preserving the first leaf's identity where possible
 *
 * ### 4. Two-Tier Undo History
 * - `Surface` batches transactions between host-driven breakpoints; each
 *   breakpoint undoes and redoes as one atomic unit, restoring the selection
 *   saved alongside it
 */

pub mod annotation;
pub mod data;
pub mod document;
pub mod error;
pub mod node;
pub mod object;
pub mod patch;
pub(crate) mod processor;
pub mod range;
pub mod surface;
pub mod transaction;

pub use annotation::{Annotation, AnnotationMatcher};
pub use data::{DataItem, Element};
pub use document::{AnnotationSummary, DocumentModel, SelectedNode};
pub use error::ModelError;
pub use node::{NodeArena, NodeId, NodeKind};
pub use object::{AnnotationObject, AnnotationRange, ContentObject, DocumentObject};
pub use patch::Patch;
pub use range::{Position, Range};
pub use surface::Surface;
pub use transaction::{AnnotationMethod, AttributeMethod, Bias, Operation, Transaction};
