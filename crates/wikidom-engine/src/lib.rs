pub mod editing;
pub mod io;

// Re-export key types for easier usage
pub use editing::{
    Annotation, AnnotationMatcher, AnnotationMethod, AttributeMethod, DataItem, DocumentModel,
    DocumentObject, Element, ModelError, NodeId, NodeKind, Patch, Range, Surface, Transaction,
};
pub use io::*;
