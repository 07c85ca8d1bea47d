use crate::editing::annotation::AnnotationMatcher;
use crate::editing::data::DataItem;
use serde_json::Value;

/// Whether an attribute operation sets or removes a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMethod {
    Set,
    Clear,
}

/// Whether an annotate run adds or strips the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationMethod {
    Set,
    Clear,
}

/// Marks the two ends of an annotate run: `Start` arms the pending change,
/// `Stop` disarms it. Retains between the two apply the change as they pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Start,
    Stop,
}

/// A single step of a transaction. Operations are positional: each consumes
/// or produces data at the processor's cursor, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Advance over `length` untouched slots (annotation changes pending from
    /// an armed annotate run are applied while passing).
    Retain { length: usize },
    /// Insert the given items at the cursor.
    Insert { data: Vec<DataItem> },
    /// Remove exactly these items from the cursor. Carrying the removed data
    /// (not just a count) is what makes the transaction invertible.
    Remove { data: Vec<DataItem> },
    /// Change one attribute on the element opening at the cursor.
    Attribute {
        method: AttributeMethod,
        key: String,
        value: Value,
    },
    /// Arm or disarm an annotation change over subsequent retains.
    Annotate {
        method: AnnotationMethod,
        bias: Bias,
        annotation: AnnotationMatcher,
    },
}

/// An ordered list of operations describing one atomic document change.
///
/// Built through the `push_*` methods, which coalesce adjacent operations of
/// the same type; `length_difference` tracks the net change in document
/// length so that applying the transaction needs no second pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transaction {
    operations: Vec<Operation>,
    length_difference: isize,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn length_difference(&self) -> isize {
        self.length_difference
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Appends a retain, merging into a trailing retain. Zero-length retains
    /// are dropped.
    pub fn push_retain(&mut self, length: usize) {
        if length == 0 {
            return;
        }
        if let Some(Operation::Retain { length: previous }) = self.operations.last_mut() {
            *previous += length;
        } else {
            self.operations.push(Operation::Retain { length });
        }
    }

    pub fn push_insert(&mut self, data: Vec<DataItem>) {
        if data.is_empty() {
            return;
        }
        self.length_difference += data.len() as isize;
        if let Some(Operation::Insert { data: previous }) = self.operations.last_mut() {
            previous.extend(data);
        } else {
            self.operations.push(Operation::Insert { data });
        }
    }

    pub fn push_remove(&mut self, data: Vec<DataItem>) {
        if data.is_empty() {
            return;
        }
        self.length_difference -= data.len() as isize;
        if let Some(Operation::Remove { data: previous }) = self.operations.last_mut() {
            previous.extend(data);
        } else {
            self.operations.push(Operation::Remove { data });
        }
    }

    pub fn push_attribute(&mut self, method: AttributeMethod, key: String, value: Value) {
        self.operations
            .push(Operation::Attribute { method, key, value });
    }

    pub fn push_start_annotating(&mut self, method: AnnotationMethod, annotation: AnnotationMatcher) {
        self.operations.push(Operation::Annotate {
            method,
            bias: Bias::Start,
            annotation,
        });
    }

    pub fn push_stop_annotating(&mut self, method: AnnotationMethod, annotation: AnnotationMatcher) {
        self.operations.push(Operation::Annotate {
            method,
            bias: Bias::Stop,
            annotation,
        });
    }
}
