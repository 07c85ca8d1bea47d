use regex::Regex;
use serde_json::{Map, Value};

/// A piece of character-level formatting, e.g. `textStyle/bold` or
/// `link/internal` with a target in its data.
///
/// Annotations are compared by a content hash derived canonically from kind +
/// data, so two independently constructed annotations with equal semantic
/// content are equal. The hash is computed once at construction;
/// `serde_json`'s BTreeMap-backed maps guarantee deterministic key order.
#[derive(Debug, Clone)]
pub struct Annotation {
    kind: String,
    data: Map<String, Value>,
    hash: String,
}

impl Annotation {
    pub fn new(kind: impl Into<String>) -> Self {
        Self::with_data(kind, Map::new())
    }

    pub fn with_data(kind: impl Into<String>, data: Map<String, Value>) -> Self {
        let kind = kind.into();
        let hash = compute_hash(&kind, &data);
        Self { kind, data, hash }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Structural equality on kind + data, bypassing the hash. Used when
    /// expanding the linear array back to plain-object form; everywhere else
    /// the hash is authoritative.
    pub fn same_content(&self, other: &Annotation) -> bool {
        self.kind == other.kind && self.data == other.data
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Annotation {}

impl PartialOrd for Annotation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Annotation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl std::hash::Hash for Annotation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

/// Canonical hash string: the JSON serialization of `{kind, data}` with
/// sorted keys, data omitted when empty so that "no data" and "empty data"
/// collapse to the same identity.
fn compute_hash(kind: &str, data: &Map<String, Value>) -> String {
    let mut object = Map::new();
    object.insert("type".to_string(), Value::String(kind.to_string()));
    if !data.is_empty() {
        object.insert("data".to_string(), Value::Object(data.clone()));
    }
    // Serializing a Map cannot fail
    serde_json::to_string(&Value::Object(object)).unwrap_or_default()
}

/// Selects annotations for clearing or querying: by exact identity, by kind,
/// or by a regex over the kind string (e.g. `^textStyle/` to strip every text
/// style at once). Setting an annotation always requires `Exact`.
#[derive(Debug, Clone)]
pub enum AnnotationMatcher {
    Exact(Annotation),
    Kind(String),
    Pattern(Regex),
}

impl AnnotationMatcher {
    pub fn matches(&self, annotation: &Annotation) -> bool {
        match self {
            AnnotationMatcher::Exact(target) => target == annotation,
            AnnotationMatcher::Kind(kind) => annotation.kind() == kind,
            AnnotationMatcher::Pattern(pattern) => pattern.is_match(annotation.kind()),
        }
    }

    /// The concrete annotation, when this matcher carries one.
    pub fn annotation(&self) -> Option<&Annotation> {
        match self {
            AnnotationMatcher::Exact(annotation) => Some(annotation),
            _ => None,
        }
    }
}

impl PartialEq for AnnotationMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AnnotationMatcher::Exact(a), AnnotationMatcher::Exact(b)) => a == b,
            (AnnotationMatcher::Kind(a), AnnotationMatcher::Kind(b)) => a == b,
            (AnnotationMatcher::Pattern(a), AnnotationMatcher::Pattern(b)) => {
                a.as_str() == b.as_str()
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for AnnotationMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationMatcher::Exact(annotation) => write!(f, "{}", annotation.hash()),
            AnnotationMatcher::Kind(kind) => write!(f, "kind:{kind}"),
            AnnotationMatcher::Pattern(pattern) => write!(f, "pattern:{}", pattern.as_str()),
        }
    }
}
