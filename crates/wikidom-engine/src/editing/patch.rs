/// What a committed or rolled-back transaction touched.
///
/// Hosts use the changed ranges to re-render only the affected spans and the
/// version number to detect missed updates. Ranges are in post-change
/// offsets and may overlap; an empty `changed` means a no-op transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Patch {
    pub changed: Vec<std::ops::Range<usize>>,
    pub version: u64,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}
