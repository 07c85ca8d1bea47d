/// A span of document offsets that remembers its direction.
///
/// `from` is where a selection was anchored and `to` is where it ends; `to`
/// may be less than `from` for a backwards selection. Algorithms that only
/// care about the covered span use `start()`/`end()` or `normalized()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub from: usize,
    pub to: usize,
}

impl Range {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Lower bound of the covered span.
    pub fn start(&self) -> usize {
        self.from.min(self.to)
    }

    /// Upper bound of the covered span.
    pub fn end(&self) -> usize {
        self.from.max(self.to)
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    pub fn is_backwards(&self) -> bool {
        self.to < self.from
    }

    /// The same span with `from <= to`.
    pub fn normalized(self) -> Self {
        Self {
            from: self.start(),
            to: self.end(),
        }
    }

    /// Whether `offset` falls inside the covered span (end exclusive).
    pub fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.start() && offset < self.end()
    }

    /// The range shifted by a signed distance, clamped at zero.
    pub fn translated(self, distance: isize) -> Self {
        Self {
            from: self.from.saturating_add_signed(distance),
            to: self.to.saturating_add_signed(distance),
        }
    }
}

/// A pixel coordinate produced by an external rendering layer.
///
/// The engine never computes positions itself; this type exists so hosts can
/// hand rendered caret locations around alongside model ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Position {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}
