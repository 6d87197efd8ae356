/// Which side a position sticks to when content is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// One replaced region: `old_size` positions starting at `start` became
/// `new_size` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

/// How a single step moved positions around.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepMap {
    ranges: Vec<MapRange>,
}

impl StepMap {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Ranges must be sorted by `start` and expressed in the coordinates of
    /// the document before the step.
    pub fn new(ranges: impl IntoIterator<Item = MapRange>) -> Self {
        Self {
            ranges: ranges
                .into_iter()
                .filter(|r| r.old_size != 0 || r.new_size != 0)
                .collect(),
        }
    }

    pub fn single(start: usize, old_size: usize, new_size: usize) -> Self {
        Self::new([MapRange {
            start,
            old_size,
            new_size,
        }])
    }

    pub fn ranges(&self) -> &[MapRange] {
        &self.ranges
    }

    pub fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos == range.start {
                    Assoc::Before
                } else if pos == end {
                    Assoc::After
                } else {
                    assoc
                };
                let base = range.start.saturating_add_signed(diff);
                return match side {
                    Assoc::Before => base,
                    Assoc::After => base + range.new_size,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        pos.saturating_add_signed(diff)
    }
}

/// The maps of every step of a transaction, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    /// Map a position through every step.
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_from(0, pos, assoc)
    }

    /// Map a position through the steps starting at index `from`.
    pub fn map_from(&self, from: usize, pos: usize, assoc: Assoc) -> usize {
        self.maps[from.min(self.maps.len())..]
            .iter()
            .fold(pos, |pos, map| map.map(pos, assoc))
    }
}
