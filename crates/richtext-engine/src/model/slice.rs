use super::fragment::Fragment;

/// A piece cut out of a document. `open_start` and `open_end` count how
/// many levels of nodes were cut through on each side, so that on
/// insertion the open nodes can be joined with the surrounding content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slice {
    content: Fragment,
    open_start: usize,
    open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    pub fn open_start(&self) -> usize {
        self.open_start
    }

    pub fn open_end(&self) -> usize {
        self.open_end
    }

    /// Number of positions this slice adds when inserted.
    pub fn size(&self) -> usize {
        self.content.size() - self.open_start - self.open_end
    }

    pub fn is_empty(&self) -> bool {
        self.content.size() == 0
    }
}
