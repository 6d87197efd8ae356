use serde::{Deserialize, Serialize};

use crate::model::Node;
use crate::schema::Schema;
use crate::transform::{Assoc, Mapping};

/// A range of the document between `anchor` (the side that stays put when
/// the selection is extended) and `head` (the side that moves).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A collapsed selection.
    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// The whole document.
    pub fn all(doc: &Node) -> Self {
        Self::new(0, doc.content_size())
    }

    /// A cursor at the text position closest to `pos`, preferring the
    /// following one on ties. Falls back to `pos` clamped into the document
    /// when there is no textblock at all.
    pub fn near(doc: &Node, schema: &Schema, pos: usize) -> Self {
        let pos = pos.min(doc.content_size());
        let nearest = textblock_ranges(doc, schema)
            .into_iter()
            .map(|(start, end)| {
                let target = pos.clamp(start, end);
                (target.abs_diff(pos), target < pos, target)
            })
            .min();
        Self::cursor(nearest.map_or(pos, |(_, _, target)| target))
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Both ends limited to `0..=size`.
    pub fn clamp(&self, size: usize) -> Self {
        Self::new(self.anchor.min(size), self.head.min(size))
    }

    pub fn map(&self, mapping: &Mapping) -> Self {
        Self::new(
            mapping.map(self.anchor, Assoc::After),
            mapping.map(self.head, Assoc::After),
        )
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.from() <= pos && pos <= self.to()
    }

    /// Express both ends as (textblock index, offset) pairs, which survive
    /// edits that only restructure the blocks around the text.
    pub fn text_coords(&self, doc: &Node, schema: &Schema) -> Option<TextCoords> {
        let ranges = textblock_ranges(doc, schema);
        let locate = |pos: usize| {
            ranges
                .iter()
                .position(|&(start, end)| start <= pos && pos <= end)
                .map(|block| (block, pos - ranges[block].0))
        };
        Some(TextCoords {
            anchor: locate(self.anchor)?,
            head: locate(self.head)?,
        })
    }
}

/// A selection addressed by textblock index and offset into that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCoords {
    anchor: (usize, usize),
    head: (usize, usize),
}

impl TextCoords {
    /// The selection these coordinates describe in `doc`. Offsets past the
    /// end of a (shrunk) block are clamped to its end.
    pub fn resolve(&self, doc: &Node, schema: &Schema) -> Option<Selection> {
        let ranges = textblock_ranges(doc, schema);
        let place = |(block, offset): (usize, usize)| {
            ranges
                .get(block)
                .map(|&(start, end)| (start + offset).min(end))
        };
        Some(Selection::new(place(self.anchor)?, place(self.head)?))
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::cursor(0)
    }
}

/// Content ranges (`start..=end`) of every textblock in the document, in
/// document order.
pub fn textblock_ranges(doc: &Node, schema: &Schema) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    doc.descendants(|node, pos, _, _| {
        if schema.is_textblock(node.node_type()) {
            ranges.push((pos + 1, pos + 1 + node.content_size()));
            return false;
        }
        !node.is_text()
    });
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::*;
    use crate::schema::basic_schema;
    use crate::transform::StepMap;
    use crate::{blockquote, doc, p};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_from_to_and_empty() {
        let sel = Selection::new(7, 3);
        assert_eq!((sel.from(), sel.to()), (3, 7));
        assert!(!sel.empty());
        assert!(Selection::cursor(4).empty());
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Selection::new(2, 12).clamp(8), Selection::new(2, 8));
    }

    #[test]
    fn test_map_through_insertion() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::single(1, 0, 3));
        assert_eq!(Selection::new(1, 5).map(&mapping), Selection::new(4, 8));
    }

    #[test]
    fn test_textblock_ranges() {
        let d = doc![p!("ab"), blockquote!(p!("c")), hr()];
        assert_eq!(textblock_ranges(&d, &basic_schema()), vec![(1, 3), (6, 7)]);
    }

    #[test]
    fn test_text_coords_survive_wrapping() {
        let schema = basic_schema();
        let before = doc![p!("ab"), p!("cd")];
        let coords = Selection::new(2, 6).text_coords(&before, &schema).unwrap();
        let after = doc![p!("ab"), blockquote!(p!("cd"))];
        assert_eq!(coords.resolve(&after, &schema), Some(Selection::new(2, 7)));
    }

    #[test]
    fn test_text_coords_outside_textblocks() {
        let d = doc![p!("ab"), hr()];
        assert_eq!(Selection::cursor(4).text_coords(&d, &basic_schema()), None);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(2, 2)]
    #[case(4, 3)]
    #[case(5, 6)]
    #[case(9, 7)]
    #[case(50, 7)]
    fn test_near(#[case] pos: usize, #[case] expected: usize) {
        let d = doc![p!("ab"), blockquote!(p!("c")), hr()];
        assert_eq!(Selection::near(&d, &basic_schema(), pos), Selection::cursor(expected));
    }
}
