use std::fmt;

use serde::{Deserialize, Serialize};

use super::attrs::{AttrValue, Attrs, fmt_attrs};

/// An inline annotation (bold, link, ...) attached to a text node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    mark_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    attrs: Attrs,
}

impl Mark {
    /// Create a mark without consulting a schema. Use [`crate::Schema::mark`]
    /// to get default attributes filled in and the type checked.
    pub fn new(mark_type: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            mark_type: mark_type.into(),
            attrs,
        }
    }

    pub fn of(mark_type: impl Into<String>) -> Self {
        Self::new(mark_type, Attrs::new())
    }

    pub fn mark_type(&self) -> &str {
        &self.mark_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mark_type)?;
        fmt_attrs(&self.attrs, f)
    }
}

/// The marks of one text node: at most one mark per type, ordered by type
/// name so two sets holding the same marks always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub const fn empty() -> Self {
        MarkSet(Vec::new())
    }

    /// Returns a set that contains `mark`, replacing any mark of the same type.
    pub fn with(&self, mark: Mark) -> MarkSet {
        let mut marks = self.0.clone();
        match marks.binary_search_by(|m| m.mark_type.as_str().cmp(&mark.mark_type)) {
            Ok(i) => marks[i] = mark,
            Err(i) => marks.insert(i, mark),
        }
        MarkSet(marks)
    }

    pub fn without_type(&self, mark_type: &str) -> MarkSet {
        MarkSet(
            self.0
                .iter()
                .filter(|m| m.mark_type != mark_type)
                .cloned()
                .collect(),
        )
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.contains(mark)
    }

    pub fn has_type(&self, mark_type: &str) -> bool {
        self.get(mark_type).is_some()
    }

    pub fn get(&self, mark_type: &str) -> Option<&Mark> {
        self.0.iter().find(|m| m.mark_type == mark_type)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Mark] {
        &self.0
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        marks.into_iter().collect()
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<T: IntoIterator<Item = Mark>>(iter: T) -> Self {
        iter.into_iter()
            .fold(MarkSet::empty(), |set, mark| set.with(mark))
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
