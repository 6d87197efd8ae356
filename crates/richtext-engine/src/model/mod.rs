pub mod attrs;
pub mod fragment;
pub mod mark;
pub mod node;
pub(crate) mod replace;
pub mod resolve;
pub mod slice;

pub use attrs::{AttrValue, Attrs, attrs};
pub use fragment::Fragment;
pub use mark::{Mark, MarkSet};
pub use node::{Node, NodeKind, TEXT_TYPE};
pub use resolve::{NodeRange, ResolvedPos};
pub use slice::Slice;
