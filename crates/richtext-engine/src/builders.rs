//! Terse document construction against the basic schema, mostly for tests
//! and benchmarks.
//!
//! ```
//! use richtext_engine::builders::strong;
//! use richtext_engine::{doc, h, p};
//!
//! let d = doc![h!(1; "Title"), p!("plain ", strong("bold"))];
//! assert_eq!(d.child_count(), 2);
//! ```

use crate::model::{Mark, Node, attrs};
use crate::schema::basic_schema;

pub fn text(text: &str) -> Node {
    Node::from(text)
}

/// Add `mark` to a text node, respecting mark exclusion. Other nodes are
/// returned unchanged.
pub fn with_mark(node: Node, mark: Mark) -> Node {
    let marks = basic_schema().add_mark_to_set(node.marks(), mark);
    node.with_marks(marks)
}

pub fn strong(node: impl Into<Node>) -> Node {
    with_mark(node.into(), Mark::of("strong"))
}

pub fn em(node: impl Into<Node>) -> Node {
    with_mark(node.into(), Mark::of("em"))
}

pub fn underline(node: impl Into<Node>) -> Node {
    with_mark(node.into(), Mark::of("underline"))
}

pub fn strike(node: impl Into<Node>) -> Node {
    with_mark(node.into(), Mark::of("strike"))
}

pub fn code(node: impl Into<Node>) -> Node {
    with_mark(node.into(), Mark::of("code"))
}

pub fn link(href: &str, node: impl Into<Node>) -> Node {
    with_mark(node.into(), Mark::new("link", attrs([("href", href)])))
}

pub fn hard_break() -> Node {
    Node::leaf("hard_break", Default::default())
}

pub fn hr() -> Node {
    Node::leaf("horizontal_rule", Default::default())
}

pub fn image(src: &str) -> Node {
    Node::leaf("image", attrs([("src", src), ("alt", "")]))
}

#[doc(hidden)]
#[macro_export]
macro_rules! __container {
    ($ty:expr, $attrs:expr $(, $child:expr)*) => {
        $crate::model::Node::container(
            $ty,
            $attrs,
            $crate::model::Fragment::from_nodes(::std::vec![
                $($crate::model::Node::from($child)),*
            ]),
        )
    };
}

#[macro_export]
macro_rules! doc {
    ($($child:expr),* $(,)?) => {
        $crate::__container!("doc", ::std::default::Default::default() $(, $child)*)
    };
}

#[macro_export]
macro_rules! p {
    ($($child:expr),* $(,)?) => {
        $crate::__container!("paragraph", ::std::default::Default::default() $(, $child)*)
    };
}

/// `h!(level; children...)`
#[macro_export]
macro_rules! h {
    ($level:expr $(; $($child:expr),* $(,)?)?) => {
        $crate::__container!(
            "heading",
            $crate::model::attrs([("level", $crate::model::AttrValue::from($level as i64))])
            $($(, $child)*)?
        )
    };
}

#[macro_export]
macro_rules! blockquote {
    ($($child:expr),* $(,)?) => {
        $crate::__container!("blockquote", ::std::default::Default::default() $(, $child)*)
    };
}

#[macro_export]
macro_rules! code_block {
    ($($child:expr),* $(,)?) => {
        $crate::__container!("code_block", ::std::default::Default::default() $(, $child)*)
    };
}

#[macro_export]
macro_rules! ul {
    ($($child:expr),* $(,)?) => {
        $crate::__container!("bullet_list", ::std::default::Default::default() $(, $child)*)
    };
}

#[macro_export]
macro_rules! ol {
    ($($child:expr),* $(,)?) => {
        $crate::__container!(
            "ordered_list",
            $crate::model::attrs([("order", $crate::model::AttrValue::from(1i64))])
            $(, $child)*
        )
    };
}

#[macro_export]
macro_rules! li {
    ($($child:expr),* $(,)?) => {
        $crate::__container!("list_item", ::std::default::Default::default() $(, $child)*)
    };
}
