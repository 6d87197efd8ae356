// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use richtext_engine::builders::{em, strong};
use richtext_engine::{Fragment, Node, blockquote, code_block, doc, h, li, p, ul};

/// A document repeating a mixed section `sections` times.
#[allow(dead_code)]
pub fn generate_document(sections: usize) -> Node {
    let mut blocks = Vec::new();
    for section in 0..sections {
        let title = format!("Section {section}");
        blocks.push(h!(2; title.as_str()));
        blocks.push(p!(
            "Paragraph with ",
            strong("bold"),
            " and ",
            em("italic"),
            " text that helps create realistic inline structure."
        ));
        blocks.push(ul!(
            li!(p!("Bullet point")),
            li!(p!("Another item"), ul!(li!(p!("Nested item"))))
        ));
        blocks.push(blockquote!(p!("Quoted text.")));
        blocks.push(code_block!("fn example() {\n    println!(\"Hello\");\n}"));
    }
    doc!().copy(Fragment::from_nodes(blocks))
}

/// One long paragraph of plain text.
#[allow(dead_code)]
pub fn generate_paragraph(chars: usize) -> Node {
    let text: String = "lorem ipsum ".chars().cycle().take(chars.max(1)).collect();
    doc![p!(text.as_str())]
}
