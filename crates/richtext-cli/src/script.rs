//! Line-oriented editing scripts.
//!
//! One instruction per line; blank lines and lines starting with `#` are
//! skipped:
//!
//! ```text
//! type Hello        insert text at the selection
//! key Mod-b         press a key
//! run split_block   run a named command
//! select 1 6        set the selection (anchor, optional head)
//! undo / redo
//! print / json      write the document to the output
//! ```

use std::io::Write;

use anyhow::{Context, Result, bail};
use richtext_engine::{Editor, Selection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Type(String),
    Key(String),
    Run(String),
    Select { anchor: usize, head: usize },
    Undo,
    Redo,
    Print,
    Json,
}

pub fn parse_line(line: &str) -> Result<Option<Instruction>> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = trimmed.split_once(' ').unwrap_or((trimmed.trim_end(), ""));
    let argument = |what: &str| {
        let value = rest.trim();
        if value.is_empty() {
            bail!("`{word}` needs {what}");
        }
        Ok(value.to_string())
    };
    let instruction = match word {
        // keep the text exactly as written after the first space
        "type" if !rest.is_empty() => Instruction::Type(rest.to_string()),
        "type" => bail!("`type` needs some text"),
        "key" => Instruction::Key(argument("a key name")?),
        "run" => Instruction::Run(argument("a command name")?),
        "select" => {
            let positions = rest
                .split_whitespace()
                .map(|n| n.parse::<usize>().with_context(|| format!("bad position `{n}`")))
                .collect::<Result<Vec<_>>>()?;
            match positions[..] {
                [pos] => Instruction::Select {
                    anchor: pos,
                    head: pos,
                },
                [anchor, head] => Instruction::Select { anchor, head },
                _ => bail!("`select` takes one or two positions"),
            }
        }
        "undo" => Instruction::Undo,
        "redo" => Instruction::Redo,
        "print" => Instruction::Print,
        "json" => Instruction::Json,
        other => bail!("unknown instruction `{other}`"),
    };
    Ok(Some(instruction))
}

/// Run every line of `script` against `editor`. Instructions that do not
/// apply are logged and skipped; malformed lines and engine errors stop the
/// script.
pub fn run_script(editor: &mut Editor, script: &str, out: &mut impl Write) -> Result<()> {
    for (index, line) in script.lines().enumerate() {
        let line_no = index + 1;
        let Some(instruction) =
            parse_line(line).with_context(|| format!("line {line_no}: {line}"))?
        else {
            continue;
        };
        let applied = execute(editor, &instruction, out)
            .with_context(|| format!("line {line_no}: {line}"))?;
        if !applied {
            log::info!("line {line_no}: `{}` did not apply", line.trim());
        }
    }
    Ok(())
}

fn execute(editor: &mut Editor, instruction: &Instruction, out: &mut impl Write) -> Result<bool> {
    let applied = match instruction {
        Instruction::Type(text) => editor.type_text(text)?,
        Instruction::Key(key) => editor.handle_key(key)?,
        Instruction::Run(name) => editor.run_named(name)?,
        Instruction::Select { anchor, head } => {
            let size = editor.state().doc().content_size();
            if *anchor > size || *head > size {
                bail!("selection {anchor}..{head} is outside the document (size {size})");
            }
            editor.set_selection(Selection::new(*anchor, *head))?;
            true
        }
        Instruction::Undo => editor.undo(),
        Instruction::Redo => editor.redo(),
        Instruction::Print => {
            writeln!(out, "{}", editor.state().doc())?;
            true
        }
        Instruction::Json => {
            serde_json::to_writer_pretty(&mut *out, editor.state().doc())?;
            writeln!(out)?;
            true
        }
    };
    Ok(applied)
}
