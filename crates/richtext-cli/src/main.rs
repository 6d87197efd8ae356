use anyhow::{Context, Result};
use richtext_config::Config;
use richtext_engine::{Editor, Node};
use std::io::{Read, stdout};
use std::path::{Path, PathBuf};
use std::{env, fs, process};

mod script;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <script-file|-> [document.json]");
    eprintln!("Runs an editing script; `print` and `json` lines write the document.");
    process::exit(1);
}

fn read_script(path: &str) -> Result<String> {
    if path == "-" {
        let mut script = String::new();
        std::io::stdin()
            .read_to_string(&mut script)
            .context("Failed to read script from stdin")?;
        return Ok(script);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read script '{path}'"))
}

fn read_document(path: &Path) -> Result<Node> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse document '{}'", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("richtext", String::as_str);
    let (script_path, document_arg) = match args.as_slice() {
        [_, script] => (script, None),
        [_, script, document] => (script, Some(PathBuf::from(document))),
        _ => usage(program),
    };

    let config_path = Config::config_path();
    log::info!("Config path: {}", config_path.display());
    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let mut editor = Editor::new(config.editor_options())?;
    if let Some(path) = document_arg.or_else(|| config.editor.document.clone()) {
        let doc = read_document(&path)?;
        editor
            .load(doc)
            .with_context(|| format!("Document '{}' is invalid", path.display()))?;
        log::info!("Loaded {}", path.display());
    }

    let script = read_script(script_path)?;
    let mut out = stdout().lock();
    script::run_script(&mut editor, &script, &mut out)?;
    Ok(())
}
