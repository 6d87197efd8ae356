//! Key names and the map from keys to command chains.
//!
//! Keys are written as modifier names joined to the key name with `-`, in
//! any order: `Mod-Shift-z`, `shift-mod-z` and `Ctrl-Shift-z` (on Linux)
//! all normalize to `Ctrl-Shift-z`. `Mod` is Cmd on macOS and Ctrl
//! elsewhere.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commands::{BoxedCommand, Chain};
use crate::plugin::Plugin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    #[default]
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("key `{0}` has no key name")]
    EmptyKey(String),

    #[error("unknown modifier `{modifier}` in key `{key}`")]
    UnknownModifier { key: String, modifier: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Modifiers {
    alt: bool,
    ctrl: bool,
    meta: bool,
    shift: bool,
}

/// Normalize a key description to `Alt-Ctrl-Meta-Shift-name` order with
/// `Mod` resolved for `platform`.
pub fn normalize_key(key: &str, platform: Platform) -> Result<String, KeymapError> {
    let mut parts: Vec<&str> = key.split('-').collect();
    // "Mod--" binds the minus key itself
    let mut name = match parts.pop() {
        Some("") if parts.last() == Some(&"") => {
            parts.pop();
            "-"
        }
        Some(name) => name,
        None => "",
    };
    if name.is_empty() {
        return Err(KeymapError::EmptyKey(key.to_string()));
    }
    if name == "Space" {
        name = " ";
    }

    let mut mods = Modifiers::default();
    for modifier in parts {
        match modifier.to_ascii_lowercase().as_str() {
            "alt" | "a" => mods.alt = true,
            "ctrl" | "control" | "c" => mods.ctrl = true,
            "meta" | "cmd" | "m" => mods.meta = true,
            "shift" | "s" => mods.shift = true,
            "mod" => match platform {
                Platform::Mac => mods.meta = true,
                Platform::Other => mods.ctrl = true,
            },
            _ => {
                return Err(KeymapError::UnknownModifier {
                    key: key.to_string(),
                    modifier: modifier.to_string(),
                });
            }
        }
    }

    let mut normalized = String::new();
    for (on, label) in [
        (mods.alt, "Alt-"),
        (mods.ctrl, "Ctrl-"),
        (mods.meta, "Meta-"),
        (mods.shift, "Shift-"),
    ] {
        if on {
            normalized.push_str(label);
        }
    }
    normalized.push_str(name);
    Ok(normalized)
}

/// Maps normalized keys to the commands bound to them, tried in binding
/// order.
#[derive(Clone, Default)]
pub struct Keymap {
    platform: Platform,
    bindings: HashMap<String, Vec<BoxedCommand>>,
}

impl Keymap {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            bindings: HashMap::new(),
        }
    }

    /// Build the keymap for `plugins`. `overrides` are tried first, then
    /// the plugins' own bindings with later plugins before earlier ones.
    pub fn from_plugins(
        plugins: &[Box<dyn Plugin>],
        overrides: Vec<(String, BoxedCommand)>,
        platform: Platform,
    ) -> Result<Self, KeymapError> {
        let mut keymap = Keymap::new(platform);
        for (key, command) in overrides {
            keymap.bind(&key, command)?;
        }
        for plugin in plugins.iter().rev() {
            for (key, command) in plugin.keymap() {
                keymap.bind(&key, command)?;
            }
        }
        log::debug!("keymap has {} bound keys", keymap.bindings.len());
        Ok(keymap)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Add `command` after any commands already bound to `key`.
    pub fn bind(&mut self, key: &str, command: BoxedCommand) -> Result<(), KeymapError> {
        let key = normalize_key(key, self.platform)?;
        self.bindings.entry(key).or_default().push(command);
        Ok(())
    }

    /// The chain bound to `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<Chain> {
        let key = normalize_key(key, self.platform).ok()?;
        self.bindings
            .get(&key)
            .map(|commands| Chain::new(commands.clone()))
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for Keymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keymap")
            .field("platform", &self.platform)
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::commands::test_support::{run, state_at};
    use crate::plugin::default_plugins;
    use crate::{code_block, doc, li, p, ul};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    // ============ normalization ============

    #[rstest]
    #[case("Mod-z", Platform::Other, "Ctrl-z")]
    #[case("Mod-z", Platform::Mac, "Meta-z")]
    #[case("Shift-Mod-z", Platform::Other, "Ctrl-Shift-z")]
    #[case("shift-alt-ctrl-meta-x", Platform::Other, "Alt-Ctrl-Meta-Shift-x")]
    #[case("Cmd-s", Platform::Other, "Meta-s")]
    #[case("Enter", Platform::Mac, "Enter")]
    #[case("Mod--", Platform::Other, "Ctrl--")]
    #[case("Ctrl-Space", Platform::Other, "Ctrl- ")]
    #[case("-", Platform::Other, "-")]
    fn test_normalize_key(#[case] key: &str, #[case] platform: Platform, #[case] expected: &str) {
        assert_eq!(normalize_key(key, platform).unwrap(), expected);
    }

    #[test]
    fn test_normalize_errors() {
        assert_eq!(
            normalize_key("Mod-", Platform::Other),
            Err(KeymapError::EmptyKey("Mod-".into()))
        );
        assert!(matches!(
            normalize_key("Hyper-x", Platform::Other),
            Err(KeymapError::UnknownModifier { .. })
        ));
    }

    // ============ lookup ============

    #[test]
    fn test_equivalent_spellings_share_a_binding() {
        let mut keymap = Keymap::new(Platform::Other);
        keymap
            .bind("Mod-Shift-k", Arc::new(crate::commands::select_all))
            .unwrap();
        assert!(keymap.lookup("Shift-Ctrl-k").is_some());
        assert!(keymap.lookup("Ctrl-k").is_none());
        assert!(keymap.lookup("Bogus-k").is_none());
    }

    #[test]
    fn test_enter_depends_on_context() {
        let keymap = Keymap::from_plugins(&default_plugins(), Vec::new(), Platform::Other).unwrap();
        let enter = keymap.lookup("Enter").unwrap();
        assert_eq!(enter.len(), 3);

        let in_list = run(&enter, &state_at(doc![ul!(li!(p!("ab")))], 4, 4)).unwrap();
        assert_eq!(in_list.doc(), &doc![ul!(li!(p!("a")), li!(p!("b")))]);

        let in_code = run(&enter, &state_at(doc![code_block!("ab")], 2, 2)).unwrap();
        assert_eq!(in_code.doc(), &doc![code_block!("a\nb")]);

        let plain = run(&enter, &state_at(doc![p!("ab")], 2, 2)).unwrap();
        assert_eq!(plain.doc(), &doc![p!("a"), p!("b")]);
    }

    #[test]
    fn test_overrides_come_first() {
        fn never(_: &crate::state::EditorState, _: Option<crate::commands::Dispatch<'_>>) -> bool {
            false
        }
        let never: BoxedCommand = Arc::new(never);
        let keymap = Keymap::from_plugins(
            &default_plugins(),
            vec![("Tab".to_string(), never)],
            Platform::Other,
        )
        .unwrap();
        let tab = keymap.lookup("Tab").unwrap();
        // override, lists, core
        assert_eq!(tab.len(), 3);
        let state = state_at(doc![p!("ab")], 2, 2);
        assert!(tab.execute(&state, None));
    }
}
