//! Script discovery and the trigger key → command map.
//!
//! The registry is built once at startup from a directory listing and never
//! changes afterwards: every entry name becomes a trigger key whose command
//! is `<dir>/<name>` with no arguments.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DiscoveryError;
use crate::scripting::CommandSpec;

/// Upper bound on entries read from the scripts directory.
pub const MAX_SCRIPTS: usize = 1024;

/// List the entry names in `dir` (non-recursive), sorted.
///
/// Fails if `dir` cannot be opened as a directory. Names that are not valid
/// UTF-8 cannot be addressed from a URL and are skipped. At most
/// [`MAX_SCRIPTS`] names are returned.
pub fn discover_scripts(dir: &Path) -> Result<Vec<String>, DiscoveryError> {
    let entries = std::fs::read_dir(dir).map_err(|source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::ReadEntry {
            path: dir.to_path_buf(),
            source,
        })?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => {
                tracing::warn!(name = ?raw, "Skipping script with non UTF-8 name");
            }
        }
    }

    names.sort();
    if names.len() > MAX_SCRIPTS {
        tracing::warn!(
            found = names.len(),
            limit = MAX_SCRIPTS,
            "Too many scripts, ignoring the rest",
        );
        names.truncate(MAX_SCRIPTS);
    }
    Ok(names)
}

/// Immutable mapping from trigger key to the command it runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptRegistry {
    scripts: BTreeMap<String, CommandSpec>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every entry in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, DiscoveryError> {
        let scripts = discover_scripts(dir)?
            .into_iter()
            .map(|name| {
                let command = CommandSpec::new(dir.join(&name));
                (name, command)
            })
            .collect();
        Ok(Self { scripts })
    }

    /// Register `command` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, command: CommandSpec) {
        self.scripts.insert(key.into(), command);
    }

    pub fn with(mut self, key: impl Into<String>, command: CommandSpec) -> Self {
        self.insert(key, command);
        self
    }

    pub fn get(&self, key: &str) -> Option<&CommandSpec> {
        self.scripts.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.scripts.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandSpec)> {
        self.scripts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
