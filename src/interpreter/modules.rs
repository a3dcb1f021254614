//! Module resolution and caching.
//!
//! `importer foo` resolves `foo.miaou` against the importing script's
//! directory, then each `MEOWLANG_PATH` entry in order. The canonicalized
//! absolute path keys the cache: a module parses and executes at most once
//! per interpreter. While a module's top level is still running, a
//! re-entrant import observes a snapshot of its partial namespace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::env::Env;
use super::value::ModuleValue;

pub const MODULE_EXTENSION: &str = "miaou";
pub const PATH_VARIABLE: &str = "MEOWLANG_PATH";

pub enum ModuleEntry {
    /// Top level still executing; holds the module's frame for snapshots.
    Loading(Rc<Env>),
    /// Frozen namespace, handed out by reference from now on.
    Ready(Rc<ModuleValue>),
}

#[derive(Default)]
pub struct ModuleCache {
    entries: HashMap<PathBuf, ModuleEntry>,
}

impl ModuleCache {
    pub fn get(&self, path: &Path) -> Option<&ModuleEntry> {
        self.entries.get(path)
    }

    pub fn begin(&mut self, path: PathBuf, env: Rc<Env>) {
        self.entries.insert(path, ModuleEntry::Loading(env));
    }

    pub fn finish(&mut self, path: PathBuf, module: Rc<ModuleValue>) {
        self.entries.insert(path, ModuleEntry::Ready(module));
    }

    /// Drops a failed load so a later import can retry from scratch.
    pub fn abort(&mut self, path: &Path) {
        self.entries.remove(path);
    }
}

/// Search directories for module resolution: the script's own directory
/// first, then `MEOWLANG_PATH` entries in order.
pub fn search_paths(base_dir: &Path) -> Vec<PathBuf> {
    let mut paths = vec![base_dir.to_path_buf()];
    if let Some(raw) = std::env::var_os(PATH_VARIABLE) {
        paths.extend(std::env::split_paths(&raw));
    }
    paths
}

/// First existing `NAME.miaou` under the search paths, canonicalized.
pub fn resolve(name: &str, paths: &[PathBuf]) -> Option<PathBuf> {
    let file_name = format!("{name}.{MODULE_EXTENSION}");
    paths
        .iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
        .and_then(|candidate| candidate.canonicalize().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolves_in_search_order() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        fs::write(second.path().join("util.miaou"), "miaou\nmeow\n").expect("write");

        let paths = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let resolved = resolve("util", &paths).expect("module should resolve");
        assert!(resolved.ends_with("util.miaou"));

        // Once the first directory also has the module, it wins.
        fs::write(first.path().join("util.miaou"), "miaou\nmeow\n").expect("write");
        let resolved = resolve("util", &paths).expect("module should resolve");
        assert_eq!(
            resolved,
            first.path().join("util.miaou").canonicalize().expect("canonicalize")
        );
    }

    #[test]
    fn missing_module_resolves_to_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(resolve("absent", &[dir.path().to_path_buf()]).is_none());
    }
}
