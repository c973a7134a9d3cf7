// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codebase context extraction.
//!
//! The walk itself is a capability; the analyzer groups what it returns,
//! detects coarse patterns, and loads tech orders (advisory notes). The
//! output is a summary string used solely as LLM input.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Paths never considered part of the codebase.
const IGNORED_DIRS: &[&str] =
    &[".git", ".hg", "node_modules", "target", "dist", "build", ".next", "vendor", "__pycache__", ".venv"];

/// External capability: enumerate files under a root.
pub trait FileWalker: Send + Sync {
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Filesystem walker skipping build outputs and VCS metadata.
#[derive(Clone, Default)]
pub struct FsWalker;

impl FileWalker for FsWalker {
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        walk(root, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if entry.file_type()?.is_dir() {
            if !IGNORED_DIRS.contains(&name.as_ref()) {
                walk(&path, files)?;
            }
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// An advisory note loaded from the tech orders directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechOrder {
    pub name: String,
    pub summary: String,
}

/// Extracted codebase context.
#[derive(Debug, Clone, Default)]
pub struct CodebaseContext {
    pub root: PathBuf,
    pub file_count: usize,
    /// Top-level directory → file count.
    pub groups: BTreeMap<String, usize>,
    /// Detected pattern → confidence in `[0, 1]`.
    pub patterns: Vec<(String, f64)>,
    pub tech_orders: Vec<TechOrder>,
}

impl CodebaseContext {
    /// Render the context as LLM prompt input.
    pub fn summary(&self) -> String {
        if self.file_count == 0 {
            return "No codebase context available.".to_string();
        }
        let mut out = format!("Codebase at {} with {} files.\n", self.root.display(), self.file_count);
        if !self.groups.is_empty() {
            out.push_str("Layout: ");
            let groups: Vec<String> =
                self.groups.iter().map(|(dir, count)| format!("{dir} ({count})")).collect();
            out.push_str(&groups.join(", "));
            out.push('\n');
        }
        for (pattern, confidence) in &self.patterns {
            out.push_str(&format!("Pattern: {pattern} (confidence {confidence:.2})\n"));
        }
        out
    }

    pub fn tech_order_summary(&self) -> String {
        if self.tech_orders.is_empty() {
            return String::new();
        }
        let mut out = String::from("Tech orders:\n");
        for order in &self.tech_orders {
            out.push_str(&format!("- {}: {}\n", order.name, order.summary));
        }
        out
    }
}

/// Groups files, detects patterns, and loads tech orders.
pub struct CodebaseAnalyzer<W: FileWalker> {
    walker: W,
}

impl<W: FileWalker> CodebaseAnalyzer<W> {
    pub fn new(walker: W) -> Self {
        Self { walker }
    }

    pub fn analyze(
        &self,
        root: &Path,
        tech_orders_dir: Option<&Path>,
    ) -> io::Result<CodebaseContext> {
        let files = self.walker.list_files(root)?;

        let mut groups: BTreeMap<String, usize> = BTreeMap::new();
        for file in &files {
            let rel = file.strip_prefix(root).unwrap_or(file);
            let group = if rel.components().count() <= 1 {
                // Files directly under the root
                ".".to_string()
            } else {
                rel.components()
                    .next()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .unwrap_or_else(|| ".".to_string())
            };
            *groups.entry(group).or_insert(0) += 1;
        }

        let patterns = detect_patterns(&files);
        let tech_orders = match tech_orders_dir {
            Some(dir) => load_tech_orders(dir)?,
            None => Vec::new(),
        };

        Ok(CodebaseContext {
            root: root.to_path_buf(),
            file_count: files.len(),
            groups,
            patterns,
            tech_orders,
        })
    }
}

fn detect_patterns(files: &[PathBuf]) -> Vec<(String, f64)> {
    if files.is_empty() {
        return Vec::new();
    }
    let total = files.len() as f64;
    let ext_count = |ext: &str| files.iter().filter(|f| f.extension().is_some_and(|e| e == ext)).count();

    let mut patterns = Vec::new();
    for (name, ext) in [
        ("rust", "rs"),
        ("typescript", "ts"),
        ("javascript", "js"),
        ("python", "py"),
        ("go", "go"),
    ] {
        let count = ext_count(ext);
        if count > 0 {
            patterns.push((name.to_string(), count as f64 / total));
        }
    }

    let test_files = files
        .iter()
        .filter(|f| f.to_string_lossy().contains("test"))
        .count();
    if test_files > 0 {
        patterns.push(("tests-present".to_string(), (test_files as f64 / total).min(1.0)));
    }

    let manifest_count = files
        .iter()
        .filter(|f| {
            f.file_name()
                .is_some_and(|n| n == "Cargo.toml" || n == "package.json")
        })
        .count();
    if manifest_count > 1 {
        patterns.push(("workspace".to_string(), 1.0));
    }

    patterns
}

/// Load `*.md` advisory notes: name from the file stem, summary from the
/// first non-empty, non-heading line.
fn load_tech_orders(dir: &Path) -> io::Result<Vec<TechOrder>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut orders = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_none_or(|e| e != "md") {
            continue;
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = fs::read_to_string(&path)?;
        let summary = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .unwrap_or("")
            .chars()
            .take(200)
            .collect();
        orders.push(TechOrder { name, summary });
    }
    orders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(orders)
}

#[cfg(test)]
#[path = "codebase_tests.rs"]
mod tests;
