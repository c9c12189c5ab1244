// Static file finders
// Enumerate candidate files for collection

use super::builder::AssetBuilder;
use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

/// A file found by a finder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundFile {
    /// Path relative to the finder's root, used as the collected path
    pub relative: PathBuf,
    pub absolute: PathBuf,
}

pub trait StaticFinder {
    /// List candidate files, skipping entries whose name is in `ignore`
    fn list(&self, ignore: &GlobSet) -> Result<Vec<FoundFile>>;
}

/// Compile shell-style ignore patterns (`CVS`, `.*`, `*~`)
pub fn ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Walks a set of root directories
#[derive(Debug, Clone)]
pub struct FileSystemFinder {
    roots: Vec<PathBuf>,
}

impl FileSystemFinder {
    pub const fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl StaticFinder for FileSystemFinder {
    fn list(&self, ignore: &GlobSet) -> Result<Vec<FoundFile>> {
        let mut found = Vec::new();
        for root in self.roots.iter().filter(|r| r.is_dir()) {
            // Patterns apply to names below the root, never the root itself
            let walker = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !ignore.is_match(e.file_name()));

            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(root) else {
                    continue;
                };
                found.push(FoundFile {
                    relative: relative.to_path_buf(),
                    absolute: entry.path().to_path_buf(),
                });
            }
        }
        Ok(found)
    }
}

/// Runs the asset build before listing its output directory
pub struct CompileFinder<B: AssetBuilder> {
    builder: B,
    output: FileSystemFinder,
}

impl<B: AssetBuilder> CompileFinder<B> {
    pub fn new(builder: B, output_dir: PathBuf) -> Self {
        Self {
            builder,
            output: FileSystemFinder::new(vec![output_dir]),
        }
    }
}

impl<B: AssetBuilder> StaticFinder for CompileFinder<B> {
    fn list(&self, ignore: &GlobSet) -> Result<Vec<FoundFile>> {
        self.builder.build()?;
        self.output.list(ignore)
    }
}
