//! Static asset collection
//!
//! Finders are consulted in order; the compile finder comes first so freshly
//! built CSS shadows anything with the same relative path in the source
//! directories.

mod builder;
mod finder;

pub use builder::{ensure_output_dir, AssetBuilder, CommandBuilder};
pub use finder::{ignore_set, CompileFinder, FileSystemFinder, FoundFile, StaticFinder};

use crate::config::AssetsConfig;
use crate::error::Result;
use crate::logger;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Finder chain for the configured asset layout
pub fn configured_finders(cfg: &AssetsConfig) -> Vec<Box<dyn StaticFinder>> {
    vec![
        Box::new(CompileFinder::new(
            CommandBuilder::new(cfg.build_command.clone(), cfg.css_dir.clone()),
            cfg.css_dir.clone(),
        )),
        Box::new(FileSystemFinder::new(cfg.static_dirs.clone())),
    ]
}

/// Copy every found file into `static_root`; the first finder to yield a
/// relative path wins. Returns the number of files copied.
pub fn collect_static(
    finders: &[Box<dyn StaticFinder>],
    static_root: &Path,
    ignore_patterns: &[String],
) -> Result<usize> {
    let ignore = ignore_set(ignore_patterns)?;
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for finder in finders {
        for file in finder.list(&ignore)? {
            if !seen.insert(file.relative.clone()) {
                logger::log_debug(&format!(
                    "[Assets] {} shadowed by an earlier finder",
                    file.absolute.display()
                ));
                continue;
            }
            let dest = static_root.join(&file.relative);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&file.absolute, &dest)?;
        }
    }

    logger::log_info(&format!(
        "[Assets] {} static files copied to {}",
        seen.len(),
        static_root.display()
    ));
    Ok(seen.len())
}
