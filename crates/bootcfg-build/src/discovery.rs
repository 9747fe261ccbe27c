//! Source discovery
use crate::environment::absolutize;
use crate::error::{BuildError, BuildResult};
use crate::ignore::IgnoreSet;

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default compilable source extensions (C, C++, assembly)
pub const DEFAULT_EXTENSIONS: [&str; 8] = ["c", "cc", "cpp", "cxx", "c++", "s", "S", "sx"];

/// Ordered set of discovered source files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceFileSet {
    files: Vec<PathBuf>,
}

impl SourceFileSet {
    /// Files in traversal order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Iterate over files
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.files.iter()
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files were found
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check whether a file was discovered
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }

    /// Paths relative to `root`; files outside it are returned unchanged
    pub fn relative_to(&self, root: &Path) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap_or(f).to_path_buf())
            .collect()
    }
}

impl<'a> IntoIterator for &'a SourceFileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Recursively enumerates compilable files under a source root
#[derive(Debug, Clone)]
pub struct SourceDiscoverer {
    root: PathBuf,
    extensions: Vec<String>,
}

impl SourceDiscoverer {
    /// Create a discoverer for `root` with the default extensions
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: absolutize(root.as_ref()),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Set the compilable extensions (without the leading dot)
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// Source root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fail unless the source root exists and is a directory
    pub fn check_root(&self) -> BuildResult<()> {
        if !self.root.exists() {
            return Err(BuildError::SourceRootMissing(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(BuildError::SourceRootNotDirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Discover all source files, pruning ignored subtrees
    ///
    /// Entries are visited in file-name order so repeated runs over an
    /// unchanged tree produce the same sequence.
    pub fn discover(&self, ignore: &IgnoreSet) -> BuildResult<SourceFileSet> {
        self.check_root()?;

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let ignored = ignore.is_ignored(entry.path(), &self.root);
                if ignored {
                    log::debug!("ignoring {}", entry.path().display());
                }
                !ignored
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                BuildError::discovery(path, e)
            })?;

            if entry.file_type().is_file() && self.is_compilable(entry.path()) {
                files.push(entry.into_path());
            }
        }

        log::debug!(
            "discovered {} source files under {}",
            files.len(),
            self.root.display()
        );

        Ok(SourceFileSet { files })
    }

    fn is_compilable(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_root_fails() {
        let temp = tempfile::tempdir().unwrap();
        let discoverer = SourceDiscoverer::new(temp.path().join("src"));
        let ignore = IgnoreSet::new(temp.path());
        assert!(matches!(
            discoverer.discover(&ignore),
            Err(BuildError::SourceRootMissing(_))
        ));
    }

    #[test]
    fn test_file_root_fails() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("src"), "").unwrap();
        let discoverer = SourceDiscoverer::new(temp.path().join("src"));
        assert!(matches!(
            discoverer.check_root(),
            Err(BuildError::SourceRootNotDirectory(_))
        ));
    }

    #[test]
    fn test_extension_filter() {
        let discoverer = SourceDiscoverer::new("/p/src");
        assert!(discoverer.is_compilable(Path::new("main.cpp")));
        assert!(discoverer.is_compilable(Path::new("startup.S")));
        assert!(discoverer.is_compilable(Path::new("vectors.sx")));
        assert!(!discoverer.is_compilable(Path::new("board.hpp")));
        assert!(!discoverer.is_compilable(Path::new("Makefile")));
    }

    #[test]
    fn test_custom_extensions_strip_dot() {
        let discoverer = SourceDiscoverer::new("/p/src").with_extensions(vec![".c".to_string()]);
        assert!(discoverer.is_compilable(Path::new("main.c")));
        assert!(!discoverer.is_compilable(Path::new("main.cpp")));
    }
}
