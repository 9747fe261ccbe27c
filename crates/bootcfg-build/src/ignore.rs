//! Path exclusion for source discovery
//!
//! Patterns are shell-style globs: `*` and `?` stay within one path
//! component, `**` crosses components, `[...]` / `[!...]` are character
//! classes. A pattern without a `/` also matches a bare directory name at
//! any depth. Literal paths added with [`IgnoreSet::push_path`] never do.

use crate::environment::normalize;
use crate::error::{BuildError, BuildResult};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Local build-tool caches that never hold project sources
pub const LOCAL_CACHE_PATTERNS: [&str; 2] = ["cmake-*", ".lbuild_cache"];

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    raw: String,
    regex: Regex,
    anchored: bool,
}

impl IgnorePattern {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> BuildResult<Self> {
        let trimmed = pattern.trim();
        let cleaned = trimmed
            .strip_prefix("./")
            .unwrap_or(trimmed)
            .trim_end_matches('/');

        if cleaned.is_empty() {
            return Err(BuildError::invalid_pattern(pattern, "pattern is empty"));
        }

        let regex = Regex::new(&glob_to_regex(cleaned)?)
            .map_err(|e| BuildError::invalid_pattern(pattern, e))?;

        Ok(Self {
            raw: cleaned.to_string(),
            regex,
            anchored: cleaned.contains('/'),
        })
    }

    /// Pattern for one literal path; matches only at that position, never by bare name
    pub fn literal(path: &str) -> BuildResult<Self> {
        let mut pattern = Self::new(&escape_glob(path))?;
        pattern.anchored = true;
        Ok(pattern)
    }

    /// The pattern as written (without `./` prefix or trailing `/`)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern names a path rather than a bare name
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Match a `/`-separated path string
    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl PartialEq for IgnorePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.anchored == other.anchored
    }
}

/// Ordered set of exclusion patterns
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    project_root: PathBuf,
    patterns: Vec<IgnorePattern>,
}

impl IgnoreSet {
    /// Create an empty set for a project
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: normalize(project_root.as_ref()),
            patterns: Vec::new(),
        }
    }

    /// The fixed exclusion list for a build
    ///
    /// Local build-tool caches, the persistent cache directory, the computed
    /// output directory, then every delegated directory.
    pub fn for_build(
        project_root: impl AsRef<Path>,
        output_dir: &Path,
        cache_dir: &Path,
        delegated: &[PathBuf],
    ) -> BuildResult<Self> {
        let mut set = Self::new(project_root);
        for pattern in LOCAL_CACHE_PATTERNS {
            set.push(pattern)?;
        }
        set.push_path(cache_dir)?;
        set.push_path(output_dir)?;
        for dir in delegated {
            set.push_path(dir)?;
        }
        Ok(set)
    }

    /// Add a glob pattern
    pub fn push(&mut self, pattern: &str) -> BuildResult<()> {
        self.insert(IgnorePattern::new(pattern)?);
        Ok(())
    }

    /// Add a literal path; paths inside the project are stored project-relative
    ///
    /// The path is excluded only at its own position (relative to the project
    /// or the source root), so a same-named directory elsewhere is kept.
    pub fn push_path(&mut self, path: &Path) -> BuildResult<()> {
        let path = normalize(path);
        let relative = path.strip_prefix(&self.project_root).unwrap_or(&path);
        self.insert(IgnorePattern::literal(&to_slash(relative))?);
        Ok(())
    }

    fn insert(&mut self, pattern: IgnorePattern) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    /// Add several glob patterns
    pub fn extend<I, S>(&mut self, patterns: I) -> BuildResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.push(pattern.as_ref())?;
        }
        Ok(())
    }

    /// Patterns in insertion order
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(IgnorePattern::as_str)
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the set has no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check whether `path` is excluded
    ///
    /// The path is tried relative to `source_root`, relative to the project
    /// root, and as an absolute path. Unanchored patterns also match the
    /// final component.
    pub fn is_ignored(&self, path: &Path, source_root: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let path = normalize(path);
        let source_root = normalize(source_root);

        let mut candidates = Vec::with_capacity(3);
        if let Ok(rel) = path.strip_prefix(&source_root) {
            candidates.push(to_slash(rel));
        }
        if let Ok(rel) = path.strip_prefix(&self.project_root) {
            candidates.push(to_slash(rel));
        }
        candidates.push(to_slash(&path));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.patterns.iter().any(|pattern| {
            candidates
                .iter()
                .filter(|c| !c.is_empty())
                .any(|c| pattern.matches(c))
                || (!pattern.is_anchored() && !name.is_empty() && pattern.matches(&name))
        })
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replacen("//", "/", 1)
}

/// Escape glob metacharacters so a literal path matches only itself
fn escape_glob(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if matches!(ch, '*' | '?' | '[' | ']') {
            out.push('[');
            out.push(ch);
            out.push(']');
        } else {
            out.push(ch);
        }
    }
    out
}

fn glob_to_regex(glob: &str) -> BuildResult<String> {
    let mut re = String::with_capacity(glob.len() * 2 + 2);
    re.push('^');

    let chars: Vec<char> = glob.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                // `**/` may also match zero components
                if chars.get(i + 2) == Some(&'/') {
                    re.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    re.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .skip(1)
                    .position(|&c| c == ']')
                    .map(|pos| i + 2 + pos)
                    .ok_or_else(|| BuildError::invalid_pattern(glob, "unclosed '['"))?;
                let mut class = &chars[i + 1..close];
                re.push('[');
                if class.first() == Some(&'!') {
                    re.push('^');
                    class = &class[1..];
                }
                for &c in class {
                    if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
                        re.push('\\');
                    }
                    re.push(c);
                }
                re.push(']');
                i = close + 1;
                continue;
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }

    re.push('$');
    Ok(re)
}
