use crate::case::{CONFIG_FILE, is_enabled};
use crate::types::CaseLocation;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub root: PathBuf,
    /// Category directories to search. `None` searches every subdirectory.
    pub categories: Option<Vec<String>>,
    /// Restrict the search to this one category.
    pub category: Option<String>,
    pub include_disabled: bool,
    /// Cap on the number of cases, applied after sorting.
    pub limit: Option<usize>,
    /// How many directory levels below a category a case may sit.
    pub max_depth: Option<usize>,
}

impl DiscoveryOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if let Some(cat) = &self.category {
            return vec![self.root.join(cat)];
        }
        match &self.categories {
            Some(cats) => cats.iter().map(|c| self.root.join(c)).collect(),
            None => vec![self.root.clone()],
        }
    }
}

fn relative_name(root: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

impl CaseLocation {
    /// Builds the location of `dir` relative to `root`. `None` when `dir` is
    /// not strictly below `root`.
    pub fn under(root: &Path, dir: &Path) -> Option<Self> {
        let name = relative_name(root, dir)?;
        let category = name.split('/').next().unwrap_or(&name).to_string();
        Some(CaseLocation {
            path: dir.to_path_buf(),
            category,
            name,
        })
    }
}

/// Finds every directory holding a `config.yaml` below the configured search
/// directories, sorted by path. A missing root yields nothing.
pub fn discover(opts: &DiscoveryOptions) -> Vec<CaseLocation> {
    let mut dirs: BTreeSet<PathBuf> = BTreeSet::new();
    for search in opts.search_dirs() {
        if !search.is_dir() {
            debug!(dir = %search.display(), "search directory missing, skipping");
            continue;
        }
        let mut walker = WalkDir::new(&search).min_depth(1);
        if let Some(depth) = opts.max_depth {
            walker = walker.max_depth(depth + 1);
        }
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && entry.file_name() == CONFIG_FILE {
                if let Some(parent) = entry.path().parent() {
                    dirs.insert(parent.to_path_buf());
                }
            }
        }
    }

    let mut out: Vec<CaseLocation> = dirs
        .into_iter()
        .filter(|dir| opts.include_disabled || is_enabled(dir))
        .filter_map(|dir| CaseLocation::under(&opts.root, &dir))
        .collect();
    if let Some(limit) = opts.limit {
        out.truncate(limit);
    }
    debug!(count = out.len(), "discovered cases");
    out
}

/// Resolves an explicitly named case, bypassing discovery filters.
pub fn locate(root: &Path, relative: &str) -> Option<CaseLocation> {
    let relative = Path::new(relative.trim_matches('/'));
    // Only plain components; `..` would escape the root and mislabel the case.
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        debug!(path = %relative.display(), "rejecting case path that leaves the root");
        return None;
    }
    let dir = root.join(relative);
    if !dir.is_dir() {
        return None;
    }
    CaseLocation::under(root, &dir)
}
