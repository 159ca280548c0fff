//! Playbook discovery: `<root>/<playbook>/<phase>/<file>.yml`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A playbook file and the phase directory it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookFile {
    pub playbook: String,
    pub phase_dir: PathBuf,
    pub path: PathBuf,
}

/// Find every playbook file under `root`, sorted by path.
///
/// Directories named in `skip_dirs` are ignored at both levels. Only
/// `.yml`/`.yaml` files directly inside a phase directory count; module
/// directories below a phase are never descended into.
pub fn discover_playbooks(
    root: &Path,
    skip_dirs: &[String],
    only_playbooks: Option<&[String]>,
) -> Result<Vec<PlaybookFile>> {
    let mut found = Vec::new();

    for playbook_dir in sorted_subdirs(root, skip_dirs)? {
        let playbook = dir_name(&playbook_dir);
        if let Some(only) = only_playbooks {
            if !only.iter().any(|p| *p == playbook) {
                tracing::debug!(playbook = %playbook, "not selected, skipping");
                continue;
            }
        }
        for phase_dir in sorted_subdirs(&playbook_dir, skip_dirs)? {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&phase_dir)
                .with_context(|| format!("Failed to read phase directory: {}", phase_dir.display()))?
            {
                let path = entry?.path();
                if path.is_file() && is_yaml(&path) {
                    files.push(path);
                }
            }
            files.sort();
            found.extend(files.into_iter().map(|path| PlaybookFile {
                playbook: playbook.clone(),
                phase_dir: phase_dir.clone(),
                path,
            }));
        }
    }

    Ok(found)
}

fn sorted_subdirs(dir: &Path, skip_dirs: &[String]) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() && !skip_dirs.iter().any(|s| *s == dir_name(&path)) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}
