use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Unreadable entries are skipped, every other I/O error aborts the walk.
fn skip_denied<T>(res: io::Result<T>, path: &Path) -> anyhow::Result<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            debug!(path = %path.display(), "Permission denied");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Walks `root` depth first, calling `callback` for every regular file in
/// path order. Symlinks are never followed and `excludes` prunes whole
/// directories.
pub fn visit<F, C>(root: &Path, excludes: &F, callback: &mut C) -> anyhow::Result<()>
where
    F: Fn(&Path) -> bool,
    C: FnMut(&Path) -> anyhow::Result<()>,
{
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
    let mut visited: HashSet<PathBuf> = HashSet::new();

    while let Some(current) = pending.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if excludes(&current) {
            debug!(path = %current.display(), "Path excluded");
            continue;
        }
        let Some(metadata) = skip_denied(fs::symlink_metadata(&current), &current)? else {
            continue;
        };
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            debug!(path = %current.display(), "Symlink skipped");
        } else if file_type.is_file() {
            callback(&current)?;
        } else if file_type.is_dir() {
            let Some(entries) = skip_denied(fs::read_dir(&current), &current)? else {
                continue;
            };
            let mut children = Vec::new();
            for entry in entries {
                if let Some(entry) = skip_denied(entry, &current)? {
                    children.push(entry.path());
                }
            }
            // Reverse order on the stack pops children in ascending order.
            children.sort_unstable_by(|a, b| b.cmp(a));
            debug!(path = %current.display(), entries = children.len(), "Entering directory");
            pending.extend(children);
        }
    }

    Ok(())
}
