use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Ensure a manifest path `rel` stays under `root` when joined: no absolute
/// paths, no drive prefixes, no `..`. Returns the joined path.
pub fn validate_rel_path(root: &Path, rel: &str) -> Result<PathBuf> {
    let p = Path::new(rel);
    if rel.is_empty() || p.is_absolute() || p.has_root() {
        return Err(Error::UnsafePath(rel.to_string()));
    }
    let mut normal = 0usize;
    for comp in p.components() {
        match comp {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::UnsafePath(rel.to_string()));
            }
        }
    }
    if normal == 0 {
        return Err(Error::UnsafePath(rel.to_string()));
    }
    Ok(root.join(p))
}

/// `true` if `path` does not exist or is an empty directory.
pub fn is_absent_or_empty_dir(path: &Path) -> Result<bool> {
    match std::fs::symlink_metadata(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(Error::io(path, e)),
        Ok(m) if !m.is_dir() => Ok(false),
        Ok(_) => {
            let mut rd = std::fs::read_dir(path).map_err(|e| Error::io(path, e))?;
            Ok(rd.next().is_none())
        }
    }
}
