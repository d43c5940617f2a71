use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::path_safety::{is_absent_or_empty_dir, validate_rel_path};
use crate::record::StatusFlag;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Paths copied into the output root, in manifest order.
    pub copied: Vec<String>,
    /// Paths marked deleted, in manifest order. Input for the cleanup script.
    pub deleted: Vec<String>,
}

/// Copy every `Modified` record from `source_root` into `output_root` and
/// collect the `Deleted` paths.
///
/// `output_root` must be absent or an empty directory. Existing targets are
/// never overwritten; the first failure aborts without cleanup.
pub fn materialize(
    manifest: &Manifest,
    source_root: &Path,
    output_root: &Path,
) -> Result<MaterializeReport> {
    if !is_absent_or_empty_dir(output_root)? {
        return Err(Error::PathConflict(output_root.to_path_buf()));
    }
    fs::create_dir_all(output_root).map_err(|e| Error::io(output_root, e))?;

    let mut report = MaterializeReport::default();
    for rec in manifest {
        match rec.status {
            StatusFlag::NotChanged => {}
            StatusFlag::Deleted => {
                // ends up in the cleanup script, so it must stay under the target too
                validate_rel_path(source_root, &rec.path)?;
                report.deleted.push(rec.path.clone());
            }
            StatusFlag::Modified => {
                let src = validate_rel_path(source_root, &rec.path)?;
                let dst = validate_rel_path(output_root, &rec.path)?;
                copy_new(&src, &dst)?;
                debug!(path = %rec.path, "copied");
                report.copied.push(rec.path.clone());
            }
        }
    }
    info!(copied = report.copied.len(), deleted = report.deleted.len(), "materialized");
    Ok(report)
}

/// Copy `src` to `dst`, creating parent directories. Fails if `dst` exists.
fn copy_new(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let mut input = File::open(src).map_err(|e| Error::io(src, e))?;
    let mut output =
        OpenOptions::new().write(true).create_new(true).open(dst).map_err(|e| Error::io(dst, e))?;
    io::copy(&mut input, &mut output).map_err(|e| Error::io(dst, e))?;
    Ok(())
}
