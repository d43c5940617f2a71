use crate::digest::HashDigest;
use crate::error::{Error, Result};
use crate::record::{FileRecord, StatusFlag};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::btree_map::{self, BTreeMap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for a directory scan.
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Descend into symlinked directories.
    pub follow_links: bool,
    /// Glob patterns matched against the `/`-separated relative path.
    pub exclude: Vec<String>,
}

/// One parsed manifest line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestLine {
    pub hash: HashDigest,
    pub mark: StatusFlag,
    pub path: String,
}

/// Per-status record counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub unchanged: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.unchanged + self.modified + self.deleted
    }
}

/// Path-keyed set of file records, iterated in lexicographic path order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    records: BTreeMap<String, FileRecord>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` and hash every regular file below it. All records come
    /// back as `Modified`.
    pub fn build_from_directory(root: &Path, opts: &ScanOptions) -> Result<Self> {
        let excludes = build_excludes(&opts.exclude)?;
        let mut manifest = Manifest::new();
        let walker = walkdir::WalkDir::new(root).min_depth(1).follow_links(opts.follow_links);
        for ent in walker {
            let ent = ent?;
            let p = ent.path();
            let ft = ent.file_type();
            if ft.is_dir() {
                continue;
            }
            if ft.is_symlink() {
                // host semantics: a link to a file is hashed through the link
                match std::fs::metadata(p) {
                    Ok(m) if m.is_file() => {}
                    Ok(_) => {
                        debug!(path = ?p, "skipping symlink to non-file");
                        continue;
                    }
                    Err(e) => return Err(Error::io(p, e)),
                }
            } else if !ft.is_file() {
                debug!(path = ?p, "skipping special file");
                continue;
            }
            let rel_path = relative_key(root, p)?;
            if excludes.is_match(&rel_path) {
                debug!(path = %rel_path, "excluded");
                continue;
            }
            let hash = HashDigest::of_file(p)?;
            debug!(path = %rel_path, %hash, "hashed");
            manifest.insert(FileRecord::new(rel_path, hash, StatusFlag::Modified));
        }
        info!(root = ?root, files = manifest.len(), "scan complete");
        Ok(manifest)
    }

    /// Build a manifest from parsed lines, keeping each line's mark as the
    /// record status. Later lines replace earlier ones with the same path.
    pub fn from_records<I: IntoIterator<Item = ManifestLine>>(lines: I) -> Self {
        let mut manifest = Manifest::new();
        for l in lines {
            manifest.insert(FileRecord::new(l.path, l.hash, l.mark));
        }
        manifest
    }

    /// Insert or replace the record for `record.path`.
    pub fn insert(&mut self, record: FileRecord) -> Option<FileRecord> {
        self.records.insert(record.path.clone(), record)
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, FileRecord> {
        self.records.values()
    }

    pub fn summary(&self) -> Summary {
        let mut s = Summary::default();
        for r in self.iter() {
            match r.status {
                StatusFlag::NotChanged => s.unchanged += 1,
                StatusFlag::Modified => s.modified += 1,
                StatusFlag::Deleted => s.deleted += 1,
            }
        }
        s
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for r in self.iter() {
            out.push_str(&r.to_line());
            out.push('\n');
        }
        out
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        for r in self.iter() {
            writeln!(w, "{}", r.to_line())?;
        }
        w.flush()
    }

    /// Write the manifest to `path`, truncating any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let f = File::create(path).map_err(|e| Error::io(path, e))?;
        self.write_to(BufWriter::new(f)).map_err(|e| Error::io(path, e))
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a FileRecord;
    type IntoIter = btree_map::Values<'a, String, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn build_excludes(patterns: &[String]) -> Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for g in patterns {
        b.add(Glob::new(g)?);
    }
    Ok(b.build()?)
}

/// Relative manifest key of `path` under `root`, `/`-separated.
fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    let mut parts = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(s) => {
                let s = s.to_str().ok_or_else(|| Error::UnrepresentablePath(path.into()))?;
                parts.push(s);
            }
            Component::CurDir => {}
            _ => return Err(Error::UnrepresentablePath(path.into())),
        }
    }
    let key = parts.join("/");
    if key.is_empty() || key.contains(['\n', '\r']) {
        return Err(Error::UnrepresentablePath(PathBuf::from(path)));
    }
    Ok(key)
}

/// Split one line into (hash, mark, path). `None` when the line does not
/// have that shape.
///
/// The mark is followed by exactly one space or tab; everything after it is
/// the path, kept byte for byte.
fn tokenize(line: &str) -> Option<(&str, char, &str)> {
    let line = line.strip_suffix('\r').unwrap_or(line).trim_start();
    let (hash, rest) = line.split_once(char::is_whitespace)?;
    let mut chars = rest.trim_start().chars();
    let mark = chars.next()?;
    let path = chars.as_str().strip_prefix([' ', '\t'])?;
    if path.is_empty() {
        return None;
    }
    Some((hash, mark, path))
}

/// Parse manifest lines from a reader.
///
/// Lines that do not tokenize into hash, a known mark and a non-empty path
/// are skipped with a warning and parsing continues. A well-shaped line with
/// a bad hash is an error.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<ManifestLine>> {
    read_records_from(reader, Path::new("<input>"))
}

fn read_records_from<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<ManifestLine>> {
    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io(origin, e))?;
        let lineno = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let Some((hash, mark, path)) = tokenize(&line) else {
            warn!(line = lineno, content = %line, "skipping malformed manifest line");
            continue;
        };
        let Some(mark) = StatusFlag::from_mark(mark) else {
            warn!(line = lineno, %mark, "skipping manifest line with unknown mark");
            continue;
        };
        let hash = HashDigest::from_hex(hash)
            .map_err(|e| Error::Line { line: lineno, source: Box::new(e) })?;
        out.push(ManifestLine { hash, mark, path: path.to_string() });
    }
    Ok(out)
}

pub fn parse_records(text: &str) -> Result<Vec<ManifestLine>> {
    read_records(text.as_bytes())
}

/// Read and parse the manifest file at `path`.
pub fn load_records(path: &Path) -> Result<Vec<ManifestLine>> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    read_records_from(BufReader::new(f), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_keeps_spaces_in_path() {
        let h = "A".repeat(40);
        let line = format!("{h} * dir/with space/f.txt");
        assert_eq!(tokenize(&line), Some((h.as_str(), '*', "dir/with space/f.txt")));
    }

    #[test]
    fn tokenize_tolerates_leading_whitespace_and_crlf() {
        let h = "B".repeat(40);
        let line = format!("  {h}\t=\ta.txt\r");
        assert_eq!(tokenize(&line), Some((h.as_str(), '=', "a.txt")));
    }

    #[test]
    fn tokenize_keeps_path_whitespace_verbatim() {
        let h = "D".repeat(40);
        assert_eq!(tokenize(&format!("{h} *  lead.txt")), Some((h.as_str(), '*', " lead.txt")));
        assert_eq!(tokenize(&format!("{h} * trail.txt ")), Some((h.as_str(), '*', "trail.txt ")));
        assert_eq!(
            tokenize(&format!("{h} * \u{a0}nbsp.txt")),
            Some((h.as_str(), '*', "\u{a0}nbsp.txt"))
        );
        assert_eq!(tokenize(&format!("{h} *  ")), Some((h.as_str(), '*', " ")));
    }

    #[test]
    fn tokenize_rejects_short_lines() {
        let h = "C".repeat(40);
        assert_eq!(tokenize(&h), None);
        assert_eq!(tokenize(&format!("{h} *")), None);
        assert_eq!(tokenize(&format!("{h} * ")), None);
        assert_eq!(tokenize(&format!("{h} ** a.txt")), None);
    }

    #[test]
    fn relative_key_uses_forward_slashes() {
        let root = Path::new("/data");
        let p = root.join("x").join("y").join("z.bin");
        assert_eq!(relative_key(root, &p).unwrap(), "x/y/z.bin");
    }
}
