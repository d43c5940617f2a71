use crate::digest::HashDigest;

/// Classification of a file relative to the previous snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatusFlag {
    #[default]
    NotChanged,
    /// New file, or an existing file whose content changed.
    Modified,
    Deleted,
}

impl StatusFlag {
    pub fn mark(self) -> char {
        match self {
            StatusFlag::NotChanged => '=',
            StatusFlag::Modified => '*',
            StatusFlag::Deleted => '-',
        }
    }

    pub fn from_mark(c: char) -> Option<Self> {
        match c {
            '=' => Some(StatusFlag::NotChanged),
            '*' => Some(StatusFlag::Modified),
            '-' => Some(StatusFlag::Deleted),
            _ => None,
        }
    }
}

/// One manifest entry. Identity is `path` alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub hash: HashDigest,
    pub status: StatusFlag,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, hash: HashDigest, status: StatusFlag) -> Self {
        Self { path: path.into(), hash, status }
    }

    pub fn with_status(self, status: StatusFlag) -> Self {
        Self { status, ..self }
    }

    /// Manifest line without the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{} {} {}", self.hash, self.status.mark(), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_are_a_bijection() {
        for s in [StatusFlag::NotChanged, StatusFlag::Modified, StatusFlag::Deleted] {
            assert_eq!(StatusFlag::from_mark(s.mark()), Some(s));
        }
        assert_eq!(StatusFlag::from_mark('x'), None);
        assert_eq!(StatusFlag::default(), StatusFlag::NotChanged);
    }

    #[test]
    fn line_layout() {
        let r = FileRecord::new("dir/a b.txt", HashDigest::from_bytes([0xAB; 20]), StatusFlag::Deleted);
        assert_eq!(r.to_line(), format!("{} - dir/a b.txt", "AB".repeat(20)));
    }
}
