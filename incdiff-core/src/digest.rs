use crate::error::{Error, Result};
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Digest length in bytes (SHA-1).
pub const DIGEST_LEN: usize = 20;

/// SHA-1 content digest of one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashDigest([u8; DIGEST_LEN]);

impl HashDigest {
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn of_bytes(data: &[u8]) -> Self {
        Self(Sha1::digest(data).into())
    }

    /// Hash everything `reader` yields until EOF.
    pub fn compute<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = Sha1::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(Self(hasher.finalize().into()))
    }

    /// Hash the full content of the file at `path`.
    pub fn of_file(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::compute(f).map_err(|e| Error::io(path, e))
    }

    /// Uppercase hex, two digits per byte.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(Error::MalformedHash(s.to_string()));
        }
        let mut out = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut out).map_err(|_| Error::MalformedHash(s.to_string()))?;
        Ok(Self(out))
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for HashDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}
