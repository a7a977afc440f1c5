//! File content digests recorded in manifest entries.
//!
//! A catalogued file may carry several digests; the entries file persists the SHA-256 one. The
//! [`HashKind`] enum names the supported algorithms and [`FileHasher`] computes all of them in a
//! single pass over the content.

use std::{fmt, io, str::FromStr};

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;

/// SHA-256 digest of zero-length content.
pub const ZERO_LENGTH_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// The [`HashKind`] enum represents the digest algorithms a [`FileHash`] can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Sha1,
    #[default]
    Sha256,
}

impl HashKind {
    pub const fn size(&self) -> usize {
        match self {
            HashKind::Sha1 => 20,
            HashKind::Sha256 => 32,
        }
    }
    pub const fn hex_len(&self) -> usize {
        match self {
            HashKind::Sha1 => 40,
            HashKind::Sha256 => 64,
        }
    }
    pub const fn as_str(&self) -> &'static str {
        match self {
            HashKind::Sha1 => "sha1",
            HashKind::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashKind::Sha1),
            "sha256" => Ok(HashKind::Sha256),
            _ => Err(format!("Invalid hash kind `{s}`")),
        }
    }
}

/// Digests of a file's content as lowercase hex strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl FileHash {
    /// A hash carrying only a SHA-256 digest, as read back from an entries file.
    pub fn sha256(hex: impl Into<String>) -> Self {
        Self {
            sha1: None,
            sha256: Some(hex.into()),
        }
    }

    /// Returns the digest for `kind`, or the empty string when it was not recorded.
    pub fn hash_of(&self, kind: HashKind) -> &str {
        let value = match kind {
            HashKind::Sha1 => self.sha1.as_deref(),
            HashKind::Sha256 => self.sha256.as_deref(),
        };
        value.unwrap_or_default()
    }
}

/// Computes every supported digest in one pass. Implements `std::io::Write` so content can be
/// piped in with `io::copy`.
#[derive(Clone, Default)]
pub struct FileHasher {
    sha1: Sha1,
    sha256: Sha256,
}

impl FileHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.sha1.update(data);
        self.sha256.update(data);
    }

    pub fn finalize(self) -> FileHash {
        FileHash {
            sha1: Some(hex::encode(self.sha1.finalize())),
            sha256: Some(hex::encode(self.sha256.finalize())),
        }
    }
}

impl io::Write for FileHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Calculate the SHA-256 hex string of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
