//! The catalogue record for one file: identity, size, content digest and modification time.

use std::{fmt, fs, io, path::Path};

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ManifestError,
    hash::{FileHash, FileHasher, HashKind},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<FileHash>,
    #[serde(rename = "mtime", default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<FixedOffset>>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            hash: None,
            modified_time: None,
        }
    }

    pub fn with_sha256(mut self, hex: impl Into<String>) -> Self {
        self.hash
            .get_or_insert_with(FileHash::default)
            .sha256 = Some(hex.into());
        self
    }

    pub fn with_modified_time(mut self, mtime: DateTime<FixedOffset>) -> Self {
        self.modified_time = Some(mtime);
        self
    }

    /// Build a record for a file on disk, hashing its content.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|e| ManifestError::from_io(path, e))?;
        if meta.is_dir() {
            return Err(ManifestError::IOError(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )));
        }

        let mut file = fs::File::open(path).map_err(|e| ManifestError::from_io(path, e))?;
        let mut hasher = FileHasher::new();
        io::copy(&mut file, &mut hasher)?;

        let modified_time = meta
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).fixed_offset());

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_string_lossy().into_owned(),
            size: meta.len(),
            hash: Some(hasher.finalize()),
            modified_time,
        })
    }

    /// The SHA-256 column value, empty when no digest was recorded.
    pub fn sha256(&self) -> &str {
        self.hash
            .as_ref()
            .map(|h| h.hash_of(HashKind::Sha256))
            .unwrap_or_default()
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.path, self.size)
    }
}

/// Format a timestamp the way the entries file stores it: RFC 3339 with up to nine fractional
/// digits, trailing zeros trimmed, `Z` for UTC.
pub fn format_mtime(mtime: &DateTime<FixedOffset>) -> String {
    let full = mtime.to_rfc3339_opts(SecondsFormat::Nanos, true);
    // fraction sits between the '.' after the seconds and the zone designator
    let Some(dot) = full.find('.') else {
        return full;
    };
    let zone = full[dot..]
        .find(|c: char| c == 'Z' || c == '+' || c == '-')
        .map(|i| dot + i)
        .unwrap_or(full.len());
    let fraction = full[dot + 1..zone].trim_end_matches('0');
    if fraction.is_empty() {
        format!("{}{}", &full[..dot], &full[zone..])
    } else {
        format!("{}.{}{}", &full[..dot], fraction, &full[zone..])
    }
}

/// Parse an RFC 3339 timestamp, keeping its offset.
pub fn parse_mtime(text: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{NaiveDate, TimeZone, Timelike};

    use super::*;
    use crate::hash::sha256_hex;

    fn utc(secs: u32, nanos: u32) -> DateTime<FixedOffset> {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_nano_opt(8, 30, secs, nanos)
            .unwrap()
            .and_utc()
            .fixed_offset()
    }

    #[test]
    fn test_format_mtime_trims_fraction() {
        assert_eq!(format_mtime(&utc(1, 0)), "2024-05-17T08:30:01Z");
        assert_eq!(format_mtime(&utc(1, 500_000_000)), "2024-05-17T08:30:01.5Z");
        assert_eq!(
            format_mtime(&utc(1, 123_456_789)),
            "2024-05-17T08:30:01.123456789Z"
        );
    }

    #[test]
    fn test_format_mtime_keeps_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let t = offset
            .with_ymd_and_hms(2023, 1, 2, 3, 4, 5)
            .unwrap()
            .with_nanosecond(120)
            .unwrap();
        let text = format_mtime(&t);
        assert_eq!(text, "2023-01-02T03:04:05.00000012+02:00");

        let parsed = parse_mtime(&text).unwrap();
        assert_eq!(parsed, t);
        assert_eq!(parsed.offset(), t.offset());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"hello").unwrap();
        drop(file);

        let entry = FileEntry::from_path(&path).unwrap();
        assert_eq!(entry.name, "a.txt");
        assert_eq!(entry.size, 5);
        assert_eq!(entry.sha256(), sha256_hex(b"hello"));
        assert!(entry.modified_time.is_some());

        assert!(FileEntry::from_path(dir.path().join("missing")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_json_omits_absent_fields() {
        let entry = FileEntry::new("a.txt", "/x/a.txt", 10);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"name":"a.txt","path":"/x/a.txt","size":10}"#);
    }
}
