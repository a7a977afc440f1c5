//! Reader for the companion `manifest.csv` a graph-splitting step leaves next to a page. Each row
//! correlates a file's payload CID with the CID of the piece it was split into:
//!
//! ```text
//! payload_cid,filename,piece_cid,payload_size,piece_size
//! ```
//!
//! The `payload_hash`/`piece_hash` fields are derived from the CID columns; a row that cannot be
//! decoded fails the whole read.

use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    config::ManifestConfig,
    content_id::ContentId,
    errors::ManifestError,
    utils::{LineScanner, TOKEN_BUFFER_POOL},
};

pub const GRAPHSPLIT_MANIFEST_FILE_NAME: &str = "manifest.csv";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphsplitEntry {
    pub file_name: String,
    #[serde(rename = "payload_cid")]
    pub payload_content_id: String,
    pub payload_hash: String,
    pub payload_size: u64,
    #[serde(rename = "piece_cid")]
    pub piece_content_id: String,
    pub piece_hash: String,
    pub piece_size: u64,
}

/// Location of a graphsplit manifest on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub directory: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphsplitManifest {
    #[serde(rename = "File")]
    pub file: ManifestFile,
    #[serde(rename = "Entries")]
    pub entries: Vec<GraphsplitEntry>,
}

impl GraphsplitManifest {
    /// Read a graphsplit manifest from `path`, which is either the CSV file itself or a directory
    /// holding a `manifest.csv`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        Self::open_with_config(path, &ManifestConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: &ManifestConfig,
    ) -> Result<Self, ManifestError> {
        let file = resolve(path.as_ref())?;
        let reader = fs::File::open(&file.path)
            .map_err(|e| ManifestError::from_io(file.path.as_str(), e))?;
        let entries = parse_graphsplit(BufReader::new(reader), config)?;
        tracing::debug!(
            "read {} graphsplit entries from {}",
            entries.len(),
            file.path
        );
        Ok(Self { file, entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn find_by_payload(&self, payload_content_id: &str) -> Option<&GraphsplitEntry> {
        self.entries
            .iter()
            .find(|e| e.payload_content_id == payload_content_id)
    }

    pub fn find_by_file_name(&self, file_name: &str) -> Option<&GraphsplitEntry> {
        self.entries.iter().find(|e| e.file_name == file_name)
    }
}

fn resolve(path: &Path) -> Result<ManifestFile, ManifestError> {
    let trimmed = PathBuf::from(path.to_string_lossy().trim());
    let meta = fs::metadata(&trimmed).map_err(|e| ManifestError::from_io(&trimmed, e))?;

    let file = if meta.is_dir() {
        ManifestFile {
            directory: trimmed.to_string_lossy().into_owned(),
            name: GRAPHSPLIT_MANIFEST_FILE_NAME.to_string(),
            path: trimmed
                .join(GRAPHSPLIT_MANIFEST_FILE_NAME)
                .to_string_lossy()
                .into_owned(),
        }
    } else {
        ManifestFile {
            directory: trimmed
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            name: trimmed
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: trimmed.to_string_lossy().into_owned(),
        }
    };
    Ok(file)
}

/// Parse graphsplit rows from `reader`, skipping the header row.
pub fn parse_graphsplit<R: BufRead>(
    reader: R,
    config: &ManifestConfig,
) -> Result<Vec<GraphsplitEntry>, ManifestError> {
    let buffer = TOKEN_BUFFER_POOL.get(config.scan_buffer_size);
    let mut scanner = LineScanner::new(reader, buffer, config.scan_max_line_size);

    // header row
    if scanner.next_line()?.is_none() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let mut line_no = 1;
    while let Some(line) = scanner.next_line()? {
        line_no += 1;
        if line.is_empty() {
            continue;
        }
        entries.push(parse_row(line, line_no)?);
    }
    Ok(entries)
}

fn parse_row(line: &str, line_no: usize) -> Result<GraphsplitEntry, ManifestError> {
    let attrs: Vec<&str> = line.split(',').collect();
    if attrs.len() < 5 {
        return Err(ManifestError::malformed_graphsplit(
            line_no,
            format!("expected at least 5 fields, found {}", attrs.len()),
        ));
    }

    let payload_cid = ContentId::parse(attrs[0])
        .map_err(|e| ManifestError::malformed_graphsplit(line_no, e.to_string()))?;
    let piece_cid = ContentId::parse(attrs[2])
        .map_err(|e| ManifestError::malformed_graphsplit(line_no, e.to_string()))?;
    let payload_size = parse_size(attrs[3], line_no)?;
    let piece_size = parse_size(attrs[4], line_no)?;

    Ok(GraphsplitEntry {
        file_name: attrs[1].to_string(),
        payload_content_id: attrs[0].to_string(),
        payload_hash: payload_cid.multihash_hex(),
        payload_size,
        piece_content_id: attrs[2].to_string(),
        piece_hash: piece_cid.multihash_hex(),
        piece_size,
    })
}

fn parse_size(field: &str, line_no: usize) -> Result<u64, ManifestError> {
    field
        .parse::<u64>()
        .map_err(|e| ManifestError::malformed_graphsplit(line_no, format!("invalid size `{field}`: {e}")))
}
