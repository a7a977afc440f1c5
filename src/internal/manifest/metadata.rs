//! Page-level aggregate metadata and the `metadata.json` document it is stored in.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::ManifestError,
    internal::{graphsplit::GraphsplitManifest, manifest::layout::METADATA_FILE_NAME},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    /// Number of entries in the page.
    pub entries: usize,
    /// Zero-based page number.
    #[serde(rename = "page")]
    pub index: u32,
    pub namespace: String,
    /// Sum of entry sizes in bytes.
    pub size: u64,
}

impl PageMetadata {
    pub fn new(namespace: impl Into<String>, index: u32) -> Self {
        Self {
            namespace: namespace.into(),
            index,
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct PageDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    graphsplit: Option<&'a GraphsplitManifest>,
    metadata: &'a PageMetadata,
}

/// Render the `metadata.json` document. The graphsplit section is only present when it has
/// entries.
pub(crate) fn render_metadata(
    metadata: &PageMetadata,
    graphsplit: &GraphsplitManifest,
) -> Result<String, ManifestError> {
    let document = PageDocument {
        graphsplit: (!graphsplit.is_empty()).then_some(graphsplit),
        metadata,
    };
    serde_json::to_string_pretty(&document).map_err(|e| ManifestError::InvalidMetadata(e.to_string()))
}

/// Decode a `metadata.json` document. Both `{"metadata": {...}}` and a bare metadata object are
/// accepted; older pages were written without the wrapper.
pub(crate) fn parse_metadata(data: &[u8]) -> Result<PageMetadata, ManifestError> {
    let document: Value =
        serde_json::from_slice(data).map_err(|e| ManifestError::InvalidMetadata(e.to_string()))?;
    let metadata = match document.get("metadata") {
        Some(nested) => PageMetadata::deserialize(nested),
        None => PageMetadata::deserialize(&document),
    };
    metadata.map_err(|e| ManifestError::InvalidMetadata(e.to_string()))
}

pub(crate) async fn read_metadata(dir: &Path) -> Result<PageMetadata, ManifestError> {
    let path = dir.join(METADATA_FILE_NAME);
    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| ManifestError::from_io(&path, e))?;
    parse_metadata(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::graphsplit::GraphsplitEntry;

    fn sample() -> PageMetadata {
        PageMetadata {
            entries: 2,
            index: 7,
            namespace: "tenant-a".to_string(),
            size: 30,
        }
    }

    #[test]
    fn test_render_without_graphsplit() {
        let text = render_metadata(&sample(), &GraphsplitManifest::default()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert!(value.get("graphsplit").is_none());
        assert_eq!(value["metadata"]["page"], 7);
        assert_eq!(value["metadata"]["entries"], 2);
        assert_eq!(value["metadata"]["size"], 30);
        assert_eq!(value["metadata"]["namespace"], "tenant-a");
        assert!(text.contains('\n'), "document is pretty printed");
    }

    #[test]
    fn test_render_with_graphsplit() {
        let graphsplit = GraphsplitManifest {
            entries: vec![GraphsplitEntry {
                file_name: "a.car".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = render_metadata(&sample(), &graphsplit).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["graphsplit"]["Entries"][0]["file_name"], "a.car");
    }

    #[test]
    fn test_parse_nested_and_flat() {
        let nested = br#"{"metadata": {"namespace": "tenant-a", "page": 7, "entries": 2, "size": 30}}"#;
        assert_eq!(parse_metadata(nested).unwrap(), sample());

        let flat = br#"{"namespace": "tenant-a", "page": 7, "entries": 2, "size": 30}"#;
        assert_eq!(parse_metadata(flat).unwrap(), sample());
    }

    #[test]
    fn test_parse_rejects_broken_json() {
        assert!(matches!(
            parse_metadata(b"{\"metadata\": "),
            Err(ManifestError::InvalidMetadata(_))
        ));
        assert!(matches!(
            parse_metadata(br#"{"metadata": {"page": "seven"}}"#),
            Err(ManifestError::InvalidMetadata(_))
        ));
    }
}
