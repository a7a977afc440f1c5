//! On-disk layout of a manifest page:
//!
//! ```text
//! <root>/<page id>/metadata.json
//! <root>/<page id>/entries.csv
//! <root>/<page id>/manifest.csv   (optional graphsplit correlation)
//! ```

use std::path::{Path, PathBuf};

pub const METADATA_FILE_NAME: &str = "metadata.json";
pub const ENTRIES_FILE_NAME: &str = "entries.csv";
pub const ENTRIES_CSV_FIELDS: &str = "name,path,size,sha256,mtime";

/// Directory name of page `index`. Single digits are zero-padded to two characters, everything
/// else is plain decimal, so page 10 is `10` and page 137 is `137`. Existing shards depend on this
/// exact rule.
pub fn page_id(index: u32) -> String {
    if index < 10 {
        format!("0{index}")
    } else {
        index.to_string()
    }
}

/// Page directory of `index` under `root`.
pub fn page_dir(root: impl AsRef<Path>, index: u32) -> PathBuf {
    root.as_ref().join(page_id(index))
}
