//! Paginated catalogue of file entries.
//!
//! A [`Manifest`] is one page: aggregate metadata (namespace, page index, entry count, total size),
//! the page's entries, and the optional graphsplit correlation found next to it. Producers build a
//! page in memory with [`Manifest::add`] and persist it with [`Manifest::write_to`]; consumers open
//! it with [`Manifest::read`] and stream entries with [`Manifest::read_entries`].
//!
//! `write_to` writes `metadata.json` and `entries.csv` as two separate file writes. A crash between
//! them leaves a page whose metadata disagrees with its entries; nothing detects or repairs that.

pub mod layout;
pub mod metadata;
pub mod reader;
pub mod writer;

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ManifestConfig,
    errors::ManifestError,
    internal::{
        entry::FileEntry,
        graphsplit::{GRAPHSPLIT_MANIFEST_FILE_NAME, GraphsplitManifest},
        manifest::{
            layout::{ENTRIES_FILE_NAME, page_dir, page_id},
            metadata::{PageMetadata, read_metadata, render_metadata},
            reader::{EntryStream, stream_entries},
            writer::{validate_entry, write_entries, write_metadata},
        },
    },
};

/// Entries and the totals derived from them, kept under one lock so they never disagree.
#[derive(Debug, Default)]
struct PageState {
    entries: Vec<FileEntry>,
    count: usize,
    size: u64,
}

impl PageState {
    fn push(&mut self, entry: FileEntry) {
        self.size += entry.size;
        self.count += 1;
        self.entries.push(entry);
    }
}

#[derive(Debug)]
pub struct Manifest {
    namespace: String,
    index: u32,
    path: PathBuf,
    entries_path: Option<PathBuf>,
    graphsplit: GraphsplitManifest,
    config: ManifestConfig,
    state: RwLock<PageState>,
}

impl Manifest {
    /// Create an empty, in-memory page.
    pub fn new(namespace: impl Into<String>, index: u32) -> Self {
        Self {
            namespace: namespace.into(),
            index,
            path: PathBuf::new(),
            entries_path: None,
            graphsplit: GraphsplitManifest::default(),
            config: ManifestConfig::default(),
            state: RwLock::new(PageState::default()),
        }
    }

    pub fn with_config(mut self, config: ManifestConfig) -> Self {
        self.config = config;
        self
    }

    /// Open page `index` under the shard root `src`.
    pub async fn read_with_index(src: impl AsRef<Path>, index: u32) -> Result<Self, ManifestError> {
        Self::read(page_dir(src, index)).await
    }

    /// Open the page directory `src`. Metadata and graphsplit data are loaded now; entries stay on
    /// disk until streamed.
    pub async fn read(src: impl AsRef<Path>) -> Result<Self, ManifestError> {
        Self::read_with_config(src, ManifestConfig::default()).await
    }

    pub async fn read_with_config(
        src: impl AsRef<Path>,
        config: ManifestConfig,
    ) -> Result<Self, ManifestError> {
        let src = src.as_ref().to_path_buf();
        tokio::fs::metadata(&src)
            .await
            .map_err(|e| ManifestError::from_io(&src, e))?;

        let graphsplit_path = src.join(GRAPHSPLIT_MANIFEST_FILE_NAME);
        let graphsplit_config = config.clone();
        let graphsplit = tokio::task::spawn_blocking(move || {
            GraphsplitManifest::open_with_config(graphsplit_path, &graphsplit_config)
        })
        .await
        .map_err(|e| ManifestError::TaskFailed(e.to_string()))?;
        let graphsplit = match graphsplit {
            Ok(graphsplit) => graphsplit,
            Err(e) if e.is_not_found() => GraphsplitManifest::default(),
            Err(e) => return Err(e),
        };

        let metadata = read_metadata(&src).await?;
        tracing::debug!(
            "opened manifest page {} ({} entries, {} graphsplit rows)",
            src.display(),
            metadata.entries,
            graphsplit.len()
        );

        Ok(Self {
            namespace: metadata.namespace,
            index: metadata.index,
            entries_path: Some(src.join(ENTRIES_FILE_NAME)),
            path: src,
            graphsplit,
            config,
            state: RwLock::new(PageState {
                entries: Vec::new(),
                count: metadata.entries,
                size: metadata.size,
            }),
        })
    }

    /// Append entries to the page, updating its totals.
    pub async fn add(&self, entries: impl IntoIterator<Item = FileEntry>) {
        let mut state = self.state.write().await;
        for entry in entries {
            state.push(entry);
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Directory name of this page, e.g. `03` or `42`.
    pub fn id(&self) -> String {
        page_id(self.index)
    }

    /// Directory the page was read from; empty for pages built in memory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn graphsplit(&self) -> &GraphsplitManifest {
        &self.graphsplit
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.count
    }

    pub async fn size(&self) -> u64 {
        self.state.read().await.size
    }

    /// Names of the entries currently held in memory.
    pub async fn entry_names(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub async fn metadata(&self) -> PageMetadata {
        let state = self.state.read().await;
        PageMetadata {
            entries: state.count,
            index: self.index,
            namespace: self.namespace.clone(),
            size: state.size,
        }
    }

    /// The `metadata.json` document [`Manifest::write_to`] would write.
    pub async fn to_json(&self) -> Result<String, ManifestError> {
        render_metadata(&self.metadata().await, &self.graphsplit)
    }

    /// Stream the page's entries from disk in file order. The stream ends at end of file, on the
    /// first malformed row, or once `cancel` fires.
    pub async fn read_entries(&self, cancel: CancellationToken) -> Result<EntryStream, ManifestError> {
        let path = self
            .entries_path
            .clone()
            .ok_or_else(|| ManifestError::Unpersisted(self.id()))?;
        stream_entries(path, self.config.entry_channel_capacity, cancel).await
    }

    /// Load every entry from disk into the page, replacing whatever it held, and return them.
    ///
    /// The page is only replaced once the whole file has been read. If a row is malformed the
    /// error is returned and the page keeps its previous entries and totals.
    pub async fn read_all_entries(&self) -> Result<Vec<FileEntry>, ManifestError> {
        let mut state = self.state.write().await;

        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();

        let mut stream = self.read_entries(cancel).await?;
        let mut loaded = PageState::default();
        while let Some(entry) = stream.next().await {
            loaded.push(entry);
        }
        stream.finish().await?;

        *state = loaded;
        Ok(state.entries.clone())
    }

    /// Write the page under the shard root `dst`, creating its directory if needed. Entries are
    /// sorted by modification time in place before they are written.
    ///
    /// Every entry is checked first; an entry that cannot be encoded fails with
    /// [`ManifestError::InvalidEntry`] before anything is created on disk.
    pub async fn write_to(&self, dst: impl AsRef<Path>) -> Result<(), ManifestError> {
        let mut state = self.state.write().await;
        state.entries.iter().try_for_each(validate_entry)?;

        let dir = page_dir(dst, self.index);
        tokio::fs::create_dir_all(&dir).await?;

        let metadata = PageMetadata {
            entries: state.count,
            index: self.index,
            namespace: self.namespace.clone(),
            size: state.size,
        };
        write_metadata(&dir, &render_metadata(&metadata, &self.graphsplit)?).await?;
        write_entries(&dir, &mut state.entries).await?;

        tracing::debug!(
            "wrote manifest page {} ({} entries, {} bytes)",
            dir.display(),
            metadata.entries,
            metadata.size
        );
        Ok(())
    }
}
