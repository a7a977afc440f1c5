//! Car-Manifest: a metadata catalogue for batches of files packed into content-addressable archive
//! shards.
//!
//! Goals
//! - Describe every file of a shard (name, path, size, SHA-256, modification time) without ever
//!   loading a whole page of entries into memory.
//! - Keep the on-disk CSV/JSON page format stable so pages written by older tooling still read.
//! - Correlate files with the payload/piece CIDs produced by a graph-splitting step.
//!
//! Core Capabilities
//! - Pages: `Manifest::new` + `add` + `write_to` on the producer side, `Manifest::read` +
//!   `read_entries` on the consumer side.
//! - Streaming: `read_entries` spawns a reader task and returns an `EntryStream` scoped to a
//!   `CancellationToken`; `read_all_entries` drains it into memory.
//! - Graphsplit: `GraphsplitManifest::open` parses `manifest.csv`, resolving CIDs to multihashes.
//!
//! Modules
//! - `internal::manifest`: page layout, metadata document, entry reader and writer.
//! - `internal::graphsplit`: graphsplit manifest reader.
//! - `internal::entry`: the `FileEntry` record and timestamp encoding.
//! - `content_id`: CID parsing.
//! - `errors`: unified error type.
//! - `hash`: file digests.
//! - `config`: tunables for scanning and streaming.
//! - `utils`: pooled scan buffers and a bounded line scanner.
//!
//! Page Layout
//! - `<root>/<page id>/metadata.json`, `<root>/<page id>/entries.csv` and an optional
//!   `<root>/<page id>/manifest.csv`; page ids are `00`..`09`, then `10`, `11`, ...

pub mod config;
pub mod content_id;
pub mod errors;
pub mod hash;
pub mod internal;
pub mod utils;

pub use config::ManifestConfig;
pub use content_id::ContentId;
pub use errors::ManifestError;
pub use internal::{
    entry::FileEntry,
    graphsplit::{GraphsplitEntry, GraphsplitManifest},
    manifest::{Manifest, metadata::PageMetadata, reader::EntryStream},
};

#[cfg(test)]
mod tests {
    use tracing_subscriber::util::SubscriberInitExt;

    /// Debug-level subscriber for tests; safe to call from every test.
    pub(crate) fn init_logger() {
        let _ = tracing_subscriber::fmt::Subscriber::builder()
            .with_target(false)
            .without_time()
            .with_level(true)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
            .try_init(); // avoid multi-init
    }
}
