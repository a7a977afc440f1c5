//! Lazy reader for `entries.csv`.
//!
//! A spawned task scans the file line by line and hands each decoded [`FileEntry`] to the consumer
//! over a bounded channel, so a page is never loaded wholesale. The task stops at end of file, on
//! the first malformed row, when the consumer goes away, or when its cancellation token fires;
//! the file handle is released in every case.

use std::{
    path::PathBuf,
    pin::Pin,
    task::{Context, Poll},
};

use futures_util::Stream;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    errors::ManifestError,
    hash::FileHash,
    internal::entry::{FileEntry, parse_mtime},
};

/// Stream of entries produced by [`Manifest::read_entries`](super::Manifest::read_entries).
///
/// A stream that ends early is not necessarily complete: call [`EntryStream::finish`] to learn
/// whether the producer stopped because of an error.
pub struct EntryStream {
    inner: ReceiverStream<FileEntry>,
    producer: JoinHandle<Result<(), ManifestError>>,
    _cancel_on_drop: DropGuard,
}

impl EntryStream {
    /// Release the receiving side, wait for the producer and return its terminal status.
    pub async fn finish(self) -> Result<(), ManifestError> {
        let EntryStream {
            inner,
            producer,
            _cancel_on_drop,
        } = self;
        drop(inner);
        producer
            .await
            .map_err(|e| ManifestError::TaskFailed(e.to_string()))?
    }
}

impl Stream for EntryStream {
    type Item = FileEntry;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Open `path` and start streaming its entries. Opening happens before the task is spawned so a
/// missing file is reported to the caller directly.
pub(crate) async fn stream_entries(
    path: PathBuf,
    capacity: usize,
    cancel: CancellationToken,
) -> Result<EntryStream, ManifestError> {
    let file = File::open(&path)
        .await
        .map_err(|e| ManifestError::from_io(&path, e))?;

    let (tx, rx) = mpsc::channel(capacity.max(1));
    let token = cancel.child_token();
    let producer_token = token.clone();
    let producer = tokio::spawn(async move {
        let result = produce(file, tx, producer_token).await;
        if let Err(e) = &result {
            tracing::error!("manifest: reading {} stopped early: {}", path.display(), e);
        }
        result
    });

    Ok(EntryStream {
        inner: ReceiverStream::new(rx),
        producer,
        _cancel_on_drop: token.drop_guard(),
    })
}

async fn produce(
    file: File,
    tx: mpsc::Sender<FileEntry>,
    cancel: CancellationToken,
) -> Result<(), ManifestError> {
    let mut lines = BufReader::new(file).lines();

    // header row
    if lines.next_line().await?.is_none() {
        return Ok(());
    }

    let mut line_no = 1;
    loop {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        line_no += 1;
        if line.trim_end_matches('\r').is_empty() {
            continue;
        }
        let entry = parse_entry_line(&line, line_no)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            sent = tx.send(entry) => {
                if sent.is_err() {
                    // consumer dropped the stream
                    return Ok(());
                }
            }
        }
    }
}

/// Decode one `name,path,size,sha256,mtime` row.
pub fn parse_entry_line(line: &str, line_no: usize) -> Result<FileEntry, ManifestError> {
    let line = line.trim_end_matches('\r');
    let attrs: Vec<&str> = line.split(',').collect();
    if attrs.len() != 5 {
        return Err(ManifestError::malformed_entry(
            line_no,
            format!("expected 5 fields, found {}", attrs.len()),
        ));
    }

    let size = attrs[2].parse::<u64>().map_err(|e| {
        ManifestError::malformed_entry(line_no, format!("invalid size `{}`: {e}", attrs[2]))
    })?;

    let hash = (!attrs[3].is_empty()).then(|| FileHash::sha256(attrs[3]));

    let modified_time = if attrs[4].is_empty() {
        None
    } else {
        Some(parse_mtime(attrs[4]).map_err(|e| {
            ManifestError::malformed_entry(line_no, format!("invalid mtime `{}`: {e}", attrs[4]))
        })?)
    };

    Ok(FileEntry {
        name: attrs[0].to_string(),
        path: attrs[1].to_string(),
        size,
        hash,
        modified_time,
    })
}
