//! Shared I/O utilities: a pool of growable scan buffers and a line scanner with a hard upper bound
//! on line length, used when many graphsplit manifests are parsed back to back.

use std::{
    io::BufRead,
    ops::{Deref, DerefMut},
    sync::{LazyLock, Mutex},
};

use crate::errors::ManifestError;

/// Buffers larger than this are dropped instead of being returned to the pool.
const POOL_RETAIN_MAX: usize = 16 * 1024 * 1024;
/// Number of idle buffers the pool keeps around.
const POOL_IDLE_MAX: usize = 8;

pub(crate) static TOKEN_BUFFER_POOL: LazyLock<BufferPool> = LazyLock::new(BufferPool::default);

/// Pool of reusable byte buffers.
#[derive(Default, Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Take a buffer with at least `capacity` bytes reserved. It goes back to the pool on drop.
    pub fn get(&self, capacity: usize) -> PooledBuffer<'_> {
        let mut buf = self
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()
            .unwrap_or_default();
        buf.clear();
        buf.reserve(capacity);
        PooledBuffer { pool: self, buf }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > POOL_RETAIN_MAX {
            return;
        }
        buf.clear();
        let mut idle = self
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if idle.len() < POOL_IDLE_MAX {
            idle.push(buf);
        }
    }
}

/// A buffer on loan from a [`BufferPool`].
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}

/// Splits a reader into `\n`-terminated lines (a trailing `\r` is stripped) while refusing any
/// line longer than `max` bytes.
pub struct LineScanner<'a, R> {
    inner: R,
    buf: PooledBuffer<'a>,
    max: usize,
    line: usize,
}

impl<'a, R: BufRead> LineScanner<'a, R> {
    pub fn new(inner: R, buf: PooledBuffer<'a>, max: usize) -> Self {
        Self {
            inner,
            buf,
            max,
            line: 0,
        }
    }

    /// 1-based number of the line most recently returned.
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Next line without its terminator, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<&str>, ManifestError> {
        self.buf.clear();
        let mut seen_any = false;
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                break;
            }
            seen_any = true;
            let (chunk, done) = match memchr::memchr(b'\n', available) {
                Some(pos) => (&available[..pos], pos + 1),
                None => (available, available.len()),
            };
            if self.buf.len() + chunk.len() > self.max {
                return Err(ManifestError::LineTooLong {
                    line: self.line + 1,
                    max: self.max,
                });
            }
            self.buf.extend_from_slice(chunk);
            let found_newline = done > chunk.len();
            self.inner.consume(done);
            if found_newline {
                break;
            }
        }
        if !seen_any {
            return Ok(None);
        }
        self.line += 1;
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        let line = self.line;
        std::str::from_utf8(&self.buf)
            .map(Some)
            .map_err(|e| ManifestError::malformed_graphsplit(line, format!("invalid UTF-8: {e}")))
    }
}
