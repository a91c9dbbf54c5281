// Copyright 2026 Analytics Core Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The user-facing seekable input stream.
//!
//! `Stream` presents a random-access interface to callers while applying
//! the unified prefetch/cache policy, delegating all object-storage work
//! to a [`SeekableByteChannel`]. It is not thread-safe for concurrent
//! read/seek on the same instance — every mutating operation requires
//! `&mut self`, which the borrow checker already enforces for us.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::allocator::BufferAllocator;
use crate::channel::SeekableByteChannel;
use crate::client::StorageClient;
use crate::error::{Error, Result};
use crate::metadata::ItemMetadata;
use crate::options::ReadOptions;
use crate::pool::WorkerPool;
use crate::range::ObjectRange;

/// A seekable, random-access view onto one object, with footer prefetch /
/// small-object caching applied transparently.
pub struct Stream {
    client: Arc<dyn StorageClient>,
    metadata: ItemMetadata,
    options: Arc<ReadOptions>,
    pool: Arc<WorkerPool>,
    channel: SeekableByteChannel,
    position: i64,
    closed: bool,
    file_size: i64,
    prefetch_size: i64,
    prefetch_buffer: Option<Bytes>,
}

impl Stream {
    pub fn new(
        client: Arc<dyn StorageClient>,
        metadata: ItemMetadata,
        options: Arc<ReadOptions>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        let file_size = metadata.size();
        let prefetch_size = options.effective_prefetch_size(file_size);
        let channel = SeekableByteChannel::new(client.clone(), metadata.clone(), options.clone(), pool.clone());
        Self {
            client,
            metadata,
            options,
            pool,
            channel,
            position: 0,
            closed: false,
            file_size,
            prefetch_size,
            prefetch_buffer: None,
        }
    }

    /// Current logical offset. Never fails.
    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn file_size(&self) -> i64 {
        self.file_size
    }

    fn require_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        Ok(())
    }

    /// Updates the logical position and the channel's position. Does not
    /// touch the prefetch buffer.
    pub async fn seek(&mut self, pos: i64) -> Result<()> {
        self.require_open()?;
        if pos < 0 {
            return Err(Error::InvalidArgument(format!("negative seek position {pos}")));
        }
        self.channel.seek(pos).await?;
        self.position = pos;
        Ok(())
    }

    /// Reads a single byte; `None` signals end of stream.
    pub async fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        let n = self.read(&mut buf, 0, 1).await?;
        Ok((n > 0).then_some(buf[0]))
    }

    /// Reads up to `length` bytes into `buffer[offset..offset+length]`,
    /// applying the prefetch/cache policy. Returns the number of bytes
    /// actually read; `0` means end of stream.
    pub async fn read(&mut self, buffer: &mut [u8], offset: usize, length: usize) -> Result<usize> {
        self.require_open()?;
        if offset.checked_add(length).map_or(true, |end| end > buffer.len()) {
            return Err(Error::InvalidArgument(format!(
                "offset {offset} + length {length} exceeds buffer length {}",
                buffer.len()
            )));
        }
        if length == 0 {
            return Ok(0);
        }

        if self.prefetch_size > 0
            && self.prefetch_buffer.is_none()
            && self.position >= self.file_size - self.prefetch_size
        {
            if let Err(e) = self.populate_cache().await {
                log::warn!("prefetch cache populate failed, falling back to a channel read: {e}");
            }
        }

        let cache_start = self.file_size - self.prefetch_size;
        if let Some(cache) = self.prefetch_buffer.clone() {
            if self.position >= cache_start {
                let cache_offset = (self.position - cache_start) as usize;
                let remaining = cache.len().saturating_sub(cache_offset);
                let n = length.min(remaining);
                buffer[offset..offset + n].copy_from_slice(&cache[cache_offset..cache_offset + n]);
                self.position += n as i64;
                return Ok(n);
            }
        }

        debug_assert_eq!(
            self.channel.position(),
            self.position,
            "channel position must equal stream position before a delegated read"
        );
        let n = self.channel.read(&mut buffer[offset..offset + length]).await?;
        self.position += n as i64;
        Ok(n)
    }

    /// Saves the current position, seeks the channel to the footer region,
    /// reads it in full, and restores the saved position before returning
    /// — on success or failure. Never propagates; callers treat a failure
    /// as "no cache, fall back to a normal read".
    async fn populate_cache(&mut self) -> Result<()> {
        let saved_position = self.position;
        let cache_start = self.file_size - self.prefetch_size;

        let populate = async {
            self.channel
                .seek(cache_start)
                .await
                .map_err(|e| Error::CachePopulateFailed(e.to_string()))?;

            let mut buf = BytesMut::zeroed(self.prefetch_size as usize);
            let mut filled = 0usize;
            while filled < buf.len() {
                let n = self
                    .channel
                    .read(&mut buf[filled..])
                    .await
                    .map_err(|e| Error::CachePopulateFailed(e.to_string()))?;
                if n == 0 {
                    return Err(Error::CachePopulateFailed(format!(
                        "premature end of stream after {filled} of {} bytes",
                        buf.len()
                    )));
                }
                filled += n;
            }
            Ok(buf.freeze())
        }
        .await;

        // Always restore the saved position, regardless of outcome.
        self.channel
            .seek(saved_position)
            .await
            .map_err(|e| Error::CachePopulateFailed(e.to_string()))?;

        let buf = populate?;
        self.prefetch_buffer = Some(buf);
        Ok(())
    }

    /// Opens a *new* channel bound to the same object+generation, seeks to
    /// `position`, and reads exactly `length` bytes. Does not mutate this
    /// stream's logical position. Always closes the transient channel on
    /// exit, even on error.
    pub async fn read_fully(
        &self,
        position: i64,
        buffer: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<()> {
        self.require_open()?;
        let mut channel = self.new_transient_channel();

        let result = async {
            channel.seek(position).await?;
            let mut filled = 0usize;
            while filled < length {
                let n = channel.read(&mut buffer[offset + filled..offset + length]).await?;
                if n == 0 {
                    return Err(Error::EndOfStream {
                        requested: length,
                        available: filled,
                    });
                }
                filled += n;
            }
            Ok(())
        }
        .await;

        channel.close().await?;
        result
    }

    /// Opens a new channel, seeks to `max(0, file_size - length)`, and
    /// reads up to `length` bytes into `buffer[offset..offset+length]`.
    /// Does not mutate the logical position.
    pub async fn read_tail(&self, buffer: &mut [u8], offset: usize, length: usize) -> Result<usize> {
        self.require_open()?;
        let start = (self.file_size - length as i64).max(0);
        let mut channel = self.new_transient_channel();

        let result = async {
            channel.seek(start).await?;
            let mut filled = 0usize;
            while filled < length {
                let n = channel.read(&mut buffer[offset + filled..offset + length]).await?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            Ok(filled)
        }
        .await;

        channel.close().await?;
        result
    }

    /// Serves every range from the prefetch buffer when it covers the whole
    /// object (small-object cache); otherwise delegates to the channel's
    /// vectored read. Returns once every range has either been served from
    /// cache or submitted to the worker pool.
    pub fn read_vectored(&self, ranges: Vec<ObjectRange>, allocator: Arc<dyn BufferAllocator>) -> Result<()> {
        if self.closed {
            for range in ranges {
                range.complete(Err(Error::AlreadyClosed));
            }
            return Err(Error::AlreadyClosed);
        }

        if self.prefetch_size == self.file_size {
            if let Some(cache) = self.prefetch_buffer.clone() {
                for range in ranges {
                    let start = range.offset();
                    let len = range.length() as i64;
                    if start < 0 || start + len > cache.len() as i64 {
                        let available = (cache.len() as i64 - start).max(0) as usize;
                        range.complete(Err(Error::EndOfStream {
                            requested: len as usize,
                            available,
                        }));
                    } else {
                        range.complete(Ok(cache.slice(start as usize..(start + len) as usize)));
                    }
                }
                return Ok(());
            }
        }

        self.channel.read_vectored(ranges, allocator)
    }

    /// Idempotent; closes the underlying channel.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.channel.close().await
    }

    fn new_transient_channel(&self) -> SeekableByteChannel {
        SeekableByteChannel::new(
            self.client.clone(),
            self.metadata.clone(),
            self.options.clone(),
            self.pool.clone(),
        )
    }
}
