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

//! The seekable byte channel: adapts a lazily opened storage-client byte
//! stream into position/seek/read/size, plus a vectored-read primitive that
//! fans combined ranges out onto the shared worker pool.
//!
//! With the `layers-tracing` feature enabled, `read_vectored` emits a trace
//! span covering merge and task submission.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::allocator::BufferAllocator;
use crate::client::{ByteStream, GetOptions, StorageClient};
use crate::error::{Error, Result};
use crate::metadata::ItemMetadata;
use crate::options::ReadOptions;
use crate::pool::WorkerPool;
use crate::range::{merge, ObjectRange};

/// A seekable, reopenable view onto one object generation.
///
/// The channel's *main* stream (used by [`SeekableByteChannel::read`]) is
/// opened lazily on first use and is not safe to share across tasks.
/// [`SeekableByteChannel::read_vectored`] never touches it: every combined
/// range gets its own freshly opened stream, because the underlying byte
/// stream is not re-entrant for concurrent reads.
pub struct SeekableByteChannel {
    client: Arc<dyn StorageClient>,
    metadata: ItemMetadata,
    options: Arc<ReadOptions>,
    pool: Arc<WorkerPool>,
    inner: Option<Box<dyn ByteStream>>,
    position: i64,
    closed: bool,
}

impl SeekableByteChannel {
    pub fn new(
        client: Arc<dyn StorageClient>,
        metadata: ItemMetadata,
        options: Arc<ReadOptions>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            client,
            metadata,
            options,
            pool,
            inner: None,
            position: 0,
            closed: false,
        }
    }

    fn get_options(&self) -> GetOptions {
        GetOptions::from(self.options.as_ref())
    }

    fn require_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        Ok(())
    }

    async fn ensure_stream(&mut self) -> Result<&mut Box<dyn ByteStream>> {
        self.require_open()?;
        if self.inner.is_none() {
            let id = self.metadata.id();
            let mut stream = self
                .client
                .open_read_stream(
                    id.bucket(),
                    id.object().unwrap_or_default(),
                    self.metadata.generation(),
                    &self.get_options(),
                )
                .await?;
            if self.position != 0 {
                stream.seek(self.position).await?;
            }
            self.inner = Some(stream);
        }
        Ok(self.inner.as_mut().unwrap())
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn size(&self) -> i64 {
        self.metadata.size()
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Fails with [`Error::InvalidOffset`] when `pos < 0` or `pos > size`.
    /// Seeking exactly to `size` is legal; the next read observes EOF (see
    /// the design notes on the inclusive seek-bounds decision).
    pub async fn seek(&mut self, pos: i64) -> Result<()> {
        self.require_open()?;
        let size = self.size();
        if pos < 0 || pos > size {
            return Err(Error::InvalidOffset { offset: pos, size });
        }
        if let Some(stream) = &mut self.inner {
            stream.seek(pos).await?;
        }
        self.position = pos;
        Ok(())
    }

    /// Advances `position` by the bytes actually read. Returns `Ok(0)` at
    /// EOF without advancing position.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.require_open()?;
        let stream = self.ensure_stream().await?;
        let n = stream.read(buf).await?;
        self.position += n as i64;
        Ok(n)
    }

    /// Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(mut stream) = self.inner.take() {
            stream.close().await?;
        }
        Ok(())
    }

    /// Merges `ranges` and dispatches one worker-pool task per combined
    /// range. Returns once every task has been submitted; completion is
    /// asynchronous through each [`ObjectRange`]'s paired receiver.
    ///
    /// A task that fails (seek, allocate, read, short read) completes every
    /// one of its not-yet-completed underlying futures with
    /// [`Error::VectoredTaskFailed`] and logs — it never propagates to the
    /// caller of `read_vectored` itself.
    #[cfg_attr(feature = "layers-tracing", tracing::instrument(level = "trace", skip_all))]
    pub fn read_vectored(&self, ranges: Vec<ObjectRange>, allocator: Arc<dyn BufferAllocator>) -> Result<()> {
        if self.closed {
            for combined in merge(ranges, self.options.merge_gap_max_bytes, self.options.merged_size_max_bytes) {
                combined.fail_all("channel is closed");
            }
            return Err(Error::AlreadyClosed);
        }

        let combined_ranges = merge(
            ranges,
            self.options.merge_gap_max_bytes,
            self.options.merged_size_max_bytes,
        );

        let id = self.metadata.id();
        let bucket = id.bucket().to_string();
        let object = id.object().unwrap_or_default().to_string();
        let generation = self.metadata.generation();
        let get_options = self.get_options();

        for combined in combined_ranges {
            let client = self.client.clone();
            let bucket = bucket.clone();
            let object = object.clone();
            let get_options = get_options.clone();
            let allocator = allocator.clone();

            self.pool.spawn(async move {
                run_combined_read(client, bucket, object, generation, get_options, allocator, combined).await;
            });
        }

        Ok(())
    }
}

async fn run_combined_read(
    client: Arc<dyn StorageClient>,
    bucket: String,
    object: String,
    generation: i64,
    get_options: GetOptions,
    allocator: Arc<dyn BufferAllocator>,
    combined: crate::range::CombinedRange,
) {
    match read_combined_range(
        client,
        &bucket,
        &object,
        generation,
        &get_options,
        allocator,
        combined.offset(),
        combined.length(),
    )
    .await
    {
        Ok(buf) => combined.complete_all(&buf),
        Err(e) => {
            log::warn!("vectored read of {bucket}/{object} [{},{}) failed: {e}", combined.offset(), combined.offset() + combined.length());
            combined.fail_all(e.to_string());
        }
    }
}

async fn read_combined_range(
    client: Arc<dyn StorageClient>,
    bucket: &str,
    object: &str,
    generation: i64,
    get_options: &GetOptions,
    allocator: Arc<dyn BufferAllocator>,
    offset: i64,
    length: i64,
) -> Result<Bytes> {
    let mut stream = client
        .open_read_stream(bucket, object, generation, get_options)
        .await?;
    let result = read_exact_scoped(stream.as_mut(), offset, length, allocator.as_ref()).await;
    // Scoped acquisition: release the transient stream on every exit path.
    stream.close().await?;
    result
}

async fn read_exact_scoped(
    stream: &mut dyn ByteStream,
    offset: i64,
    length: i64,
    allocator: &dyn BufferAllocator,
) -> Result<Bytes> {
    stream.seek(offset).await?;
    let mut buf = allocator.allocate(length as usize);
    let mut filled = 0usize;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(Error::EndOfStream {
                requested: buf.len(),
                available: filled,
            });
        }
        filled += n;
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::DefaultAllocator;
    use crate::metadata::ItemId;
    use crate::testutil::FakeStorageClient;

    fn metadata(size: i64) -> ItemMetadata {
        ItemMetadata::new(ItemId::new("bucket", Some("object".into())), size, 1, None).unwrap()
    }

    fn new_channel(client: Arc<FakeStorageClient>) -> SeekableByteChannel {
        SeekableByteChannel::new(
            client,
            metadata(11),
            Arc::new(ReadOptions::default()),
            Arc::new(WorkerPool::new(4)),
        )
    }

    #[tokio::test]
    async fn seek_then_read_matches_invariant() {
        let client = Arc::new(FakeStorageClient::with_object("bucket", "object", b"hello world"));
        let mut channel = new_channel(client);

        channel.seek(6).await.unwrap();
        assert_eq!(channel.position(), 6);

        let mut buf = [0u8; 5];
        let n = channel.read(&mut buf).await.unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"world");
        assert_eq!(channel.position(), 11);
    }

    #[tokio::test]
    async fn seek_past_end_is_rejected() {
        let client = Arc::new(FakeStorageClient::with_object("bucket", "object", b"hello world"));
        let mut channel = new_channel(client);
        let err = channel.seek(12).await.unwrap_err();
        assert!(matches!(err, Error::InvalidOffset { offset: 12, size: 11 }));
    }

    #[tokio::test]
    async fn seek_to_exact_size_is_legal_and_read_returns_eof() {
        let client = Arc::new(FakeStorageClient::with_object("bucket", "object", b"hello world"));
        let mut channel = new_channel(client);
        channel.seek(11).await.unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(channel.read(&mut buf).await.unwrap(), 0);
        assert_eq!(channel.position(), 11);
    }

    #[tokio::test]
    async fn read_after_close_fails() {
        let client = Arc::new(FakeStorageClient::with_object("bucket", "object", b"hello world"));
        let mut channel = new_channel(client);
        channel.close().await.unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(channel.read(&mut buf).await, Err(Error::AlreadyClosed)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let client = Arc::new(FakeStorageClient::with_object("bucket", "object", b"hello world"));
        let mut channel = new_channel(client);
        channel.close().await.unwrap();
        channel.close().await.unwrap();
    }

    #[tokio::test]
    async fn read_vectored_delivers_disjoint_ranges() {
        let client = Arc::new(FakeStorageClient::with_object(
            "bucket",
            "object",
            b"0123456789abcdef",
        ));
        let channel = new_channel2(client, 16);

        let (r1, rx1) = ObjectRange::new(0, 4);
        let (r2, rx2) = ObjectRange::new(10, 4);
        channel
            .read_vectored(vec![r1, r2], Arc::new(DefaultAllocator))
            .unwrap();

        assert_eq!(&rx1.await.unwrap().unwrap()[..], b"0123");
        assert_eq!(&rx2.await.unwrap().unwrap()[..], b"abcd");
    }

    #[tokio::test]
    async fn read_vectored_on_closed_channel_fails_every_future() {
        let client = Arc::new(FakeStorageClient::with_object("bucket", "object", b"0123456789"));
        let mut channel = new_channel2(client, 10);
        channel.close().await.unwrap();

        let (r1, rx1) = ObjectRange::new(0, 4);
        let err = channel
            .read_vectored(vec![r1], Arc::new(DefaultAllocator))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyClosed));
        assert!(matches!(rx1.await.unwrap(), Err(Error::VectoredTaskFailed(_))));
    }

    #[tokio::test]
    async fn read_vectored_short_object_fails_future_with_end_of_stream_wrapped() {
        let client = Arc::new(FakeStorageClient::with_object("bucket", "object", b"short"));
        let channel = new_channel2(client, 5);

        let (r1, rx1) = ObjectRange::new(0, 20);
        channel
            .read_vectored(vec![r1], Arc::new(DefaultAllocator))
            .unwrap();
        assert!(matches!(rx1.await.unwrap(), Err(Error::VectoredTaskFailed(_))));
    }

    fn new_channel2(client: Arc<FakeStorageClient>, size: i64) -> SeekableByteChannel {
        SeekableByteChannel::new(
            client,
            metadata(size),
            Arc::new(ReadOptions::default()),
            Arc::new(WorkerPool::new(4)),
        )
    }
}
