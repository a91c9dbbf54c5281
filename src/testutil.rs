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

//! An in-memory fake of the [`StorageClient`]/[`ByteStream`] collaborators,
//! used by unit tests across the crate so every module can be exercised
//! without a network dependency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;

use crate::client::{ByteStream, GetOptions, StorageClient};
use crate::error::{Error, Result};
use crate::metadata::{ItemId, ItemMetadata};

/// Deterministically-seeded pseudo-random content, used by round-trip tests
/// that need realistic (non-repeating) bytes rather than a fixed fixture.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}

pub struct FakeStorageClient {
    objects: HashMap<(String, String), Bytes>,
    generation: i64,
    open_count: AtomicUsize,
    closed: AtomicI64,
}

impl FakeStorageClient {
    pub fn with_object(bucket: &str, object: &str, content: &[u8]) -> Self {
        let mut objects = HashMap::new();
        objects.insert(
            (bucket.to_string(), object.to_string()),
            Bytes::copy_from_slice(content),
        );
        Self {
            objects,
            generation: 1,
            open_count: AtomicUsize::new(0),
            closed: AtomicI64::new(0),
        }
    }

    /// Number of times `open_read_stream` has been called — used to assert
    /// that a prefetch cache hit does not touch the storage client.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> i64 {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for FakeStorageClient {
    async fn get_metadata(&self, bucket: &str, object: &str, _fields: &[&str]) -> Result<ItemMetadata> {
        let content = self
            .objects
            .get(&(bucket.to_string(), object.to_string()))
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{object}")))?;
        Ok(ItemMetadata::new(
            ItemId::new(bucket, Some(object.to_string())),
            content.len() as i64,
            self.generation,
            None,
        )
        .unwrap())
    }

    async fn open_read_stream(
        &self,
        bucket: &str,
        object: &str,
        generation: i64,
        _options: &GetOptions,
    ) -> Result<Box<dyn ByteStream>> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        if generation != self.generation {
            return Err(Error::NotFound(format!(
                "{bucket}/{object}@{generation} (current generation is {})",
                self.generation
            )));
        }
        let content = self
            .objects
            .get(&(bucket.to_string(), object.to_string()))
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{object}")))?
            .clone();
        Ok(Box::new(FakeByteStream {
            content,
            position: 0,
            closed: false,
        }))
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeByteStream {
    content: Bytes,
    position: i64,
    closed: bool,
}

#[async_trait]
impl ByteStream for FakeByteStream {
    fn position(&self) -> i64 {
        self.position
    }

    async fn seek(&mut self, pos: i64) -> Result<()> {
        let size = self.content.len() as i64;
        if pos < 0 || pos > size {
            return Err(Error::InvalidOffset { offset: pos, size });
        }
        self.position = pos;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        let start = self.position as usize;
        if start >= self.content.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.content.len() - start);
        buf[..n].copy_from_slice(&self.content[start..start + n]);
        self.position += n as i64;
        Ok(n)
    }

    fn size(&self) -> i64 {
        self.content.len() as i64
    }

    fn is_open(&self) -> bool {
        !self.closed
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
