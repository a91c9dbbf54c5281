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

//! Collaborator contracts. Everything in this module is a trait: the
//! concrete HTTP/gRPC wire client, credential discovery, and the bytes that
//! actually travel over the network are out of scope for this crate. The
//! core depends only on these shapes.

use async_trait::async_trait;

use crate::error::Result;
use crate::metadata::ItemMetadata;
use crate::options::ReadOptions;

/// Per-GET options that flow from a [`ReadOptions`] down to an individual
/// storage client call: requester-pays project id and a per-object
/// decryption key.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub project_id: Option<String>,
    pub decryption_key: Option<String>,
}

impl From<&ReadOptions> for GetOptions {
    fn from(opts: &ReadOptions) -> Self {
        Self {
            project_id: opts.project_id.clone(),
            decryption_key: opts.decryption_key.clone(),
        }
    }
}

/// A seekable byte stream pinned to one object generation. Not safe to use
/// concurrently from more than one task — the channel and stream both open
/// a fresh `ByteStream` whenever they need a second, independent cursor.
#[async_trait]
pub trait ByteStream: Send {
    /// Current read position.
    fn position(&self) -> i64;

    /// Seeks to an absolute position. Implementations should reject
    /// `pos < 0` or `pos > size()`.
    async fn seek(&mut self, pos: i64) -> Result<()>;

    /// Reads into `buf`, returning the number of bytes read. `Ok(0)` signals
    /// end of stream and MUST NOT advance the position.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Total object size in bytes.
    fn size(&self) -> i64;

    fn is_open(&self) -> bool;

    /// Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// The storage-client collaborator: resolves metadata and opens byte
/// streams pinned at a specific generation. Must be `Send + Sync` since the
/// facade shares one instance across every stream and worker-pool task it
/// spawns.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Requests exactly the named fields (at minimum `size` and
    /// `generation`); callers that need only those two should not pay for a
    /// full metadata round trip.
    async fn get_metadata(
        &self,
        bucket: &str,
        object: &str,
        fields: &[&str],
    ) -> Result<ItemMetadata>;

    /// Opens a fresh, independent byte stream against `object` at exactly
    /// `generation`.
    async fn open_read_stream(
        &self,
        bucket: &str,
        object: &str,
        generation: i64,
        options: &GetOptions,
    ) -> Result<Box<dyn ByteStream>>;

    /// Idempotent.
    async fn close(&self) -> Result<()>;
}
