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

//! The file-system facade: opens streams given a URI or file info, owns a
//! storage client and a shared worker pool, and shuts the pool down
//! deterministically on close.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::client::StorageClient;
use crate::error::{Error, Result};
use crate::metadata::FileInfo;
use crate::options::ReadOptions;
use crate::pool::WorkerPool;
use crate::stream::Stream;

/// Splits `scheme://bucket[/object]` into `(bucket, object)`. `object` may
/// itself contain slashes.
fn parse_uri(uri: &str, expected_scheme: &str) -> Result<(String, Option<String>)> {
    if uri.is_empty() {
        return Err(Error::InvalidPath("uri is empty".to_string()));
    }
    let (scheme, rest) = uri
        .split_once("://")
        .ok_or_else(|| Error::InvalidPath(format!("missing scheme in `{uri}`")))?;
    if scheme != expected_scheme {
        return Err(Error::InvalidPath(format!(
            "expected scheme `{expected_scheme}` but found `{scheme}` in `{uri}`"
        )));
    }
    if rest.is_empty() {
        return Err(Error::InvalidPath(format!("missing bucket in `{uri}`")));
    }
    let mut parts = rest.splitn(2, '/');
    let bucket = parts.next().unwrap_or_default();
    if bucket.is_empty() {
        return Err(Error::InvalidPath(format!("missing bucket in `{uri}`")));
    }
    let object = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    Ok((bucket.to_string(), object))
}

/// Opens read-accelerated streams against one storage client.
///
/// The worker pool is constructed lazily on first use and shared across
/// every stream this facade opens; `close()` shuts it down, then closes the
/// storage client, deterministically and idempotently.
pub struct FileSystem {
    client: Arc<dyn StorageClient>,
    options: Arc<ReadOptions>,
    scheme: String,
    pool: OnceCell<Arc<WorkerPool>>,
    closed: AtomicBool,
}

impl FileSystem {
    pub fn new(scheme: impl Into<String>, client: Arc<dyn StorageClient>, options: ReadOptions) -> Self {
        Self {
            client,
            options: Arc::new(options),
            scheme: scheme.into(),
            pool: OnceCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    async fn pool(&self) -> Arc<WorkerPool> {
        self.pool
            .get_or_init(|| async { Arc::new(WorkerPool::new(self.options.read_thread_count)) })
            .await
            .clone()
    }

    fn require_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::AlreadyClosed);
        }
        Ok(())
    }

    /// Resolves `uri` and requests exactly the `size` and `generation`
    /// fields from the storage client.
    pub async fn get_file_info(&self, uri: &str) -> Result<FileInfo> {
        self.require_open()?;
        let (bucket, object) = parse_uri(uri, &self.scheme)?;
        let object = object.ok_or_else(|| Error::InvalidPath(format!("`{uri}` does not name an object")))?;
        let metadata = self.client.get_metadata(&bucket, &object, &["size", "generation"]).await?;
        Ok(FileInfo::new(uri, metadata))
    }

    /// Opens a stream for `uri`. `read_options`, if given, overrides the
    /// facade's own options for this stream only.
    pub async fn open(&self, uri: &str, read_options: Option<ReadOptions>) -> Result<Stream> {
        let info = self.get_file_info(uri).await?;
        self.open_file_info(&info, read_options).await
    }

    /// Opens a stream from already-resolved file info, skipping the
    /// metadata round trip.
    pub async fn open_file_info(&self, info: &FileInfo, read_options: Option<ReadOptions>) -> Result<Stream> {
        self.require_open()?;
        let pool = self.pool().await;
        let options = match read_options {
            Some(o) => Arc::new(o),
            None => self.options.clone(),
        };
        Ok(Stream::new(self.client.clone(), info.metadata().clone(), options, pool))
    }

    /// Orderly shutdown: drains and closes the worker pool (if it was ever
    /// constructed), then closes the storage client. Idempotent.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(pool) = self.pool.get() {
            pool.close().await?;
        }
        self.client.close().await
    }
}
