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

//! A client-side read accelerator for analytics workloads against
//! versioned, immutable object storage.
//!
//! The core does not speak HTTP or any particular wire protocol itself —
//! [`StorageClient`] and [`ByteStream`] are the seams a caller plugs a real
//! client into. What this crate provides on top is:
//!
//! - a seekable, random-access [`Stream`] over one object generation, with
//!   footer prefetch and whole-small-object caching applied transparently;
//! - a vectored read path that merges nearby ranges into combined GET
//!   requests and fans them out across a bounded [`WorkerPool`];
//! - a [`FileSystem`] facade that resolves `scheme://bucket/object` URIs,
//!   fetches metadata, and opens streams against it.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use analytics_core::{FileSystem, ReadOptions};
//! # async fn run(client: Arc<dyn analytics_core::StorageClient>) -> analytics_core::Result<()> {
//! let fs = FileSystem::new("gs", client, ReadOptions::default());
//! let mut stream = fs.open("gs://my-bucket/dir/file.parquet", None).await?;
//! let mut buf = [0u8; 4096];
//! let n = stream.read(&mut buf, 0, buf.len()).await?;
//! stream.close().await?;
//! fs.close().await?;
//! # let _ = n;
//! # Ok(())
//! # }
//! ```

pub mod allocator;
pub mod channel;
pub mod client;
pub mod error;
pub mod facade;
pub mod metadata;
pub mod options;
pub mod pool;
pub mod range;
pub mod stream;

#[cfg(test)]
pub(crate) mod testutil;

pub use allocator::{BufferAllocator, DefaultAllocator};
pub use channel::SeekableByteChannel;
pub use client::{ByteStream, GetOptions, StorageClient};
pub use error::{Error, Result};
pub use facade::FileSystem;
pub use metadata::{FileInfo, ItemId, ItemMetadata, SIZE_NOT_FOUND};
pub use options::{ClientType, ReadOptions};
pub use pool::WorkerPool;
pub use range::{CombinedRange, ObjectRange};
pub use stream::Stream;
