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

//! The pluggable allocation strategy for vectored-read destination buffers.
//!
//! Kept as a small, focused trait rather than a heavyweight buffer-pool
//! hierarchy: callers that want pooled or pinned memory implement
//! [`BufferAllocator`] themselves; everyone else uses [`DefaultAllocator`].

use bytes::BytesMut;

/// Allocates scratch buffers for combined-range reads.
pub trait BufferAllocator: Send + Sync {
    fn allocate(&self, len: usize) -> BytesMut;
}

/// Allocates a fresh, zeroed-on-grow buffer from the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAllocator;

impl BufferAllocator for DefaultAllocator {
    fn allocate(&self, len: usize) -> BytesMut {
        BytesMut::zeroed(len)
    }
}
