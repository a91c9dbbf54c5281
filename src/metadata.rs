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

//! The data model: item identifiers, item metadata, and file info.

use std::collections::HashMap;

/// Sentinel used by storage clients to signal "this object does not exist".
///
/// Must never reach the read path; [`ItemMetadata::new`] rejects it.
pub const SIZE_NOT_FOUND: i64 = -1;

/// `(bucket, object)` identifier. `object` is `None` when the identifier
/// denotes a bucket rather than an object; the read path rejects those.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId {
    bucket: String,
    object: Option<String>,
}

impl ItemId {
    pub fn new(bucket: impl Into<String>, object: Option<String>) -> Self {
        let object = object.filter(|o| !o.is_empty());
        Self {
            bucket: bucket.into(),
            object,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    /// An identifier denotes an object when `object` is present and non-empty.
    pub fn is_object(&self) -> bool {
        self.object.is_some()
    }
}

/// Metadata for an object, pinned at a specific immutable `generation`.
#[derive(Debug, Clone)]
pub struct ItemMetadata {
    id: ItemId,
    size: i64,
    generation: i64,
    content_encoding: Option<String>,
}

impl ItemMetadata {
    /// Build object metadata. Returns `None` if `size` is the "does not
    /// exist" sentinel — callers should treat that as a not-found object
    /// rather than constructing metadata for it.
    pub fn new(
        id: ItemId,
        size: i64,
        generation: i64,
        content_encoding: Option<String>,
    ) -> Option<Self> {
        if size == SIZE_NOT_FOUND {
            return None;
        }
        Some(Self {
            id,
            size,
            generation,
            content_encoding,
        })
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn generation(&self) -> i64 {
        self.generation
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.content_encoding.as_deref()
    }
}

/// Item metadata plus the URI it was resolved from and an opaque attribute
/// bag that the core never inspects, only passes through to collaborators.
#[derive(Debug, Clone)]
pub struct FileInfo {
    uri: String,
    metadata: ItemMetadata,
    attributes: HashMap<String, String>,
}

impl FileInfo {
    pub fn new(uri: impl Into<String>, metadata: ItemMetadata) -> Self {
        Self {
            uri: uri.into(),
            metadata,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn metadata(&self) -> &ItemMetadata {
        &self.metadata
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_treats_empty_object_as_bucket() {
        let id = ItemId::new("my-bucket", Some(String::new()));
        assert!(!id.is_object());
    }

    #[test]
    fn metadata_rejects_not_found_sentinel() {
        let id = ItemId::new("b", Some("o".into()));
        assert!(ItemMetadata::new(id, SIZE_NOT_FOUND, 1, None).is_none());
    }

    #[test]
    fn metadata_roundtrips_fields() {
        let id = ItemId::new("b", Some("o".into()));
        let meta = ItemMetadata::new(id.clone(), 42, 7, Some("gzip".into())).unwrap();
        assert_eq!(meta.id(), &id);
        assert_eq!(meta.size(), 42);
        assert_eq!(meta.generation(), 7);
        assert_eq!(meta.content_encoding(), Some("gzip"));
    }
}
