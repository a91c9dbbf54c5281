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

//! Error and result types shared across the read path.

use std::io;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the range merger, channel, stream, options, and facade.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid offset {offset} for object of size {size}")]
    InvalidOffset { offset: i64, size: i64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("authentication failure: {0}")]
    AuthFailure(String),

    #[error("end of stream: requested {requested} bytes, only {available} available")]
    EndOfStream { requested: usize, available: usize },

    #[error("already closed")]
    AlreadyClosed,

    #[error("cache populate failed: {0}")]
    CachePopulateFailed(String),

    #[error("vectored read task failed: {0}")]
    VectoredTaskFailed(String),

    #[error("invalid configuration for key `{key}`: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("{0}")]
    Io(#[from] io::Error),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(inner) => inner,
            Error::AlreadyClosed => io::Error::new(io::ErrorKind::NotConnected, err.to_string()),
            Error::InvalidOffset { .. } | Error::InvalidArgument(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
            Error::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, err.to_string()),
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
