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

//! Strongly typed configuration for read thread count, vectored merge
//! thresholds, footer prefetch enablement and sizes, and small-object cache
//! threshold.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{Error, Result};

const KEY_THREAD_COUNT: &str = "analytics-core.read.thread.count";
const KEY_MERGE_GAP: &str = "analytics-core.read.vectored.range.merge-gap.max-bytes";
const KEY_MERGED_SIZE: &str = "analytics-core.read.vectored.range.merged-size.max-bytes";
const KEY_FOOTER_PREFETCH_ENABLED: &str = "analytics-core.footer.prefetch.enabled";
const KEY_SMALL_FILE_FOOTER_SIZE: &str = "analytics-core.small-file.footer.prefetch.size-bytes";
const KEY_LARGE_FILE_FOOTER_SIZE: &str = "analytics-core.large-file.footer.prefetch.size-bytes";
const KEY_SMALL_FILE_CACHE_THRESHOLD: &str = "analytics-core.small-file.cache.threshold-bytes";
const KEY_CLIENT_TYPE: &str = "client.type";
const KEY_CHUNK_SIZE: &str = "channel.read.chunk-size-bytes";
const KEY_DECRYPTION_KEY: &str = "decryption.key";
const KEY_PROJECT_ID: &str = "project-id";
const KEY_SERVICE_HOST: &str = "service.host";
const KEY_CLIENT_LIB_TOKEN: &str = "client-lib-token";
const KEY_USER_AGENT: &str = "user-agent";

/// Objects larger than this switch the footer prefetch size from the
/// small-file to the large-file default.
pub const LARGE_FILE_THRESHOLD_BYTES: i64 = 1 << 30;

/// Which wire client the facade's storage client collaborator should use.
/// Out of scope for this crate beyond carrying the selection through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientType {
    #[default]
    HttpClient,
    GrpcClient,
}

impl FromStr for ClientType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "HTTP_CLIENT" => Ok(Self::HttpClient),
            "GRPC_CLIENT" => Ok(Self::GrpcClient),
            other => Err(format!("unrecognised client.type `{other}`")),
        }
    }
}

/// Immutable, strongly typed read options. Build with [`ReadOptions::from_map`]
/// or [`ReadOptions::default`].
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub read_thread_count: usize,
    pub merge_gap_max_bytes: i64,
    pub merged_size_max_bytes: i64,
    pub footer_prefetch_enabled: bool,
    pub small_file_footer_prefetch_size_bytes: i32,
    pub large_file_footer_prefetch_size_bytes: i32,
    pub small_file_cache_threshold_bytes: i64,
    pub client_type: ClientType,
    pub channel_read_chunk_size_bytes: Option<i64>,
    pub decryption_key: Option<String>,
    pub project_id: Option<String>,
    pub service_host: Option<String>,
    pub client_lib_token: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            read_thread_count: 16,
            merge_gap_max_bytes: 4096,
            merged_size_max_bytes: 8 * 1024 * 1024,
            footer_prefetch_enabled: true,
            small_file_footer_prefetch_size_bytes: 102_400,
            large_file_footer_prefetch_size_bytes: 1_048_576,
            small_file_cache_threshold_bytes: 1_048_576,
            client_type: ClientType::default(),
            channel_read_chunk_size_bytes: None,
            decryption_key: None,
            project_id: None,
            service_host: None,
            client_lib_token: None,
            user_agent: None,
        }
    }
}

/// Parses and range-checks a single key, reporting the offending key by name
/// rather than a generic "bad config" message.
fn parse_field<T: FromStr>(map: &HashMap<String, String>, prefix: &str, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    let full_key = format!("{prefix}{key}");
    match map.get(&full_key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::InvalidConfiguration {
                key: full_key,
                reason: e.to_string(),
            }),
    }
}

fn parse_i32_within_prefetch_range(
    map: &HashMap<String, String>,
    prefix: &str,
    key: &str,
    default: i32,
) -> Result<i32> {
    match parse_field::<i64>(map, prefix, key)? {
        None => Ok(default),
        Some(v) => i32::try_from(v).map_err(|_| Error::InvalidConfiguration {
            key: format!("{prefix}{key}"),
            reason: format!("{v} does not fit in a signed 32-bit integer"),
        }),
    }
}

impl ReadOptions {
    /// Builds options from a flat string map and a key prefix. Unknown keys
    /// are ignored. Prefetch sizes that overflow a signed 32-bit integer
    /// fail with [`Error::InvalidConfiguration`] naming the offending key.
    pub fn from_map(map: &HashMap<String, String>, prefix: &str) -> Result<Self> {
        let defaults = Self::default();

        let client_type = match parse_field::<String>(map, prefix, KEY_CLIENT_TYPE)? {
            None => defaults.client_type,
            Some(raw) => raw.parse().map_err(|reason| Error::InvalidConfiguration {
                key: format!("{prefix}{KEY_CLIENT_TYPE}"),
                reason,
            })?,
        };

        Ok(Self {
            read_thread_count: parse_field(map, prefix, KEY_THREAD_COUNT)?
                .unwrap_or(defaults.read_thread_count),
            merge_gap_max_bytes: parse_field(map, prefix, KEY_MERGE_GAP)?
                .unwrap_or(defaults.merge_gap_max_bytes),
            merged_size_max_bytes: parse_field(map, prefix, KEY_MERGED_SIZE)?
                .unwrap_or(defaults.merged_size_max_bytes),
            footer_prefetch_enabled: parse_field(map, prefix, KEY_FOOTER_PREFETCH_ENABLED)?
                .unwrap_or(defaults.footer_prefetch_enabled),
            small_file_footer_prefetch_size_bytes: parse_i32_within_prefetch_range(
                map,
                prefix,
                KEY_SMALL_FILE_FOOTER_SIZE,
                defaults.small_file_footer_prefetch_size_bytes,
            )?,
            large_file_footer_prefetch_size_bytes: parse_i32_within_prefetch_range(
                map,
                prefix,
                KEY_LARGE_FILE_FOOTER_SIZE,
                defaults.large_file_footer_prefetch_size_bytes,
            )?,
            small_file_cache_threshold_bytes: parse_field(
                map,
                prefix,
                KEY_SMALL_FILE_CACHE_THRESHOLD,
            )?
            .unwrap_or(defaults.small_file_cache_threshold_bytes),
            client_type,
            channel_read_chunk_size_bytes: parse_field(map, prefix, KEY_CHUNK_SIZE)?,
            decryption_key: parse_field(map, prefix, KEY_DECRYPTION_KEY)?,
            project_id: parse_field(map, prefix, KEY_PROJECT_ID)?,
            service_host: parse_field(map, prefix, KEY_SERVICE_HOST)?,
            client_lib_token: parse_field(map, prefix, KEY_CLIENT_LIB_TOKEN)?,
            user_agent: parse_field(map, prefix, KEY_USER_AGENT)?,
        })
    }

    /// Derives the effective footer-prefetch / small-object-cache size for an
    /// object of `file_size` bytes. See the policy table in the component
    /// design doc: disabled-and-too-big yields no caching, small objects get
    /// fully cached, and large objects get a footer sized by the large- or
    /// small-file default depending on a 1 GiB cutoff.
    pub fn effective_prefetch_size(&self, file_size: i64) -> i64 {
        if !self.footer_prefetch_enabled && self.small_file_cache_threshold_bytes < file_size {
            return 0;
        }
        if self.small_file_cache_threshold_bytes >= file_size {
            return file_size;
        }
        if file_size > LARGE_FILE_THRESHOLD_BYTES {
            return (self.large_file_footer_prefetch_size_bytes as i64).min(file_size);
        }
        (self.small_file_footer_prefetch_size_bytes as i64).min(file_size)
    }
}
