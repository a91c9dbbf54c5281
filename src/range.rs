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

//! Pure functions over byte ranges: sorting, coalescing ranges into combined
//! ranges under two thresholds, and slicing a combined buffer back into
//! per-range views.
//!
//! This is the same IO-merging trick as the Linux kernel's IO scheduler:
//! two nearby small reads are cheaper to serve as one larger read than as
//! two round trips, as long as the merged read doesn't grow past a size
//! cap.

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// A user-requested sub-range of an object, plus the one-shot sender that
/// the vectored-read machinery completes once the bytes are available.
///
/// `ObjectRange` owns the sender; callers keep the paired [`oneshot::Receiver`]
/// to observe completion. Ranges are not required to be disjoint or sorted.
pub struct ObjectRange {
    offset: i64,
    length: i32,
    result: oneshot::Sender<Result<Bytes>>,
}

impl ObjectRange {
    /// Creates a range request, returning the range itself together with the
    /// receiver half its future resolves through.
    pub fn new(offset: i64, length: i32) -> (Self, oneshot::Receiver<Result<Bytes>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                offset,
                length,
                result: tx,
            },
            rx,
        )
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn length(&self) -> i32 {
        self.length
    }

    /// Completes this range's future. A dropped receiver (the caller lost
    /// interest) is not an error — there's nobody left to tell.
    pub fn complete(self, result: Result<Bytes>) {
        let _ = self.result.send(result);
    }
}

/// A superset range produced by merging one or more [`ObjectRange`]s that lie
/// close together. It is the unit of dispatch for vectored reads.
///
/// Invariants: `offset = min(underlying[i].offset)`,
/// `offset + length = max(underlying[i].offset + underlying[i].length)`, and
/// `underlying` preserves insertion order after sort-by-offset.
pub struct CombinedRange {
    offset: i64,
    length: i64,
    underlying: Vec<ObjectRange>,
}

impl CombinedRange {
    fn new(first: ObjectRange) -> Self {
        let offset = first.offset;
        let length = first.length as i64;
        Self {
            offset,
            length,
            underlying: vec![first],
        }
    }

    fn end(&self) -> i64 {
        self.offset + self.length
    }

    fn absorb(&mut self, next: ObjectRange) {
        let next_end = next.offset + next.length as i64;
        self.length = next_end.max(self.end()) - self.offset;
        self.underlying.push(next);
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn underlying(&self) -> &[ObjectRange] {
        &self.underlying
    }

    /// Consumes this combined range, completing every underlying range's
    /// future with a zero-copy [`slice`] of `combined_buffer`.
    ///
    /// `combined_buffer` must contain exactly `self.length` bytes starting
    /// at `self.offset`.
    pub fn complete_all(self, combined_buffer: &Bytes) {
        for range in self.underlying {
            let view = slice(combined_buffer, self.offset, &range);
            range.complete(Ok(view));
        }
    }

    /// Completes every underlying range's future with the same error. Used
    /// when the combined GET itself failed before any bytes were read.
    pub fn fail_all(self, message: impl Into<String> + Clone) {
        for range in self.underlying {
            range.complete(Err(Error::VectoredTaskFailed(message.clone().into())));
        }
    }
}

/// Stable sort by `offset` ascending.
pub fn sort(mut ranges: Vec<ObjectRange>) -> Vec<ObjectRange> {
    ranges.sort_by_key(|r| r.offset);
    ranges
}

/// Returns a zero-copy view into `combined_buffer` for `underlying`, given
/// that the buffer starts at `combined_offset`.
pub fn slice(combined_buffer: &Bytes, combined_offset: i64, underlying: &ObjectRange) -> Bytes {
    let start = (underlying.offset - combined_offset) as usize;
    let end = start + underlying.length as usize;
    combined_buffer.slice(start..end)
}

/// Merges sorted (or unsorted — this sorts first) ranges into combined
/// ranges, via a single left-to-right scan.
///
/// Two ranges merge iff `gap < max_gap` AND `potential_size <= max_size`,
/// where `gap` is the distance between the current combined range's end and
/// the next range's start (negative for overlapping ranges) and
/// `potential_size` is the size the combined range would have after
/// absorbing the next range. Empty input yields empty output.
pub fn merge(ranges: Vec<ObjectRange>, max_gap: i64, max_size: i64) -> Vec<CombinedRange> {
    let mut ranges = sort(ranges).into_iter();
    let mut combined = match ranges.next() {
        Some(first) => CombinedRange::new(first),
        None => return Vec::new(),
    };

    let mut result = Vec::new();
    for next in ranges {
        let next_end = next.offset + next.length as i64;
        let gap = next.offset - combined.end();
        let potential_size = next_end.max(combined.end()) - combined.offset;

        if gap < max_gap && potential_size <= max_size {
            combined.absorb(next);
        } else {
            result.push(combined);
            combined = CombinedRange::new(next);
        }
    }
    result.push(combined);
    result
}


/// Property tests for the merge invariant from the component design doc:
/// `merge` partitions its input, and every combined range's bounds are
/// exactly the min/max of its underlying ranges.
#[cfg(test)]
mod merge_properties {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::{merge, ObjectRange};

    fn arb_range() -> impl Strategy<Value = (i64, i32)> {
        (0i64..10_000, 0i32..500)
    }

    proptest! {
        #[test]
        fn merge_partitions_every_input_range(
            specs in vec(arb_range(), 0..40),
            max_gap in 0i64..2000,
            max_size in 1i64..20_000,
        ) {
            let total_in = specs.len();
            let ranges: Vec<ObjectRange> = specs
                .iter()
                .map(|&(offset, length)| ObjectRange::new(offset, length).0)
                .collect();

            let combined = merge(ranges, max_gap, max_size);

            // Every input range appears in exactly one combined range.
            let total_out: usize = combined.iter().map(|c| c.underlying().len()).sum();
            prop_assert_eq!(total_out, total_in);

            for c in &combined {
                if c.underlying().is_empty() {
                    continue;
                }
                let min_offset = c.underlying().iter().map(|r| r.offset()).min().unwrap();
                let max_end = c
                    .underlying()
                    .iter()
                    .map(|r| r.offset() + r.length() as i64)
                    .max()
                    .unwrap();
                prop_assert_eq!(c.offset(), min_offset);
                prop_assert_eq!(c.offset() + c.length(), max_end);
                prop_assert!(c.length() <= max_size);
            }
        }

        #[test]
        fn merge_never_grows_a_combined_range_past_max_size(
            specs in vec(arb_range(), 1..40),
            max_gap in 0i64..2000,
            max_size in 1i64..20_000,
        ) {
            let ranges: Vec<ObjectRange> = specs
                .iter()
                .map(|&(offset, length)| ObjectRange::new(offset, length).0)
                .collect();
            for c in merge(ranges, max_gap, max_size) {
                prop_assert!(c.length() <= max_size);
            }
        }
    }
}
