/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::ops::RangeInclusive;

use crate::error::{self, Error};
use crate::MAX_PARTS;

/// Split of a source object into fixed size chunks, all but the last of `part_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ChunkPlan {
    content_length: u64,
    part_size: u64,
}

impl ChunkPlan {
    pub(super) fn new(content_length: u64, part_size: u64) -> Result<Self, Error> {
        if part_size == 0 {
            return Err(error::invalid_input("part size must be positive"));
        }
        let plan = Self {
            content_length,
            part_size,
        };
        if plan.num_chunks() > MAX_PARTS {
            return Err(error::invalid_input(format!(
                "object of {content_length} bytes needs {} chunks of {part_size} bytes; at most {MAX_PARTS} are supported",
                plan.num_chunks()
            )));
        }
        Ok(plan)
    }

    pub(super) fn num_chunks(&self) -> u64 {
        self.content_length.div_ceil(self.part_size)
    }

    /// Inclusive byte range of the (1-based) chunk `index`, `None` once past the end
    pub(super) fn range(&self, index: u32) -> Option<RangeInclusive<u64>> {
        if index == 0 {
            return None;
        }
        let start = u64::from(index - 1) * self.part_size;
        if start >= self.content_length {
            return None;
        }
        let end = std::cmp::min(start + self.part_size, self.content_length) - 1;
        Some(start..=end)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use crate::MEBIBYTE;

    #[test]
    fn test_twelve_mib_in_five_mib_chunks() {
        let plan = ChunkPlan::new(12 * MEBIBYTE, 5 * MEBIBYTE).unwrap();
        assert_eq!(3, plan.num_chunks());
        assert_eq!(Some(0..=5 * MEBIBYTE - 1), plan.range(1));
        assert_eq!(Some(5 * MEBIBYTE..=10 * MEBIBYTE - 1), plan.range(2));
        assert_eq!(Some(10 * MEBIBYTE..=12 * MEBIBYTE - 1), plan.range(3));
        assert_eq!(None, plan.range(4));
    }

    #[test]
    fn test_ranges_cover_object_exactly() {
        for (length, part_size) in [(1, 1), (10, 3), (9, 3), (1000, 7), (7, 1000)] {
            let plan = ChunkPlan::new(length, part_size).unwrap();
            let mut expected_start = 0;
            let mut index = 1;
            while let Some(range) = plan.range(index) {
                assert_eq!(expected_start, *range.start());
                expected_start = range.end() + 1;
                index += 1;
            }
            assert_eq!(length, expected_start);
            assert_eq!(plan.num_chunks(), u64::from(index - 1));
        }
    }

    #[test]
    fn test_empty_object_has_no_chunks() {
        let plan = ChunkPlan::new(0, 5).unwrap();
        assert_eq!(0, plan.num_chunks());
        assert_eq!(None, plan.range(1));
    }

    #[test]
    fn test_invalid_plans() {
        let err = ChunkPlan::new(10, 0).unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());

        let err = ChunkPlan::new(MAX_PARTS + 1, 1).unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
        assert!(ChunkPlan::new(MAX_PARTS, 1).is_ok());
    }
}
