/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use serde::{Deserialize, Serialize};

/// The target chunk size for a copy request.
#[derive(Debug, Clone, Default)]
pub enum PartSize {
    /// Use the default chunk size (5 MiB).
    #[default]
    Auto,

    /// Target part size explicitly given.
    ///
    /// NOTE: S3 requires every part but the last to be at least 5 MiB.
    Target(u64),
}

/// Policy for how to handle a multipart upload when the copy fails.
///
/// Default is to abort the upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FailedTransferPolicy {
    /// Abort the multipart upload on any failure once it has been started.
    ///
    /// Amazon S3 discards the uploaded parts and invalidates the upload ID, so the resume
    /// cursor returned with the failure can only be used with stores that keep aborted
    /// sessions addressable.
    #[default]
    AbortUpload,
    /// Leave the multipart upload in place so that a later invocation can resume it.
    Retain,
}

/// Where the progress ledger for a destination object is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressLocation {
    /// On the destination object's own metadata.
    ///
    /// The destination object must already exist. Recording progress on an absent
    /// destination fails with [`ErrorKind::InputInvalid`](crate::error::ErrorKind::InputInvalid)
    /// rather than creating a placeholder object. With Amazon S3 every checkpoint rewrites
    /// the existing object via a self-copy.
    Destination,
    /// On a sibling object whose key is the destination key followed by `suffix`.
    Sidecar {
        /// Suffix appended to the destination key
        suffix: String,
    },
}

impl Default for ProgressLocation {
    fn default() -> Self {
        ProgressLocation::Sidecar {
            suffix: ".upload-progress".to_owned(),
        }
    }
}

/// Identity of an object in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    bucket: String,
    key: String,
}

impl ObjectId {
    /// Create a new object identity
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The bucket the object lives in
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object key
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn with_key_suffix(&self, suffix: &str) -> ObjectId {
        ObjectId::new(self.bucket.clone(), format!("{}{}", self.key, suffix))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// A chunk that has reached the destination, identified by its index and the
/// store-issued content tag (ETag).
///
/// Serialized as `{"PartNumber": 1, "ETag": "..."}`, which is both the format of the
/// persisted progress ledger and of `completed_parts` in invocation payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedChunk {
    #[serde(rename = "PartNumber")]
    chunk_index: u32,
    #[serde(rename = "ETag", deserialize_with = "unquoted")]
    content_tag: String,
}

fn unquoted<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let tag = String::deserialize(deserializer)?;
    Ok(tag.trim_matches('"').to_owned())
}

impl CompletedChunk {
    /// Create a new chunk record.
    ///
    /// Surrounding double quotes on the content tag (as returned by S3) are stripped.
    pub fn new(chunk_index: u32, content_tag: impl Into<String>) -> Self {
        let content_tag: String = content_tag.into();
        Self {
            chunk_index,
            content_tag: content_tag.trim_matches('"').to_owned(),
        }
    }

    /// The 1-based chunk index (S3 part number)
    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    /// The store-issued content tag (ETag) for the chunk
    pub fn content_tag(&self) -> &str {
        &self.content_tag
    }
}

/// Check that `chunks` are numbered exactly `1..=chunks.len()` in order.
pub(crate) fn check_contiguous(chunks: &[CompletedChunk]) -> Result<(), String> {
    for (position, chunk) in chunks.iter().enumerate() {
        let expected = position as u64 + 1;
        if u64::from(chunk.chunk_index) != expected {
            return Err(format!(
                "chunk records must be numbered contiguously from 1: expected chunk {} at position {} but found chunk {}",
                expected, position, chunk.chunk_index
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_completed_chunk_wire_format() {
        let chunk = CompletedChunk::new(3, "\"abc123\"");
        assert_eq!("abc123", chunk.content_tag());
        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(r#"{"PartNumber":3,"ETag":"abc123"}"#, json);

        let quoted: CompletedChunk =
            serde_json::from_str(r#"{"PartNumber":3,"ETag":"\"abc123\""}"#).unwrap();
        assert_eq!(chunk, quoted);
    }

    #[test]
    fn test_check_contiguous() {
        assert!(check_contiguous(&[]).is_ok());
        let chunks = vec![CompletedChunk::new(1, "a"), CompletedChunk::new(2, "b")];
        assert!(check_contiguous(&chunks).is_ok());

        let gap = vec![CompletedChunk::new(1, "a"), CompletedChunk::new(3, "c")];
        assert!(check_contiguous(&gap).unwrap_err().contains("expected chunk 2"));

        let duplicate = vec![CompletedChunk::new(1, "a"), CompletedChunk::new(1, "a")];
        assert!(check_contiguous(&duplicate).is_err());

        let zero_based = vec![CompletedChunk::new(0, "a")];
        assert!(check_contiguous(&zero_based).is_err());
    }

    #[test]
    fn test_sidecar_identity() {
        let dest = ObjectId::new("bucket", "dir/object.bin");
        let sidecar = dest.with_key_suffix(".upload-progress");
        assert_eq!("bucket", sidecar.bucket());
        assert_eq!("dir/object.bin.upload-progress", sidecar.key());
        assert_eq!("s3://bucket/dir/object.bin", dest.to_string());
    }
}
