/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Error;
use crate::types::{CompletedChunk, ObjectId};

/// Amazon S3 backed store
pub mod s3;

/// In-process store, useful for tests and dry runs
pub mod in_memory;

/// The object store operations a resumable copy depends on.
///
/// Implementations must report missing objects, buckets and upload sessions with
/// [`ErrorKind::NotFound`](crate::error::ErrorKind::NotFound).
#[async_trait]
pub trait ObjectStore: Debug + Send + Sync {
    /// Total size in bytes of an object
    async fn stat(&self, object: &ObjectId) -> Result<u64, Error>;

    /// Read the inclusive byte range `[start, end_inclusive]` of an object
    async fn read_range(&self, object: &ObjectId, start: u64, end_inclusive: u64)
        -> Result<Bytes, Error>;

    /// Start a chunked (multipart) upload for `object`, returning the session token
    async fn init_chunked_upload(&self, object: &ObjectId) -> Result<String, Error>;

    /// Upload one chunk of an active session, returning its content tag
    async fn upload_chunk(
        &self,
        object: &ObjectId,
        session_token: &str,
        chunk_index: u32,
        data: Bytes,
    ) -> Result<String, Error>;

    /// Assemble the listed chunks into the destination object and end the session
    async fn finalize(
        &self,
        object: &ObjectId,
        session_token: &str,
        chunks: &[CompletedChunk],
    ) -> Result<(), Error>;

    /// Discard an active session and any chunks uploaded to it
    async fn abort(&self, object: &ObjectId, session_token: &str) -> Result<(), Error>;

    /// Read a side-channel metadata value, `None` if the object or key is absent
    async fn get_side_metadata(&self, object: &ObjectId, key: &str)
        -> Result<Option<String>, Error>;

    /// Replace a side-channel metadata value on an object
    async fn set_side_metadata(&self, object: &ObjectId, key: &str, value: &str)
        -> Result<(), Error>;
}

/// A shareable [`ObjectStore`]
pub type SharedObjectStore = Arc<dyn ObjectStore>;
