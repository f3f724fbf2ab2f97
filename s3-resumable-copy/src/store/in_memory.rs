/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::RwLock;

use crate::error::{self, Error};
use crate::store::ObjectStore;
use crate::types::{CompletedChunk, ObjectId};
use crate::MAX_PARTS;

/// An in-memory [`ObjectStore`].
///
/// Objects, side metadata and multipart sessions are kept in memory. Sessions behave like
/// S3 multipart uploads: once finalized or aborted their token is no longer accepted.
/// Side metadata lives in its own map and may be set on keys that hold no object. Like
/// S3 `CompleteMultipartUpload`, finalizing replaces the target's side metadata with none.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    // object -> content
    objects: RwLock<HashMap<ObjectId, Bytes>>,
    // object -> side metadata
    metadata: RwLock<HashMap<ObjectId, HashMap<String, String>>>,
    // session token -> pending upload
    uploads: RwLock<HashMap<String, PendingUpload>>,
    next_upload_id: AtomicU64,
}

#[derive(Debug)]
struct PendingUpload {
    target: ObjectId,
    // chunk index -> (content tag, content)
    parts: BTreeMap<u32, (String, Bytes)>,
}

impl InMemoryObjectStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, replacing any existing content
    pub async fn put_object(&self, object: ObjectId, content: impl Into<Bytes>) {
        self.objects.write().await.insert(object, content.into());
    }

    /// The content of an object, if present
    pub async fn object(&self, object: &ObjectId) -> Option<Bytes> {
        self.objects.read().await.get(object).cloned()
    }

    /// Number of sessions that have been initiated but neither finalized nor aborted
    pub async fn active_uploads(&self) -> usize {
        self.uploads.read().await.len()
    }

    /// Indices of the chunks uploaded so far to an active session
    pub async fn uploaded_chunks(&self, session_token: &str) -> Option<Vec<u32>> {
        let uploads = self.uploads.read().await;
        uploads
            .get(session_token)
            .map(|upload| upload.parts.keys().copied().collect())
    }
}

/// ETag of a part, the hex MD5 digest of its content
fn content_tag(content: &[u8]) -> String {
    hex::encode(md5::compute(content).0)
}

fn no_such_upload(session_token: &str) -> Error {
    error::not_found(format!("no such upload: {session_token}"))
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn stat(&self, object: &ObjectId) -> Result<u64, Error> {
        let objects = self.objects.read().await;
        let content = objects
            .get(object)
            .ok_or_else(|| error::not_found(format!("no such key: {object}")))?;
        Ok(content.len() as u64)
    }

    async fn read_range(
        &self,
        object: &ObjectId,
        start: u64,
        end_inclusive: u64,
    ) -> Result<Bytes, Error> {
        let objects = self.objects.read().await;
        let content = objects
            .get(object)
            .ok_or_else(|| error::not_found(format!("no such key: {object}")))?;
        let len = content.len() as u64;
        if start > end_inclusive || end_inclusive >= len {
            return Err(error::invalid_input(format!(
                "invalid range bytes={start}-{end_inclusive} for object of {len} bytes"
            )));
        }
        Ok(content.slice(start as usize..=end_inclusive as usize))
    }

    async fn init_chunked_upload(&self, object: &ObjectId) -> Result<String, Error> {
        let id = self.next_upload_id.fetch_add(1, Ordering::Relaxed);
        let session_token = format!("upload-{id}");
        let mut uploads = self.uploads.write().await;
        uploads.insert(
            session_token.clone(),
            PendingUpload {
                target: object.clone(),
                parts: BTreeMap::new(),
            },
        );
        Ok(session_token)
    }

    async fn upload_chunk(
        &self,
        object: &ObjectId,
        session_token: &str,
        chunk_index: u32,
        data: Bytes,
    ) -> Result<String, Error> {
        if chunk_index == 0 || u64::from(chunk_index) > MAX_PARTS {
            return Err(error::invalid_input(format!(
                "chunk index {chunk_index} out of range"
            )));
        }
        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get_mut(session_token)
            .filter(|upload| &upload.target == object)
            .ok_or_else(|| no_such_upload(session_token))?;
        let tag = content_tag(&data);
        upload.parts.insert(chunk_index, (tag.clone(), data));
        Ok(tag)
    }

    async fn finalize(
        &self,
        object: &ObjectId,
        session_token: &str,
        chunks: &[CompletedChunk],
    ) -> Result<(), Error> {
        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get(session_token)
            .filter(|upload| &upload.target == object)
            .ok_or_else(|| no_such_upload(session_token))?;

        let mut content = BytesMut::new();
        let mut previous = 0;
        for chunk in chunks {
            if chunk.chunk_index() <= previous {
                return Err(error::invalid_input("chunk list is not in ascending order"));
            }
            previous = chunk.chunk_index();
            match upload.parts.get(&chunk.chunk_index()) {
                Some((tag, data)) if tag == chunk.content_tag() => content.extend_from_slice(data),
                _ => {
                    return Err(error::invalid_input(format!(
                        "invalid part: chunk {} with tag {} was not uploaded",
                        chunk.chunk_index(),
                        chunk.content_tag()
                    )))
                }
            }
        }

        uploads.remove(session_token);
        drop(uploads);
        self.objects
            .write()
            .await
            .insert(object.clone(), content.freeze());
        // the assembled object replaces the old one along with its metadata
        self.metadata.write().await.remove(object);
        Ok(())
    }

    async fn abort(&self, object: &ObjectId, session_token: &str) -> Result<(), Error> {
        let mut uploads = self.uploads.write().await;
        match uploads.get(session_token) {
            Some(upload) if &upload.target == object => {
                uploads.remove(session_token);
                Ok(())
            }
            _ => Err(no_such_upload(session_token)),
        }
    }

    async fn get_side_metadata(
        &self,
        object: &ObjectId,
        key: &str,
    ) -> Result<Option<String>, Error> {
        let metadata = self.metadata.read().await;
        Ok(metadata.get(object).and_then(|m| m.get(key)).cloned())
    }

    async fn set_side_metadata(
        &self,
        object: &ObjectId,
        key: &str,
        value: &str,
    ) -> Result<(), Error> {
        let mut metadata = self.metadata.write().await;
        metadata
            .entry(object.clone())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
