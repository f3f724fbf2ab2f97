/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aws_smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep, Sleep};
use bytes::Bytes;
use s3_resumable_copy::error::{Error, ErrorKind};
use s3_resumable_copy::store::in_memory::InMemoryObjectStore;
use s3_resumable_copy::store::ObjectStore;
use s3_resumable_copy::types::{CompletedChunk, ObjectId};

/// A store call as observed by [`FaultyStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Stat(ObjectId),
    ReadRange { start: u64, end_inclusive: u64 },
    InitChunkedUpload,
    UploadChunk(u32),
    Finalize(Vec<u32>),
    Abort(String),
    GetSideMetadata(ObjectId),
    SetSideMetadata(ObjectId),
}

#[derive(Debug, Default)]
struct Faults {
    upload_chunk: HashSet<u32>,
    finalize: bool,
    abort: bool,
    get_side_metadata: bool,
    set_side_metadata: bool,
}

/// Wraps an [`InMemoryObjectStore`], recording every call and failing the ones it is told to.
///
/// Faults stay armed until [`FaultyStore::clear_faults`] is called.
#[derive(Debug)]
pub struct FaultyStore {
    inner: Arc<InMemoryObjectStore>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<StoreCall>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<InMemoryObjectStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &Arc<InMemoryObjectStore> {
        &self.inner
    }

    pub fn fail_upload_chunk(&self, chunk_index: u32) {
        self.faults.lock().unwrap().upload_chunk.insert(chunk_index);
    }

    pub fn fail_finalize(&self) {
        self.faults.lock().unwrap().finalize = true;
    }

    pub fn fail_abort(&self) {
        self.faults.lock().unwrap().abort = true;
    }

    pub fn fail_get_side_metadata(&self) {
        self.faults.lock().unwrap().get_side_metadata = true;
    }

    pub fn fail_set_side_metadata(&self) {
        self.faults.lock().unwrap().set_side_metadata = true;
    }

    pub fn clear_faults(&self) {
        *self.faults.lock().unwrap() = Faults::default();
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Byte ranges read so far, in call order
    pub fn read_ranges(&self) -> Vec<(u64, u64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::ReadRange {
                    start,
                    end_inclusive,
                } => Some((start, end_inclusive)),
                _ => None,
            })
            .collect()
    }

    /// Chunk indices passed to `upload_chunk`, in call order
    pub fn uploaded_chunks(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::UploadChunk(index) => Some(index),
                _ => None,
            })
            .collect()
    }

    /// Number of `abort` calls
    pub fn aborts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Abort(_)))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn injected(what: &str) -> Error {
    Error::new(ErrorKind::StoreError, format!("injected failure: {what}"))
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn stat(&self, object: &ObjectId) -> Result<u64, Error> {
        self.record(StoreCall::Stat(object.clone()));
        self.inner.stat(object).await
    }

    async fn read_range(
        &self,
        object: &ObjectId,
        start: u64,
        end_inclusive: u64,
    ) -> Result<Bytes, Error> {
        self.record(StoreCall::ReadRange {
            start,
            end_inclusive,
        });
        self.inner.read_range(object, start, end_inclusive).await
    }

    async fn init_chunked_upload(&self, object: &ObjectId) -> Result<String, Error> {
        self.record(StoreCall::InitChunkedUpload);
        self.inner.init_chunked_upload(object).await
    }

    async fn upload_chunk(
        &self,
        object: &ObjectId,
        session_token: &str,
        chunk_index: u32,
        data: Bytes,
    ) -> Result<String, Error> {
        self.record(StoreCall::UploadChunk(chunk_index));
        if self.faults.lock().unwrap().upload_chunk.contains(&chunk_index) {
            return Err(injected("upload_chunk"));
        }
        self.inner
            .upload_chunk(object, session_token, chunk_index, data)
            .await
    }

    async fn finalize(
        &self,
        object: &ObjectId,
        session_token: &str,
        chunks: &[CompletedChunk],
    ) -> Result<(), Error> {
        self.record(StoreCall::Finalize(
            chunks.iter().map(CompletedChunk::chunk_index).collect(),
        ));
        if self.faults.lock().unwrap().finalize {
            return Err(injected("finalize"));
        }
        self.inner.finalize(object, session_token, chunks).await
    }

    async fn abort(&self, object: &ObjectId, session_token: &str) -> Result<(), Error> {
        self.record(StoreCall::Abort(session_token.to_owned()));
        if self.faults.lock().unwrap().abort {
            return Err(injected("abort"));
        }
        self.inner.abort(object, session_token).await
    }

    async fn get_side_metadata(
        &self,
        object: &ObjectId,
        key: &str,
    ) -> Result<Option<String>, Error> {
        self.record(StoreCall::GetSideMetadata(object.clone()));
        if self.faults.lock().unwrap().get_side_metadata {
            return Err(injected("get_side_metadata"));
        }
        self.inner.get_side_metadata(object, key).await
    }

    async fn set_side_metadata(
        &self,
        object: &ObjectId,
        key: &str,
        value: &str,
    ) -> Result<(), Error> {
        self.record(StoreCall::SetSideMetadata(object.clone()));
        if self.faults.lock().unwrap().set_side_metadata {
            return Err(injected("set_side_metadata"));
        }
        self.inner.set_side_metadata(object, key, value).await
    }
}

/// Sleep implementation that returns immediately and remembers every requested duration
#[derive(Debug, Clone, Default)]
pub struct RecordingSleep {
    requested: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> SharedAsyncSleep {
        SharedAsyncSleep::new(self.clone())
    }

    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().unwrap().clone()
    }
}

impl AsyncSleep for RecordingSleep {
    fn sleep(&self, duration: Duration) -> Sleep {
        self.requested.lock().unwrap().push(duration);
        Sleep::new(std::future::ready(()))
    }
}

/// `len` bytes of recognizable content, so misplaced ranges show up in comparisons
pub fn patterned_bytes(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>().into()
}
