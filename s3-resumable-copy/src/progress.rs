/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{self, Error};
use crate::store::SharedObjectStore;
use crate::types::{CompletedChunk, ObjectId, ProgressLocation};

/// Metadata key the ledger is stored under by default
pub const DEFAULT_PROGRESS_METADATA_KEY: &str = "upload-parts";

/// Durable record of the chunks that have reached a destination object.
///
/// A ledger belongs to one upload session. Loading it for any other session yields an
/// empty list, so progress left behind by an earlier session is never picked up.
///
/// When a copy resumes an existing session, the ledger loaded from here is authoritative
/// and any chunk list supplied by the caller is ignored. There is no locking: at most one
/// copy may write the ledger of a given destination at a time.
#[async_trait]
pub trait ProgressStore: Debug + Send + Sync {
    /// Load the ledger `session_token` recorded for `destination`, ordered by chunk index.
    ///
    /// A destination without a ledger, or with a ledger of another session, yields an
    /// empty list.
    async fn load(
        &self,
        destination: &ObjectId,
        session_token: &str,
    ) -> Result<Vec<CompletedChunk>, Error>;

    /// Replace the ledger for `destination` with `chunks` recorded by `session_token`
    async fn save(
        &self,
        destination: &ObjectId,
        session_token: &str,
        chunks: &[CompletedChunk],
    ) -> Result<(), Error>;
}

/// A shareable [`ProgressStore`]
pub type SharedProgressStore = Arc<dyn ProgressStore>;

/// Persisted form of a ledger: `{"UploadId": "...", "Parts": [{"PartNumber": 1, "ETag": "..."}]}`
#[derive(Debug, Serialize, Deserialize)]
struct Ledger<C> {
    #[serde(rename = "UploadId")]
    session_token: String,
    #[serde(rename = "Parts")]
    chunks: C,
}

/// [`ProgressStore`] that keeps the ledger as a JSON document in object side metadata.
#[derive(Debug, Clone)]
pub struct MetadataProgressStore {
    store: SharedObjectStore,
    location: ProgressLocation,
    metadata_key: String,
}

impl MetadataProgressStore {
    /// Create a ledger store writing through `store` at `location` under `metadata_key`
    pub fn new(
        store: SharedObjectStore,
        location: ProgressLocation,
        metadata_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            location,
            metadata_key: metadata_key.into(),
        }
    }

    /// The object whose metadata holds the ledger for `destination`
    pub fn ledger_object(&self, destination: &ObjectId) -> ObjectId {
        match &self.location {
            ProgressLocation::Destination => destination.clone(),
            ProgressLocation::Sidecar { suffix } => destination.with_key_suffix(suffix),
        }
    }
}

#[async_trait]
impl ProgressStore for MetadataProgressStore {
    async fn load(
        &self,
        destination: &ObjectId,
        session_token: &str,
    ) -> Result<Vec<CompletedChunk>, Error> {
        let ledger_object = self.ledger_object(destination);
        let raw = match self
            .store
            .get_side_metadata(&ledger_object, &self.metadata_key)
            .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(err) if err.is_not_found() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let ledger: Ledger<Vec<CompletedChunk>> = serde_json::from_str(&raw).map_err(|err| {
            error::invalid_input(format!("malformed progress ledger on {ledger_object}: {err}"))
        })?;
        if ledger.session_token != session_token {
            tracing::debug!(
                "progress ledger on {ledger_object} belongs to upload {}, not {session_token}; ignoring it",
                ledger.session_token
            );
            return Ok(Vec::new());
        }

        let mut chunks = ledger.chunks;
        chunks.sort_by_key(CompletedChunk::chunk_index);
        tracing::trace!(
            "loaded {} completed chunk(s) from {}",
            chunks.len(),
            ledger_object
        );
        Ok(chunks)
    }

    async fn save(
        &self,
        destination: &ObjectId,
        session_token: &str,
        chunks: &[CompletedChunk],
    ) -> Result<(), Error> {
        if self.location == ProgressLocation::Destination {
            // an absent destination must not gain a placeholder object
            match self.store.stat(destination).await {
                Ok(_) => {}
                Err(err) if err.is_not_found() => {
                    return Err(error::invalid_input(format!(
                        "progress cannot be recorded on {destination} before it exists; keep progress in a sidecar object instead"
                    )))
                }
                Err(err) => return Err(err),
            }
        }

        let ledger_object = self.ledger_object(destination);
        let raw = serde_json::to_string(&Ledger {
            session_token: session_token.to_owned(),
            chunks,
        })?;
        self.store
            .set_side_metadata(&ledger_object, &self.metadata_key, &raw)
            .await
    }
}
