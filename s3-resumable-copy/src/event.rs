/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! JSON payloads exchanged with a host runtime that triggers copies, e.g. a function
//! invocation that re-submits its own response until the copy succeeds.
//!
//! ```json
//! {
//!   "source_bucket": "source-bucket",
//!   "source_key": "large-object",
//!   "destination_bucket": "destination-bucket",
//!   "destination_key": "large-object",
//!   "upload_id": "optional, continues an existing upload",
//!   "completed_parts": [{"PartNumber": 1, "ETag": "..."}],
//!   "current_part_number": 2
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::operation::copy::{
    ResumableCopy, ResumeCursor, TransferRequest, TransferResult, TransferStatus,
};
use crate::types::CompletedChunk;
use crate::Client;

/// A copy invocation as received from the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Bucket containing the source object
    pub source_bucket: String,
    /// Key of the source object
    pub source_key: String,
    /// Bucket to copy the object to
    pub destination_bucket: String,
    /// Key to copy the object to
    pub destination_key: String,
    /// Multipart upload to continue; a new upload is started when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    /// Parts the previous invocation completed
    #[serde(default, deserialize_with = "null_as_empty")]
    pub completed_parts: Vec<CompletedChunk>,
    /// Part the previous invocation would have uploaded next
    #[serde(default = "first_part")]
    pub current_part_number: u32,
}

fn first_part() -> u32 {
    1
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<CompletedChunk>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<CompletedChunk>>::deserialize(deserializer)?.unwrap_or_default())
}

impl TransferEvent {
    /// Convert the payload into a validated [`TransferRequest`].
    ///
    /// `completed_parts` and `current_part_number` only matter alongside an `upload_id`.
    pub fn into_request(self) -> Result<TransferRequest, Error> {
        let resume = self.upload_id.map(|upload_id| {
            ResumeCursor::new(upload_id, self.completed_parts, self.current_part_number)
        });
        TransferRequest::builder()
            .source_bucket(self.source_bucket)
            .source_key(self.source_key)
            .destination_bucket(self.destination_bucket)
            .destination_key(self.destination_key)
            .set_resume(resume)
            .build()
    }
}

/// The response handed back to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResponse {
    /// `SUCCESS` or `FAILED`
    pub status: TransferStatus,
    /// The multipart upload used, if one was started
    pub upload_id: Option<String>,
    /// Parts durably recorded so far
    pub completed_parts: Vec<CompletedChunk>,
    /// Part to upload next
    pub current_part_number: u32,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<TransferResult> for TransferResponse {
    fn from(result: TransferResult) -> Self {
        TransferResponse {
            status: result.status(),
            upload_id: result.session_token().map(str::to_owned),
            completed_parts: result.completed_chunks().to_vec(),
            current_part_number: result.next_chunk_index(),
            error_message: result.error_message().map(str::to_owned),
        }
    }
}

impl TransferResponse {
    fn rejected(event: Option<&TransferEvent>, err: Error) -> Self {
        let cursor = event.and_then(|event| {
            event.upload_id.as_ref().map(|upload_id| {
                ResumeCursor::new(
                    upload_id.clone(),
                    event.completed_parts.clone(),
                    event.current_part_number,
                )
            })
        });
        TransferResult::failed(cursor, err).into()
    }
}

/// Run the copy described by a host payload and produce the host response.
///
/// Never fails: malformed payloads and invalid cursors produce a `FAILED` response.
/// Invalid cursors are echoed back unchanged.
pub async fn handle_event(client: &Client, event: serde_json::Value) -> serde_json::Value {
    let response = match serde_json::from_value::<TransferEvent>(event) {
        Err(err) => {
            tracing::debug!("rejecting malformed copy event: {err}");
            TransferResponse::rejected(None, err.into())
        }
        Ok(event) => match event.clone().into_request() {
            Err(err) => TransferResponse::rejected(Some(&event), err),
            Ok(request) => ResumableCopy::orchestrate(client.handle.clone(), request)
                .await
                .into(),
        },
    };

    serde_json::to_value(&response).unwrap_or_else(|err| {
        tracing::error!("failed to serialize copy response: {err}");
        serde_json::json!({ "status": "FAILED", "error_message": err.to_string() })
    })
}
