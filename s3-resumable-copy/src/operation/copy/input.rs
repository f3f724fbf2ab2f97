/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::error::{self, Error};
use crate::types::{check_contiguous, CompletedChunk, ObjectId};

/// Where a previous invocation left off.
///
/// Obtained from [`TransferResult::resume_cursor`](crate::operation::copy::TransferResult::resume_cursor)
/// or rebuilt from a persisted invocation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeCursor {
    session_token: String,
    completed_chunks: Vec<CompletedChunk>,
    next_chunk_index: u32,
}

impl ResumeCursor {
    /// Create a new cursor. The cursor is validated when the request is built.
    pub fn new(
        session_token: impl Into<String>,
        completed_chunks: Vec<CompletedChunk>,
        next_chunk_index: u32,
    ) -> Self {
        Self {
            session_token: session_token.into(),
            completed_chunks,
            next_chunk_index,
        }
    }

    /// The multipart upload session to continue
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// The chunks the caller believes have been completed
    pub fn completed_chunks(&self) -> &[CompletedChunk] {
        &self.completed_chunks
    }

    /// The chunk the caller believes should be uploaded next
    pub fn next_chunk_index(&self) -> u32 {
        self.next_chunk_index
    }

    fn validate(&self) -> Result<(), Error> {
        if self.session_token.is_empty() {
            return Err(error::invalid_input("resume session token must not be empty"));
        }
        check_contiguous(&self.completed_chunks).map_err(error::invalid_input)?;
        let expected = self.completed_chunks.len() as u64 + 1;
        if u64::from(self.next_chunk_index) != expected {
            return Err(error::invalid_input(format!(
                "next chunk index {} does not follow {} completed chunk(s)",
                self.next_chunk_index,
                self.completed_chunks.len()
            )));
        }
        Ok(())
    }
}

/// Request type for a resumable copy of one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    source: ObjectId,
    destination: ObjectId,
    resume: Option<ResumeCursor>,
}

impl TransferRequest {
    /// Creates a new builder-style object to manufacture [`TransferRequest`].
    pub fn builder() -> TransferRequestBuilder {
        TransferRequestBuilder::default()
    }

    /// The object to copy from
    pub fn source(&self) -> &ObjectId {
        &self.source
    }

    /// The object to copy to
    pub fn destination(&self) -> &ObjectId {
        &self.destination
    }

    /// Where a previous invocation left off, if this request continues one
    pub fn resume(&self) -> Option<&ResumeCursor> {
        self.resume.as_ref()
    }
}

/// A builder for [`TransferRequest`].
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequestBuilder {
    pub(crate) source_bucket: Option<String>,
    pub(crate) source_key: Option<String>,
    pub(crate) destination_bucket: Option<String>,
    pub(crate) destination_key: Option<String>,
    pub(crate) resume: Option<ResumeCursor>,
}

impl TransferRequestBuilder {
    /// The bucket containing the source object.
    pub fn source_bucket(mut self, input: impl Into<String>) -> Self {
        self.source_bucket = Some(input.into());
        self
    }

    /// The bucket containing the source object.
    pub fn set_source_bucket(mut self, input: Option<String>) -> Self {
        self.source_bucket = input;
        self
    }

    /// The key of the source object.
    pub fn source_key(mut self, input: impl Into<String>) -> Self {
        self.source_key = Some(input.into());
        self
    }

    /// The key of the source object.
    pub fn set_source_key(mut self, input: Option<String>) -> Self {
        self.source_key = input;
        self
    }

    /// The bucket to copy the object to.
    pub fn destination_bucket(mut self, input: impl Into<String>) -> Self {
        self.destination_bucket = Some(input.into());
        self
    }

    /// The bucket to copy the object to.
    pub fn set_destination_bucket(mut self, input: Option<String>) -> Self {
        self.destination_bucket = input;
        self
    }

    /// The key to copy the object to.
    pub fn destination_key(mut self, input: impl Into<String>) -> Self {
        self.destination_key = Some(input.into());
        self
    }

    /// The key to copy the object to.
    pub fn set_destination_key(mut self, input: Option<String>) -> Self {
        self.destination_key = input;
        self
    }

    /// Continue the copy described by `cursor` instead of starting a new one.
    pub fn resume(mut self, cursor: ResumeCursor) -> Self {
        self.resume = Some(cursor);
        self
    }

    /// Continue the copy described by `cursor` instead of starting a new one.
    pub fn set_resume(mut self, cursor: Option<ResumeCursor>) -> Self {
        self.resume = cursor;
        self
    }

    /// Consumes the builder and constructs a [`TransferRequest`].
    ///
    /// Fails with [`ErrorKind::InputInvalid`](crate::error::ErrorKind::InputInvalid) when a
    /// location is missing or the resume cursor is inconsistent.
    pub fn build(self) -> Result<TransferRequest, Error> {
        let source = ObjectId::new(
            required(self.source_bucket, "source_bucket")?,
            required(self.source_key, "source_key")?,
        );
        let destination = ObjectId::new(
            required(self.destination_bucket, "destination_bucket")?,
            required(self.destination_key, "destination_key")?,
        );
        if let Some(cursor) = &self.resume {
            cursor.validate()?;
        }

        Ok(TransferRequest {
            source,
            destination,
            resume: self.resume,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, Error> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(error::invalid_input(format!("{field} is required"))),
    }
}
