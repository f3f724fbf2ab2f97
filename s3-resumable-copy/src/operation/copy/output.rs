/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_types::error::display::DisplayErrorContext;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::operation::copy::ResumeCursor;
use crate::types::CompletedChunk;

/// Outcome of a copy invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferStatus {
    /// The destination object is complete
    Success,
    /// The copy stopped early; the result carries what is needed to retry
    Failed,
}

/// Response type for a resumable copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    status: TransferStatus,
    session_token: Option<String>,
    completed_chunks: Vec<CompletedChunk>,
    next_chunk_index: u32,
    error_message: Option<String>,
}

impl TransferResult {
    pub(crate) fn succeeded(session_token: String, completed_chunks: Vec<CompletedChunk>) -> Self {
        let next_chunk_index = completed_chunks.len() as u32 + 1;
        Self {
            status: TransferStatus::Success,
            session_token: Some(session_token),
            completed_chunks,
            next_chunk_index,
            error_message: None,
        }
    }

    /// A failed result resumable from `cursor`. Without a cursor nothing was started.
    pub(crate) fn failed(cursor: Option<ResumeCursor>, err: Error) -> Self {
        let error_message = Some(format!("{}", DisplayErrorContext(err)));
        match cursor {
            Some(cursor) => Self {
                status: TransferStatus::Failed,
                session_token: Some(cursor.session_token().to_owned()),
                next_chunk_index: cursor.next_chunk_index(),
                completed_chunks: cursor.completed_chunks().to_vec(),
                error_message,
            },
            None => Self {
                status: TransferStatus::Failed,
                session_token: None,
                completed_chunks: Vec::new(),
                next_chunk_index: 1,
                error_message,
            },
        }
    }

    /// Whether the copy completed or stopped early
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// True if the destination object is complete
    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Success
    }

    /// The multipart upload session used, if one was started
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// The chunks durably recorded, ordered by index
    pub fn completed_chunks(&self) -> &[CompletedChunk] {
        &self.completed_chunks
    }

    /// The chunk to upload next (one past the last completed chunk)
    pub fn next_chunk_index(&self) -> u32 {
        self.next_chunk_index
    }

    /// Description of the failure with its full cause chain
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// The cursor to continue a failed copy with.
    ///
    /// `None` for successful copies and for failures that happened before a session existed;
    /// those are retried as fresh copies.
    pub fn resume_cursor(&self) -> Option<ResumeCursor> {
        match (&self.status, &self.session_token) {
            (TransferStatus::Failed, Some(token)) => Some(ResumeCursor::new(
                token.clone(),
                self.completed_chunks.clone(),
                self.next_chunk_index,
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error;

    #[test]
    fn test_failed_result_round_trips_to_cursor() {
        let cursor = ResumeCursor::new("upload-1", vec![CompletedChunk::new(1, "a")], 2);
        let result = TransferResult::failed(
            Some(cursor.clone()),
            error::chunk_failed(2)(error::store_error("connection reset")),
        );

        assert!(!result.is_success());
        assert_eq!(Some(cursor), result.resume_cursor());
        let message = result.error_message().unwrap();
        assert!(message.contains("failed to copy chunk 2"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn test_failed_before_session() {
        let result = TransferResult::failed(None, error::not_found("NoSuchKey"));
        assert_eq!(TransferStatus::Failed, result.status());
        assert_eq!(None, result.session_token());
        assert!(result.completed_chunks().is_empty());
        assert_eq!(1, result.next_chunk_index());
        assert_eq!(None, result.resume_cursor());
    }

    #[test]
    fn test_success_has_no_cursor() {
        let result = TransferResult::succeeded(
            "upload-1".to_owned(),
            vec![CompletedChunk::new(1, "a"), CompletedChunk::new(2, "b")],
        );
        assert!(result.is_success());
        assert_eq!(3, result.next_chunk_index());
        assert_eq!(None, result.error_message());
        assert_eq!(None, result.resume_cursor());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            "\"SUCCESS\"",
            serde_json::to_string(&TransferStatus::Success).unwrap()
        );
        assert_eq!(
            TransferStatus::Failed,
            serde_json::from_str::<TransferStatus>("\"FAILED\"").unwrap()
        );
    }
}
