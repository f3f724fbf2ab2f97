/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

use aws_sdk_s3::error::ProvideErrorMetadata;

/// Errors returned by this library
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of copy errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues (including a malformed resume cursor or progress ledger)
    InputInvalid,

    /// Resource not found (e.g. bucket, key, multipart upload ID not found)
    NotFound,

    /// Failed to read or upload a chunk of the object
    ChunkFailed(ChunkFailed),

    /// The object store rejected or failed a request
    StoreError,

    /// Aborting a failed multipart upload failed as well
    AbortFailed,
}

/// Stores information about failed chunk
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkFailed {
    index: u32,
}

impl ChunkFailed {
    /// The (1-based) index of the chunk that failed
    pub fn chunk_index(&self) -> u32 {
        self.index
    }
}

impl Error {
    /// Creates a new copy [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if this error indicates a missing resource
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::ChunkFailed(chunk_failed) => {
                write!(f, "failed to copy chunk {}", chunk_failed.index)
            }
            ErrorKind::StoreError => write!(f, "object store request failed"),
            ErrorKind::AbortFailed => write!(f, "failed to abort multipart upload"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl From<aws_smithy_types::byte_stream::error::Error> for Error {
    fn from(value: aws_smithy_types::byte_stream::error::Error) -> Self {
        Self::new(ErrorKind::StoreError, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn not_found<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::NotFound, err)
}

pub(crate) fn store_error<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::StoreError, err)
}

pub(crate) fn chunk_failed(index: u32) -> impl FnOnce(Error) -> Error {
    move |err| Error::new(ErrorKind::ChunkFailed(ChunkFailed { index }), err)
}

pub(crate) fn from_kind<E>(kind: ErrorKind) -> impl FnOnce(E) -> Error
where
    E: Into<BoxError>,
{
    |err| Error::new(kind, err)
}

impl<E, R> From<aws_sdk_s3::error::SdkError<E, R>> for Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: Send + Sync + fmt::Debug + 'static,
{
    fn from(value: aws_sdk_s3::error::SdkError<E, R>) -> Self {
        let kind = match value.code() {
            Some("NotFound" | "NoSuchKey" | "NoSuchUpload" | "NoSuchBucket") => ErrorKind::NotFound,
            _ => ErrorKind::StoreError,
        };

        Error::new(kind, value)
    }
}
