/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::error::Error;

use super::{ResumeCursor, TransferRequestBuilder, TransferResult};

/// Fluent builder for constructing a resumable single object copy
#[derive(Debug)]
pub struct CopyFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: TransferRequestBuilder,
}

impl CopyFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Run the copy (or continue it, if a resume cursor was given).
    ///
    /// Returns `Err` only when the request itself is invalid. Every failure once the copy is
    /// under way is reported as a failed [`TransferResult`] carrying a resume cursor.
    pub async fn send(self) -> Result<TransferResult, Error> {
        let input = self.inner.build()?;
        Ok(crate::operation::copy::ResumableCopy::orchestrate(self.handle, input).await)
    }

    /// The bucket containing the source object.
    pub fn source_bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.source_bucket(input);
        self
    }

    /// The bucket containing the source object.
    pub fn set_source_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_source_bucket(input);
        self
    }

    /// The bucket containing the source object.
    pub fn get_source_bucket(&self) -> &Option<String> {
        &self.inner.source_bucket
    }

    /// The key of the source object.
    pub fn source_key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.source_key(input);
        self
    }

    /// The key of the source object.
    pub fn set_source_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_source_key(input);
        self
    }

    /// The key of the source object.
    pub fn get_source_key(&self) -> &Option<String> {
        &self.inner.source_key
    }

    /// The bucket to copy the object to.
    pub fn destination_bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.destination_bucket(input);
        self
    }

    /// The bucket to copy the object to.
    pub fn set_destination_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_destination_bucket(input);
        self
    }

    /// The bucket to copy the object to.
    pub fn get_destination_bucket(&self) -> &Option<String> {
        &self.inner.destination_bucket
    }

    /// The key to copy the object to.
    pub fn destination_key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.destination_key(input);
        self
    }

    /// The key to copy the object to.
    pub fn set_destination_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_destination_key(input);
        self
    }

    /// The key to copy the object to.
    pub fn get_destination_key(&self) -> &Option<String> {
        &self.inner.destination_key
    }

    /// Continue the copy described by `cursor`.
    pub fn resume(mut self, cursor: ResumeCursor) -> Self {
        self.inner = self.inner.resume(cursor);
        self
    }

    /// Continue the copy described by `cursor`, or start a new one if `None`.
    pub fn set_resume(mut self, cursor: Option<ResumeCursor>) -> Self {
        self.inner = self.inner.set_resume(cursor);
        self
    }

    /// The cursor this copy continues from, if any.
    pub fn get_resume(&self) -> &Option<ResumeCursor> {
        &self.inner.resume
    }
}

impl TransferRequestBuilder {
    /// Run a copy with this request using the given client.
    pub async fn send_with(self, client: &crate::Client) -> Result<TransferResult, Error> {
        let mut fluent_builder = client.copy();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}
