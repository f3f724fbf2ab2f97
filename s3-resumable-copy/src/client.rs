/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::types::PartSize;
use crate::Config;
use crate::DEFAULT_PART_SIZE_BYTES;

/// Resumable copy client.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config, store, progress ledger
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: crate::Config,
}

impl Handle {
    /// Get the concrete chunk size to use for copies
    pub(crate) fn part_size_bytes(&self) -> u64 {
        match self.config.part_size() {
            PartSize::Auto => DEFAULT_PART_SIZE_BYTES,
            PartSize::Target(explicit) => *explicit,
        }
    }
}

impl Client {
    /// Creates a new client from a copy config.
    pub fn new(config: Config) -> Client {
        let handle = Arc::new(Handle { config });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Copy (or continue copying) a single object.
    ///
    /// Constructs a fluent builder for the
    /// [`Copy`](crate::operation::copy::builders::CopyFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use s3_resumable_copy::operation::copy::ResumeCursor;
    ///
    /// async fn copy_object(
    ///     client: &s3_resumable_copy::Client,
    ///     previous: Option<ResumeCursor>,
    /// ) -> Result<(), s3_resumable_copy::error::Error> {
    ///     let result = client
    ///         .copy()
    ///         .source_bucket("source-bucket")
    ///         .source_key("my-key")
    ///         .destination_bucket("destination-bucket")
    ///         .destination_key("my-key")
    ///         .set_resume(previous)
    ///         .send()
    ///         .await?;
    ///
    ///     println!("copy finished with status {:?}", result.status());
    ///     Ok(())
    /// }
    /// ```
    pub fn copy(&self) -> crate::operation::copy::builders::CopyFluentBuilder {
        crate::operation::copy::builders::CopyFluentBuilder::new(self.handle.clone())
    }
}
