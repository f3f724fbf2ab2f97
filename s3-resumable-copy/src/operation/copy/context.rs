/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::operation::copy::TransferRequest;
use crate::progress::SharedProgressStore;
use crate::store::SharedObjectStore;

/// Internal context used to drive a single copy operation
#[derive(Debug, Clone)]
pub(super) struct CopyContext {
    /// reference to client handle used to do actual work
    pub(super) handle: Arc<crate::client::Handle>,
    /// the original request
    pub(super) request: Arc<TransferRequest>,
}

impl CopyContext {
    /// The object store to use for data movement
    pub(super) fn store(&self) -> &SharedObjectStore {
        self.handle.config.store()
    }

    /// The ledger used to checkpoint progress
    pub(super) fn progress(&self) -> &SharedProgressStore {
        self.handle.config.progress()
    }

    /// The original request
    pub(super) fn request(&self) -> &TransferRequest {
        &self.request
    }
}
