/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::cmp;
use std::sync::Arc;
use std::time::Duration;

use aws_smithy_async::rt::sleep::{SharedAsyncSleep, TokioSleep};

use crate::progress::{
    MetadataProgressStore, ProgressStore, SharedProgressStore, DEFAULT_PROGRESS_METADATA_KEY,
};
use crate::store::s3::S3ObjectStore;
use crate::store::{ObjectStore, SharedObjectStore};
use crate::types::{FailedTransferPolicy, PartSize, ProgressLocation};
use crate::DEFAULT_PART_SIZE_BYTES;

pub(crate) mod loader;

/// Minimum upload part size in bytes
const MIN_MULTIPART_PART_SIZE_BYTES: u64 = DEFAULT_PART_SIZE_BYTES;

/// Default pause before each chunk upload
pub(crate) const DEFAULT_PACING: Duration = Duration::from_secs(60);

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    target_part_size: PartSize,
    pacing: Duration,
    failed_transfer_policy: FailedTransferPolicy,
    sleep_impl: SharedAsyncSleep,
    store: SharedObjectStore,
    progress: SharedProgressStore,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns a reference to the target chunk size to use for copy operations
    pub fn part_size(&self) -> &PartSize {
        &self.target_part_size
    }

    /// Returns the pause taken before each chunk upload
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Returns the policy applied to the multipart upload when a copy fails
    pub fn failed_transfer_policy(&self) -> &FailedTransferPolicy {
        &self.failed_transfer_policy
    }

    /// Returns the sleep implementation used for pacing
    pub fn sleep_impl(&self) -> &SharedAsyncSleep {
        &self.sleep_impl
    }

    /// The object store that data is read from and written to
    pub fn store(&self) -> &SharedObjectStore {
        &self.store
    }

    /// The progress store used to checkpoint and resume copies
    pub fn progress(&self) -> &SharedProgressStore {
        &self.progress
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    target_part_size: PartSize,
    pacing: Option<Duration>,
    failed_transfer_policy: FailedTransferPolicy,
    progress_location: ProgressLocation,
    progress_metadata_key: Option<String>,
    sleep_impl: Option<SharedAsyncSleep>,
    store: Option<SharedObjectStore>,
    progress: Option<SharedProgressStore>,
}

impl Builder {
    /// The target size of each chunk.
    ///
    /// The minimum part size is 5 MiB, any part size less than that will be rounded up.
    /// Default is [PartSize::Auto] (5 MiB).
    pub fn part_size(self, part_size: PartSize) -> Self {
        let part_size = match part_size {
            PartSize::Target(part_size) => {
                PartSize::Target(cmp::max(part_size, MIN_MULTIPART_PART_SIZE_BYTES))
            }
            tps => tps,
        };

        self.set_target_part_size(part_size)
    }

    /// Target part size for each chunk.
    ///
    /// NOTE: This does not validate the setting and is meant for internal use only.
    pub(crate) fn set_target_part_size(mut self, part_size: PartSize) -> Self {
        self.target_part_size = part_size;
        self
    }

    /// Pause taken before every chunk upload, used to stay under store rate limits.
    ///
    /// Default is 60 seconds. `Duration::ZERO` disables pacing.
    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.pacing = Some(pacing);
        self
    }

    /// What to do with the multipart upload when a copy fails.
    ///
    /// Default is [FailedTransferPolicy::AbortUpload].
    pub fn failed_transfer_policy(mut self, policy: FailedTransferPolicy) -> Self {
        self.failed_transfer_policy = policy;
        self
    }

    /// Where the progress ledger is kept when no explicit [`progress_store`](Self::progress_store) is set.
    ///
    /// Default is a sidecar object next to the destination (see [ProgressLocation]).
    pub fn progress_location(mut self, location: ProgressLocation) -> Self {
        self.progress_location = location;
        self
    }

    /// Metadata key the ledger is stored under when no explicit
    /// [`progress_store`](Self::progress_store) is set.
    ///
    /// Default is `upload-parts`.
    pub fn progress_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.progress_metadata_key = Some(key.into());
        self
    }

    /// Sleep implementation used for pacing. Defaults to Tokio.
    pub fn sleep_impl(mut self, sleep_impl: SharedAsyncSleep) -> Self {
        self.sleep_impl = Some(sleep_impl);
        self
    }

    /// Set an explicit S3 client to use.
    pub fn client(self, client: aws_sdk_s3::Client) -> Self {
        self.store(S3ObjectStore::new(client))
    }

    /// Set the object store to copy within.
    pub fn store(mut self, store: impl ObjectStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set a shared object store to copy within.
    pub fn shared_store(mut self, store: SharedObjectStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom progress store instead of object side metadata.
    pub fn progress_store(mut self, progress: impl ProgressStore + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    pub fn build(self) -> Config {
        let store = self.store.expect("store set");
        let progress = self.progress.unwrap_or_else(|| {
            Arc::new(MetadataProgressStore::new(
                store.clone(),
                self.progress_location,
                self.progress_metadata_key
                    .unwrap_or_else(|| DEFAULT_PROGRESS_METADATA_KEY.to_owned()),
            ))
        });

        Config {
            target_part_size: self.target_part_size,
            pacing: self.pacing.unwrap_or(DEFAULT_PACING),
            failed_transfer_policy: self.failed_transfer_policy,
            sleep_impl: self
                .sleep_impl
                .unwrap_or_else(|| SharedAsyncSleep::new(TokioSleep::new())),
            store,
            progress,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::in_memory::InMemoryObjectStore;

    #[test]
    fn test_defaults() {
        let config = Config::builder().store(InMemoryObjectStore::new()).build();
        assert!(matches!(config.part_size(), PartSize::Auto));
        assert_eq!(Duration::from_secs(60), config.pacing());
        assert_eq!(
            &FailedTransferPolicy::AbortUpload,
            config.failed_transfer_policy()
        );
    }

    #[test]
    fn test_part_size_rounds_up_to_minimum() {
        let config = Config::builder()
            .store(InMemoryObjectStore::new())
            .part_size(PartSize::Target(1024))
            .build();
        assert!(matches!(
            config.part_size(),
            PartSize::Target(size) if *size == 5 * 1024 * 1024
        ));

        let config = Config::builder()
            .store(InMemoryObjectStore::new())
            .part_size(PartSize::Target(8 * 1024 * 1024))
            .build();
        assert!(matches!(
            config.part_size(),
            PartSize::Target(size) if *size == 8 * 1024 * 1024
        ));
    }

    #[test]
    #[should_panic(expected = "store set")]
    fn test_store_required() {
        Config::builder().build();
    }
}
