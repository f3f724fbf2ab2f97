/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use aws_smithy_async::rt::sleep::SharedAsyncSleep;
use aws_types::SdkConfig;

use crate::config::Builder;
use crate::types::{FailedTransferPolicy, PartSize, ProgressLocation};
use crate::Config;

/// Load copy [`Config`] from the environment.
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
    sdk_config: Option<SdkConfig>,
}

impl ConfigLoader {
    /// The target size of each chunk.
    ///
    /// The minimum part size is 5 MiB, any part size less than that will be rounded up.
    /// Default is [PartSize::Auto]
    pub fn part_size(mut self, part_size: PartSize) -> Self {
        self.builder = self.builder.part_size(part_size);
        self
    }

    /// Pause taken before every chunk upload. Default is 60 seconds.
    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.builder = self.builder.pacing(pacing);
        self
    }

    /// What to do with the multipart upload when a copy fails.
    pub fn failed_transfer_policy(mut self, policy: FailedTransferPolicy) -> Self {
        self.builder = self.builder.failed_transfer_policy(policy);
        self
    }

    /// Where the progress ledger is kept.
    pub fn progress_location(mut self, location: ProgressLocation) -> Self {
        self.builder = self.builder.progress_location(location);
        self
    }

    /// Metadata key the progress ledger is stored under. Default is `upload-parts`.
    pub fn progress_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.builder = self.builder.progress_metadata_key(key);
        self
    }

    /// Sleep implementation used for pacing. Defaults to Tokio.
    pub fn sleep_impl(mut self, sleep_impl: SharedAsyncSleep) -> Self {
        self.builder = self.builder.sleep_impl(sleep_impl);
        self
    }

    /// Use an already loaded AWS configuration instead of reading the environment.
    pub fn sdk_config(mut self, sdk_config: SdkConfig) -> Self {
        self.sdk_config = Some(sdk_config);
        self
    }

    /// Load the default configuration
    ///
    /// If fields have been overridden during builder construction, the override values will be
    /// used. Otherwise, the default values for each field will be provided.
    pub async fn load(self) -> Config {
        let shared_config = match self.sdk_config {
            Some(sdk_config) => sdk_config,
            None => aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await,
        };
        let s3_client = aws_sdk_s3::Client::new(&shared_config);
        self.builder.client(s3_client).build()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use aws_smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep, Sleep};
    use aws_types::region::Region;
    use aws_types::SdkConfig;

    #[derive(Debug, Clone, Default)]
    struct CountingSleep(Arc<AtomicUsize>);

    impl AsyncSleep for CountingSleep {
        fn sleep(&self, _duration: Duration) -> Sleep {
            self.0.fetch_add(1, Ordering::SeqCst);
            Sleep::new(std::future::ready(()))
        }
    }

    #[tokio::test]
    async fn test_loader_forwards_progress_key_and_sleep() {
        let sdk_config = SdkConfig::builder()
            .region(Region::new("us-east-1"))
            .build();
        let sleep = CountingSleep::default();

        let config = crate::from_env()
            .sdk_config(sdk_config)
            .progress_metadata_key("copy-ledger")
            .sleep_impl(SharedAsyncSleep::new(sleep.clone()))
            .load()
            .await;

        config.sleep_impl().sleep(Duration::from_secs(60)).await;
        assert_eq!(1, sleep.0.load(Ordering::SeqCst));
        assert!(format!("{:?}", config.progress()).contains("copy-ledger"));
    }
}
