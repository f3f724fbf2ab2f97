/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Resumable, checkpointed copy of a single large object between two locations in Amazon S3
//! (or any store implementing [`ObjectStore`](crate::store::ObjectStore)).
//!
//! The object is copied as a multipart upload, one part at a time. After every part the
//! list of completed parts is persisted out-of-band, so a copy interrupted by a timeout,
//! crash or restart can be continued later from the last completed part instead of from
//! zero. Each invocation returns a [`TransferResult`](crate::operation::copy::TransferResult)
//! whose resume cursor can be fed into the next invocation.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> Result<(), s3_resumable_copy::error::Error> {
//! let config = s3_resumable_copy::from_env().load().await;
//! let client = s3_resumable_copy::Client::new(config);
//!
//! let result = client
//!     .copy()
//!     .source_bucket("source-bucket")
//!     .source_key("large-object")
//!     .destination_bucket("destination-bucket")
//!     .destination_key("large-object")
//!     .send()
//!     .await?;
//!
//! if !result.is_success() {
//!     // persist the cursor somewhere and re-invoke later with `.resume(cursor)`
//!     let cursor = result.resume_cursor();
//!     # let _ = cursor;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Chunks are transferred strictly sequentially with a deliberate pause before each
//! upload (see [`Builder::pacing`](crate::config::Builder::pacing)). Concurrent invocations
//! against the same destination are not supported.

pub(crate) const MEBIBYTE: u64 = 1024 * 1024;

/// Default chunk size (5 MiB), which is also the S3 minimum for every part but the last.
pub(crate) const DEFAULT_PART_SIZE_BYTES: u64 = 5 * MEBIBYTE;

/// Maximum number of parts that a single S3 multipart upload supports
pub(crate) const MAX_PARTS: u64 = 10_000;

/// Error types emitted by `s3-resumable-copy`
pub mod error;

/// Common types used by `s3-resumable-copy`
pub mod types;

/// Object store abstraction and implementations
pub mod store;

/// Persistence of per-chunk progress between invocations
pub mod progress;

/// Copy client
pub mod client;

/// Copy operations
pub mod operation;

/// Copy configuration
pub mod config;

/// Payload mapping for host-triggered invocations
pub mod event;

pub use self::client::Client;
use self::config::loader::ConfigLoader;
pub use self::config::Config;

/// Create a config loader
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}
