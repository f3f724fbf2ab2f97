/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;
use std::time;

use aws_smithy_types::error::display::DisplayErrorContext;
use clap::{CommandFactory, Parser};
use s3_resumable_copy::event::handle_event;
use s3_resumable_copy::types::{FailedTransferPolicy, PartSize, ProgressLocation};

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "copy")]
#[command(about = "Copies an S3 object to another S3 location one part at a time, resumably.")]
pub struct Args {
    /// Source object <S3Uri>
    source: Option<S3Uri>,

    /// Destination object <S3Uri>
    dest: Option<S3Uri>,

    /// Read the invocation payload (JSON) from a file instead of building it from arguments
    #[arg(long, conflicts_with_all = ["source", "dest"])]
    event: Option<PathBuf>,

    /// Part size to use
    #[arg(long, default_value_t = 5242880)]
    part_size: u64,

    /// Seconds to pause before every part upload
    #[arg(long, default_value_t = 60)]
    pacing_secs: u64,

    /// Keep the multipart upload on failure so the printed response can be re-submitted
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    retain_on_failure: bool,

    /// Record progress on the existing destination object instead of a sidecar object
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    progress_on_destination: bool,

    /// Re-submit a failed response as the next invocation up to this many times
    #[arg(long, default_value_t = 1)]
    max_invocations: u32,
}

#[derive(Clone, Debug)]
struct S3Uri {
    bucket: String,
    key: String,
}

impl FromStr for S3Uri {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s
            .strip_prefix("s3://")
            .ok_or_else(|| format!("expected an s3:// uri, got `{s}`"))?;
        match path.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(S3Uri {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            }),
            _ => Err(format!("expected s3://<bucket>/<key>, got `{s}`").into()),
        }
    }
}

fn invalid_arg(message: &str) -> ! {
    Args::command()
        .error(clap::error::ErrorKind::InvalidValue, message)
        .exit()
}

fn initial_event(args: &Args) -> Result<serde_json::Value, BoxError> {
    if let Some(path) = &args.event {
        let raw = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&raw)?);
    }

    match (&args.source, &args.dest) {
        (Some(source), Some(dest)) => Ok(serde_json::json!({
            "source_bucket": source.bucket,
            "source_key": source.key,
            "destination_bucket": dest.bucket,
            "destination_key": dest.key,
        })),
        _ => invalid_arg("either --event or both a source and destination are required"),
    }
}

/// Carry the resume fields of a failed response into the next invocation
fn next_event(mut event: serde_json::Value, response: &serde_json::Value) -> serde_json::Value {
    for field in ["upload_id", "completed_parts", "current_part_number"] {
        event[field] = response[field].clone();
    }
    event
}

async fn do_copy(args: Args) -> Result<(), BoxError> {
    let failed_transfer_policy = if args.retain_on_failure {
        FailedTransferPolicy::Retain
    } else {
        FailedTransferPolicy::AbortUpload
    };
    let progress_location = if args.progress_on_destination {
        ProgressLocation::Destination
    } else {
        ProgressLocation::default()
    };

    let config = s3_resumable_copy::from_env()
        .part_size(PartSize::Target(args.part_size))
        .pacing(time::Duration::from_secs(args.pacing_secs))
        .failed_transfer_policy(failed_transfer_policy)
        .progress_location(progress_location)
        .load()
        .await;
    let client = s3_resumable_copy::Client::new(config);

    let mut event = initial_event(&args)?;
    let start = time::Instant::now();

    for invocation in 1..=args.max_invocations.max(1) {
        tracing::info!("invocation {invocation}: {event}");
        let response = handle_event(&client, event.clone()).await;
        println!("{}", serde_json::to_string_pretty(&response)?);

        if response["status"] == "SUCCESS" {
            println!("copy completed in {:?}", start.elapsed());
            return Ok(());
        }
        event = next_event(event, &response);
    }

    Err("copy did not complete".into())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    let result = do_copy(args).await;

    if let Err(ref err) = result {
        tracing::error!("copy failed: {}", DisplayErrorContext(err.as_ref()));
    }

    result
}
