/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;
mod input;
mod output;

mod context;
mod plan;

use std::sync::Arc;

use aws_smithy_async::rt::sleep::AsyncSleep;
use aws_smithy_types::error::display::DisplayErrorContext;

use crate::error::{self, Error, ErrorKind};
use crate::progress::ProgressStore;
use crate::store::ObjectStore;
use crate::types::{check_contiguous, CompletedChunk, FailedTransferPolicy};
use context::CopyContext;
/// Request type for resumable copies
pub use input::{ResumeCursor, TransferRequest, TransferRequestBuilder};
/// Response type for resumable copies
pub use output::{TransferResult, TransferStatus};
use plan::ChunkPlan;

/// Operation struct for a resumable single object copy
#[derive(Clone, Default, Debug)]
pub(crate) struct ResumableCopy;

impl ResumableCopy {
    /// Execute a single resumable copy.
    ///
    /// Every failure is folded into a failed [`TransferResult`].
    #[tracing::instrument(skip_all, level = "debug", name = "copy-object")]
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        request: TransferRequest,
    ) -> TransferResult {
        let ctx = CopyContext {
            handle,
            request: Arc::new(request),
        };

        let (plan, mut session) = match start_session(&ctx).await {
            Ok(started) => started,
            Err(err) => {
                tracing::debug!("copy could not be started");
                // nothing was touched, hand the caller's cursor back unchanged
                return TransferResult::failed(ctx.request().resume().cloned(), err);
            }
        };

        let outcome = match copy_chunks(&ctx, &plan, &mut session).await {
            Ok(()) => finalize(&ctx, &session).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                tracing::debug!(
                    "copied {} chunk(s) to {}",
                    session.completed.len(),
                    ctx.request().destination()
                );
                TransferResult::succeeded(session.token, session.completed)
            }
            Err(err) => {
                handle_failure(&ctx, &session).await;
                TransferResult::failed(Some(session.cursor()), err)
            }
        }
    }
}

/// The active multipart session and the chunks durably recorded for it
#[derive(Debug)]
struct Session {
    token: String,
    completed: Vec<CompletedChunk>,
}

impl Session {
    fn next_chunk_index(&self) -> u32 {
        self.completed.len() as u32 + 1
    }

    fn cursor(&self) -> ResumeCursor {
        ResumeCursor::new(
            self.token.clone(),
            self.completed.clone(),
            self.next_chunk_index(),
        )
    }
}

/// Size the source and either start a new session or pick up the one being resumed
async fn start_session(ctx: &CopyContext) -> Result<(ChunkPlan, Session), Error> {
    let request = ctx.request();
    let content_length = ctx.store().stat(request.source()).await?;
    let plan = ChunkPlan::new(content_length, ctx.handle.part_size_bytes())?;
    tracing::trace!(
        "source {} is {content_length} bytes, {} chunk(s)",
        request.source(),
        plan.num_chunks()
    );

    let session = match request.resume() {
        None => {
            let token = ctx.store().init_chunked_upload(request.destination()).await?;
            tracing::debug!("multipart upload started with upload id: {token}");
            Session {
                token,
                completed: Vec::new(),
            }
        }
        Some(cursor) => {
            let completed = ctx
                .progress()
                .load(request.destination(), cursor.session_token())
                .await?;
            check_contiguous(&completed).map_err(error::invalid_input)?;
            if completed.len() as u64 > plan.num_chunks() {
                return Err(error::invalid_input(format!(
                    "progress ledger for {} records {} chunk(s) but the source only has {}",
                    request.destination(),
                    completed.len(),
                    plan.num_chunks()
                )));
            }
            if completed.len() != cursor.completed_chunks().len() {
                tracing::debug!(
                    "progress ledger holds {} chunk(s), caller supplied {}; using the ledger",
                    completed.len(),
                    cursor.completed_chunks().len()
                );
            }
            let session = Session {
                token: cursor.session_token().to_owned(),
                completed,
            };
            tracing::debug!(
                "resuming multipart upload {} at chunk {}",
                session.token,
                session.next_chunk_index()
            );
            session
        }
    };

    Ok((plan, session))
}

/// Upload every remaining chunk, checkpointing the ledger after each one
async fn copy_chunks(
    ctx: &CopyContext,
    plan: &ChunkPlan,
    session: &mut Session,
) -> Result<(), Error> {
    let request = ctx.request();
    let store = ctx.store();
    let mut index = session.next_chunk_index();

    while let Some(range) = plan.range(index) {
        pace(ctx).await;

        let data = store
            .read_range(request.source(), *range.start(), *range.end())
            .await
            .map_err(error::chunk_failed(index))?;
        let tag = store
            .upload_chunk(request.destination(), &session.token, index, data)
            .await
            .map_err(error::chunk_failed(index))?;

        session.completed.push(CompletedChunk::new(index, tag));
        if let Err(err) = ctx
            .progress()
            .save(request.destination(), &session.token, &session.completed)
            .await
        {
            // not durably recorded, so it does not count as completed
            session.completed.pop();
            return Err(err);
        }
        tracing::trace!("chunk {index} ({range:?}) uploaded and recorded");
        index += 1;
    }

    Ok(())
}

async fn pace(ctx: &CopyContext) {
    let pacing = ctx.handle.config.pacing();
    if !pacing.is_zero() {
        tracing::trace!("pausing {pacing:?} before next chunk");
        ctx.handle.config.sleep_impl().sleep(pacing).await;
    }
}

async fn finalize(ctx: &CopyContext, session: &Session) -> Result<(), Error> {
    tracing::trace!("completing multipart upload");
    ctx.store()
        .finalize(
            ctx.request().destination(),
            &session.token,
            &session.completed,
        )
        .await
}

/// Apply the configured [`FailedTransferPolicy`] to a session that failed mid-copy
async fn handle_failure(ctx: &CopyContext, session: &Session) {
    match ctx.handle.config.failed_transfer_policy() {
        FailedTransferPolicy::Retain => {
            tracing::debug!(
                "copy failed, retaining multipart upload {} for resume",
                session.token
            );
        }
        FailedTransferPolicy::AbortUpload => {
            tracing::error!("multipart upload failed, aborting");
            if let Err(err) = ctx
                .store()
                .abort(ctx.request().destination(), &session.token)
                .await
            {
                let err = error::from_kind(ErrorKind::AbortFailed)(err);
                tracing::error!("failed to abort upload: {}", DisplayErrorContext(err));
            }
        }
    }
}
