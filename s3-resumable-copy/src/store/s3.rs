/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, MetadataDirective};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::Instrument;

use crate::error::{self, Error};
use crate::store::ObjectStore;
use crate::types::{CompletedChunk, ObjectId};

/// [`ObjectStore`] backed by Amazon S3.
///
/// Side metadata is user metadata (`x-amz-meta-*`). Updating it on an existing object is a
/// self-copy with `MetadataDirective::Replace`; on an absent key an empty object carrying
/// the metadata is created.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Create a new store using the given S3 client
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// The Amazon S3 client used to send requests
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }

    async fn head(
        &self,
        object: &ObjectId,
    ) -> Result<Option<aws_sdk_s3::operation::head_object::HeadObjectOutput>, Error> {
        let resp = self
            .client
            .head_object()
            .bucket(object.bucket())
            .key(object.key())
            .send()
            .instrument(tracing::debug_span!("send-head-object"))
            .await;

        match resp {
            Ok(output) => Ok(Some(output)),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                let err = Error::from(err);
                if not_found || err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }
}

fn part_number(chunk_index: u32) -> Result<i32, Error> {
    i32::try_from(chunk_index)
        .map_err(|_| error::invalid_input(format!("chunk index {chunk_index} is too large")))
}

/// Characters escaped in `x-amz-copy-source`; path separators and unreserved marks stay as is
const COPY_SOURCE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// URL-encode a `bucket/key` pair for use as `x-amz-copy-source`
fn copy_source(object: &ObjectId) -> String {
    let raw = format!("{}/{}", object.bucket(), object.key());
    utf8_percent_encode(&raw, COPY_SOURCE_ENCODE_SET).to_string()
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn stat(&self, object: &ObjectId) -> Result<u64, Error> {
        let head = self
            .head(object)
            .await?
            .ok_or_else(|| error::not_found(format!("no such key: {object}")))?;
        let length = head
            .content_length()
            .ok_or_else(|| error::store_error(format!("missing content length for {object}")))?;
        u64::try_from(length)
            .map_err(|_| error::store_error(format!("invalid content length {length} for {object}")))
    }

    async fn read_range(
        &self,
        object: &ObjectId,
        start: u64,
        end_inclusive: u64,
    ) -> Result<Bytes, Error> {
        let resp = self
            .client
            .get_object()
            .bucket(object.bucket())
            .key(object.key())
            .range(format!("bytes={start}-{end_inclusive}"))
            .send()
            .instrument(tracing::debug_span!("send-ranged-get-object"))
            .await?;
        let body = resp.body.collect().await?;
        Ok(body.into_bytes())
    }

    async fn init_chunked_upload(&self, object: &ObjectId) -> Result<String, Error> {
        let resp = self
            .client
            .create_multipart_upload()
            .bucket(object.bucket())
            .key(object.key())
            .send()
            .instrument(tracing::debug_span!("send-create-multipart-upload"))
            .await?;
        resp.upload_id()
            .map(str::to_owned)
            .ok_or_else(|| error::store_error("CreateMultipartUpload returned no upload ID"))
    }

    async fn upload_chunk(
        &self,
        object: &ObjectId,
        session_token: &str,
        chunk_index: u32,
        data: Bytes,
    ) -> Result<String, Error> {
        let content_length = data.len() as i64;
        let resp = self
            .client
            .upload_part()
            .bucket(object.bucket())
            .key(object.key())
            .upload_id(session_token)
            .part_number(part_number(chunk_index)?)
            .content_length(content_length)
            .body(ByteStream::from(data))
            .send()
            .instrument(tracing::debug_span!("send-upload-part", chunk_index))
            .await?;
        resp.e_tag()
            .map(|tag| tag.trim_matches('"').to_owned())
            .ok_or_else(|| {
                error::store_error(format!("UploadPart returned no ETag for chunk {chunk_index}"))
            })
    }

    async fn finalize(
        &self,
        object: &ObjectId,
        session_token: &str,
        chunks: &[CompletedChunk],
    ) -> Result<(), Error> {
        let parts = chunks
            .iter()
            .map(|chunk| {
                Ok(CompletedPart::builder()
                    .part_number(part_number(chunk.chunk_index())?)
                    .e_tag(chunk.content_tag())
                    .build())
            })
            .collect::<Result<Vec<_>, Error>>()?;

        self.client
            .complete_multipart_upload()
            .bucket(object.bucket())
            .key(object.key())
            .upload_id(session_token)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .instrument(tracing::debug_span!("send-complete-multipart-upload"))
            .await?;
        Ok(())
    }

    async fn abort(&self, object: &ObjectId, session_token: &str) -> Result<(), Error> {
        self.client
            .abort_multipart_upload()
            .bucket(object.bucket())
            .key(object.key())
            .upload_id(session_token)
            .send()
            .instrument(tracing::debug_span!("send-abort-multipart-upload"))
            .await?;
        Ok(())
    }

    async fn get_side_metadata(
        &self,
        object: &ObjectId,
        key: &str,
    ) -> Result<Option<String>, Error> {
        let head = self.head(object).await?;
        Ok(head
            .as_ref()
            .and_then(|h| h.metadata())
            .and_then(|m| m.get(key))
            .cloned())
    }

    async fn set_side_metadata(
        &self,
        object: &ObjectId,
        key: &str,
        value: &str,
    ) -> Result<(), Error> {
        match self.head(object).await? {
            Some(head) => {
                let mut metadata = head.metadata().cloned().unwrap_or_default();
                metadata.insert(key.to_owned(), value.to_owned());
                self.client
                    .copy_object()
                    .bucket(object.bucket())
                    .key(object.key())
                    .copy_source(copy_source(object))
                    .metadata_directive(MetadataDirective::Replace)
                    .set_metadata(Some(metadata))
                    .set_content_type(head.content_type().map(str::to_owned))
                    .send()
                    .instrument(tracing::debug_span!("send-copy-object-replace-metadata"))
                    .await?;
            }
            None => {
                let metadata = HashMap::from([(key.to_owned(), value.to_owned())]);
                self.client
                    .put_object()
                    .bucket(object.bucket())
                    .key(object.key())
                    .body(ByteStream::from_static(b""))
                    .set_metadata(Some(metadata))
                    .send()
                    .instrument(tracing::debug_span!("send-put-object-metadata"))
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::copy_object::CopyObjectOutput;
    use aws_sdk_s3::operation::get_object::GetObjectOutput;
    use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::operation::upload_part::{UploadPartError, UploadPartOutput};
    use aws_sdk_s3::types::error::NotFound;
    use aws_sdk_s3::Client;
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};

    fn object() -> ObjectId {
        ObjectId::new("test-bucket", "dir/my key+1")
    }

    #[test]
    fn test_copy_source_encoding() {
        assert_eq!("test-bucket/dir/my%20key%2B1", copy_source(&object()));
        let unicode = ObjectId::new("test-bucket", "reports/2024_q1~final-é.csv");
        assert_eq!(
            "test-bucket/reports/2024_q1~final-%C3%A9.csv",
            copy_source(&unicode)
        );
    }

    #[tokio::test]
    async fn test_stat() {
        let head = mock!(Client::head_object)
            .match_requests(|r| r.bucket() == Some("test-bucket") && r.key() == Some("dir/my key+1"))
            .then_output(|| HeadObjectOutput::builder().content_length(12345).build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&head]);
        let store = S3ObjectStore::new(client);

        assert_eq!(12345, store.stat(&object()).await.unwrap());
    }

    #[tokio::test]
    async fn test_stat_not_found() {
        let head = mock!(Client::head_object)
            .then_error(|| HeadObjectError::NotFound(NotFound::builder().build()));
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&head]);
        let store = S3ObjectStore::new(client);

        let err = store.stat(&object()).await.unwrap_err();
        assert_eq!(&ErrorKind::NotFound, err.kind());
    }

    #[tokio::test]
    async fn test_read_range_sends_inclusive_range() {
        let get = mock!(Client::get_object)
            .match_requests(|r| r.range() == Some("bytes=5242880-10485759"))
            .then_output(|| {
                GetObjectOutput::builder()
                    .body(ByteStream::from_static(b"chunk-data"))
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&get]);
        let store = S3ObjectStore::new(client);

        let data = store
            .read_range(&object(), 5_242_880, 10_485_759)
            .await
            .unwrap();
        assert_eq!(Bytes::from_static(b"chunk-data"), data);
    }

    #[tokio::test]
    async fn test_upload_chunk_strips_etag_quotes() {
        let upload = mock!(Client::upload_part)
            .match_requests(|r| {
                r.upload_id() == Some("upload-1")
                    && r.part_number() == Some(2)
                    && r.content_length() == Some(4)
            })
            .then_output(|| UploadPartOutput::builder().e_tag("\"etag-2\"").build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&upload]);
        let store = S3ObjectStore::new(client);

        let tag = store
            .upload_chunk(&object(), "upload-1", 2, Bytes::from_static(b"data"))
            .await
            .unwrap();
        assert_eq!("etag-2", tag);
    }

    #[tokio::test]
    async fn test_upload_chunk_no_such_upload() {
        let upload = mock!(Client::upload_part).then_error(|| {
            UploadPartError::generic(ErrorMetadata::builder().code("NoSuchUpload").build())
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&upload]);
        let store = S3ObjectStore::new(client);

        let err = store
            .upload_chunk(&object(), "gone", 1, Bytes::from_static(b"data"))
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::NotFound, err.kind());
    }

    #[tokio::test]
    async fn test_get_side_metadata() {
        let head = mock!(Client::head_object).then_output(|| {
            HeadObjectOutput::builder()
                .metadata("upload-parts", "[]")
                .build()
        });
        let missing = mock!(Client::head_object).then_error(|| {
            HeadObjectError::generic(ErrorMetadata::builder().code("NotFound").build())
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&head, &missing]);
        let store = S3ObjectStore::new(client);

        assert_eq!(
            Some("[]".to_owned()),
            store.get_side_metadata(&object(), "upload-parts").await.unwrap()
        );
        assert_eq!(
            None,
            store.get_side_metadata(&object(), "upload-parts").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_set_side_metadata_on_existing_object_replaces_via_copy() {
        let head = mock!(Client::head_object).then_output(|| {
            HeadObjectOutput::builder()
                .metadata("owner", "team-a")
                .content_type("application/octet-stream")
                .build()
        });
        let copy = mock!(Client::copy_object)
            .match_requests(|r| {
                let metadata = r.metadata().expect("metadata set");
                r.copy_source() == Some("test-bucket/dir/my%20key%2B1")
                    && r.metadata_directive() == Some(&MetadataDirective::Replace)
                    && metadata.get("owner").map(String::as_str) == Some("team-a")
                    && metadata.get("upload-parts").map(String::as_str) == Some("[]")
                    && r.content_type() == Some("application/octet-stream")
            })
            .then_output(|| CopyObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&head, &copy]);
        let store = S3ObjectStore::new(client);

        store
            .set_side_metadata(&object(), "upload-parts", "[]")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_side_metadata_on_absent_object_creates_it() {
        let head = mock!(Client::head_object)
            .then_error(|| HeadObjectError::NotFound(NotFound::builder().build()));
        let put = mock!(Client::put_object)
            .match_requests(|r| {
                r.metadata()
                    .and_then(|m| m.get("upload-parts"))
                    .map(String::as_str)
                    == Some("[]")
            })
            .then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&head, &put]);
        let store = S3ObjectStore::new(client);

        store
            .set_side_metadata(&object(), "upload-parts", "[]")
            .await
            .unwrap();
    }
}
