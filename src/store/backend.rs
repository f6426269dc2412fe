//! `opendal` backed object store
//!
//! Maps the [`ObjectStore`] calls onto an `opendal::Operator`:
//!
//! - `put`: chunked writer with `part_size` chunks and `concurrency` parts
//!   in flight, fed from the upload body one part at a time
//! - `get`: stat for the length, then a chunked concurrent reader streamed
//!   into the sink at increasing offsets
//! - `delete`: plain delete
//! - `head`: stat raced against the run deadline

use super::{read_part, ObjectStore, TransferOptions};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::util::deadline::Deadline;
use crate::util::sink::NullSink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use futures::TryStreamExt;
use opendal::layers::LoggingLayer;
use opendal::services::{Memory, S3};
use opendal::{ErrorKind, Operator, Writer};
use std::io::Read;
use tracing::debug;

/// Endpoint value selecting the in-process memory service
pub const MEMORY_ENDPOINT: &str = "memory";

/// Object store over an `opendal` operator bound to one bucket
#[derive(Debug, Clone)]
pub struct OpendalStore {
    op: Operator,
    bucket: String,
}

impl OpendalStore {
    pub fn new(op: Operator, bucket: impl Into<String>) -> Self {
        Self {
            op,
            bucket: bucket.into(),
        }
    }

    /// In-process memory service, mostly useful for smoke runs and tests
    pub fn memory(bucket: impl Into<String>) -> Result<Self> {
        let op = Operator::new(Memory::default())
            .context("Failed to build memory operator")?
            .finish();
        Ok(Self::new(op, bucket))
    }

    /// Build the store described by `config`
    ///
    /// An endpoint of `memory` selects the memory service; anything else is
    /// treated as S3. An empty endpoint (or `aws`) uses AWS's own endpoints.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let mut store = if config.endpoint == MEMORY_ENDPOINT {
            Self::memory(config.bucket.as_str())?
        } else {
            Self::s3(config)?
        };

        if config.debug {
            store.op = store.op.layer(LoggingLayer::default());
        }
        Ok(store)
    }

    fn s3(config: &StoreConfig) -> Result<Self> {
        let mut builder = S3::default()
            .root("/")
            .bucket(&config.bucket)
            .region(&config.region);

        if !config.endpoint.is_empty() && config.endpoint != "aws" {
            builder = builder.endpoint(&config.endpoint);
        }
        if let Some(access_key) = &config.access_key {
            builder = builder.access_key_id(access_key);
        }
        if let Some(secret_key) = &config.secret_key {
            builder = builder.secret_access_key(secret_key);
        }
        if virtual_host_style(config) {
            builder = builder.enable_virtual_host_style();
        }

        let op = Operator::new(builder)
            .with_context(|| format!("Failed to build S3 operator for bucket {}", config.bucket))?
            .finish();
        Ok(Self::new(op, config.bucket.as_str()))
    }
}

/// Custom endpoints are addressed path-style (their hostname is used as
/// given); AWS's own endpoints use virtual-host style unless `--pathstyle`.
fn virtual_host_style(config: &StoreConfig) -> bool {
    let aws = config.endpoint.is_empty() || config.endpoint == "aws";
    aws && !config.path_style
}

fn store_error(key: &str, err: opendal::Error) -> StoreError {
    if matches!(err.kind(), ErrorKind::NotFound) {
        StoreError::NotFound {
            key: key.to_string(),
        }
    } else {
        StoreError::backend(key, err)
    }
}

async fn write_parts(
    writer: &mut Writer,
    key: &str,
    body: &mut (dyn Read + Send),
    part_size: usize,
) -> Result<(), StoreError> {
    let mut part = BytesMut::zeroed(part_size);
    loop {
        let n = read_part(body, &mut part).map_err(|source| StoreError::Body {
            key: key.to_string(),
            source,
        })?;
        if n == 0 {
            return Ok(());
        }
        // hand the filled prefix to the writer without copying it
        let chunk = part.split_to(n).freeze();
        part.resize(part_size, 0);
        writer.write(chunk).await.map_err(|e| store_error(key, e))?;
    }
}

#[async_trait]
impl ObjectStore for OpendalStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        body: &mut (dyn Read + Send),
        opts: TransferOptions,
    ) -> Result<(), StoreError> {
        let mut writer = self
            .op
            .writer_with(key)
            .chunk(opts.part_size)
            .concurrent(opts.concurrency)
            .await
            .map_err(|e| store_error(key, e))?;

        match write_parts(&mut writer, key, body, opts.part_size).await {
            Ok(()) => writer
                .close()
                .await
                .map(|_| ())
                .map_err(|e| store_error(key, e)),
            Err(err) => {
                if let Err(abort_err) = writer.abort().await {
                    debug!(key, error = %abort_err, "abort after failed upload also failed");
                }
                Err(err)
            }
        }
    }

    async fn get(
        &self,
        key: &str,
        opts: TransferOptions,
        sink: &NullSink,
    ) -> Result<u64, StoreError> {
        let len = self
            .op
            .stat(key)
            .await
            .map_err(|e| store_error(key, e))?
            .content_length();

        let reader = self
            .op
            .reader_with(key)
            .chunk(opts.part_size)
            .concurrent(opts.concurrency)
            .await
            .map_err(|e| store_error(key, e))?;
        let stream = reader
            .into_bytes_stream(0..len)
            .await
            .map_err(|e| store_error(key, e))?;
        let mut stream = std::pin::pin!(stream);

        let mut offset = 0u64;
        while let Some(chunk) = stream
            .try_next()
            .await
            .map_err(|e| StoreError::backend(key, e))?
        {
            sink.write_at(offset, &chunk);
            offset += chunk.len() as u64;
        }
        Ok(offset)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.op.delete(key).await.map_err(|e| store_error(key, e))
    }

    async fn head(&self, key: &str, deadline: &Deadline) -> Result<(), StoreError> {
        deadline
            .guard(async {
                self.op
                    .stat(key)
                    .await
                    .map(|_| ())
                    .map_err(|e| store_error(key, e))
            })
            .await
    }
}
