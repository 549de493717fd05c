//! S3-compatible object store.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use tracing::{debug, info};

use sharegate_core::config::S3StorageConfig;
use sharegate_core::error::{AppError, ErrorKind};
use sharegate_core::result::AppResult;
use sharegate_core::traits::storage::{ObjectStore, Transfer};

/// Object store backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from configuration. Empty credentials fall back to
    /// the default AWS provider chain; an empty endpoint means AWS itself.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration("storage.s3.bucket must be set"));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "sharegate",
            ));
        }
        let shared = loader.load().await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.force_path_style);
        if !config.endpoint.is_empty() {
            builder = builder.endpoint_url(&config.endpoint);
        }

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = %config.endpoint,
            "Initializing S3 object store"
        );
        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }
}

fn s3_error(kind: ErrorKind, context: String) -> impl FnOnce(aws_sdk_s3::Error) -> AppError {
    move |e| AppError::with_source(kind, context, e)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn presign(&self, object: &str, transfer: Transfer, ttl: Duration) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Invalid presign lifetime", e)
        })?;

        let request = match transfer {
            Transfer::Upload => self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(object)
                .presigned(presigning)
                .await
                .map_err(aws_sdk_s3::Error::from)
                .map_err(s3_error(ErrorKind::Storage, format!("Failed to presign upload of {object}")))?,
            Transfer::Download => self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(object)
                .presigned(presigning)
                .await
                .map_err(aws_sdk_s3::Error::from)
                .map_err(s3_error(ErrorKind::Storage, format!("Failed to presign download of {object}")))?,
        };

        Ok(request.uri().to_string())
    }

    async fn health_check(&self) -> AppResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)
            .map_err(s3_error(
                ErrorKind::BackendUnavailable,
                format!("Bucket {} is not reachable", self.bucket),
            ))?;
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(format!("{}/{from}", self.bucket))
            .key(to)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)
            .map_err(s3_error(ErrorKind::Storage, format!("Failed to copy {from} -> {to}")))?;
        debug!(from, to, "Copied object");
        Ok(())
    }

    async fn head_object(&self, object: &str) -> AppResult<u64> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(object)
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_not_found() {
                    AppError::not_found("Object not found")
                } else {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to stat object: {object}"),
                        service,
                    )
                }
            })?;
        Ok(output.content_length().unwrap_or(0).max(0) as u64)
    }

    async fn delete(&self, object: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)
            .map_err(s3_error(ErrorKind::Storage, format!("Failed to delete object: {object}")))?;
        Ok(())
    }
}
