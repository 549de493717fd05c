//! Local filesystem object store.
//!
//! Objects are files under a root directory. Presigned URLs point back at
//! this server: the token in the path is redeemed by the
//! `/api/filesystem/{upload,download}/{token}` handlers, which call
//! [`LocalObjectStore::write_stream`] and [`LocalObjectStore::read`].

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

use sharegate_auth::token::{TokenIssuer, TokenOperation};
use sharegate_core::error::{AppError, ErrorKind};
use sharegate_core::result::AppResult;
use sharegate_core::traits::storage::{ByteStream, ObjectStore, Transfer};

/// Removes a partially written file unless disarmed.
struct PartFile {
    path: PathBuf,
    armed: bool,
}

impl PartFile {
    fn new(target: &Path) -> Self {
        let mut name = target.as_os_str().to_owned();
        name.push(format!(".{}.part", Uuid::new_v4().simple()));
        Self {
            path: PathBuf::from(name),
            armed: true,
        }
    }

    async fn commit(mut self, target: &Path) -> std::io::Result<()> {
        fs::rename(&self.path, target).await?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Filesystem-backed object store.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    /// Root directory for all stored objects.
    root: PathBuf,
    /// Base URL presigned links are built on.
    public_url: String,
    issuer: TokenIssuer,
}

impl LocalObjectStore {
    /// Create a store rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: &str, public_url: &str, issuer: TokenIssuer) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_url: public_url.trim_end_matches('/').to_string(),
            issuer,
        })
    }

    /// Map an object name to a path inside the root. Anything that could
    /// escape the root is rejected.
    fn resolve(&self, object: &str) -> AppResult<PathBuf> {
        let relative = Path::new(object);
        let safe = !object.is_empty()
            && !object.contains('\0')
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            warn!(object, "Rejected object name outside the storage root");
            return Err(AppError::validation("Invalid object name"));
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Stream an object's bytes.
    pub async fn read(&self, object: &str) -> AppResult<ByteStream> {
        let path = self.resolve(object)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found("Object not found")
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open object: {object}"),
                    e,
                )
            }
        })?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    /// Write an object from a byte stream. The object appears only once
    /// the stream has been fully written; a failed or dropped write leaves
    /// any previous version in place.
    pub async fn write_stream(&self, object: &str, mut stream: ByteStream) -> AppResult<u64> {
        let path = self.resolve(object)?;
        self.ensure_parent(&path).await?;

        let part = PartFile::new(&path);
        let mut file = fs::File::create(&part.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create object: {object}"),
                e,
            )
        })?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            total_bytes += chunk.len() as u64;
            file.write_all(&chunk).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to write chunk", e)
            })?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush object", e))?;
        drop(file);

        part.commit(&path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to finalize object: {object}"),
                e,
            )
        })?;

        debug!(object, bytes = total_bytes, "Wrote object from stream");
        Ok(total_bytes)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn presign(&self, object: &str, transfer: Transfer, ttl: Duration) -> AppResult<String> {
        self.resolve(object)?;
        let token = self
            .issuer
            .issue(object, TokenOperation::from(transfer), ttl)?;
        let action = match transfer {
            Transfer::Upload => "upload",
            Transfer::Download => "download",
        };
        Ok(format!(
            "{}/api/filesystem/{action}/{token}",
            self.public_url
        ))
    }

    async fn health_check(&self) -> AppResult<()> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(AppError::backend_unavailable(
                "Storage root is not a directory",
            )),
            Err(e) => Err(AppError::with_source(
                ErrorKind::BackendUnavailable,
                "Storage root is not accessible",
                e,
            )),
        }
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;
        self.ensure_parent(&to_path).await?;

        let mut source = fs::File::open(&from_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found("Source object not found")
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to open {from}"), e)
            }
        })?;

        let part = PartFile::new(&to_path);
        let mut dest = fs::File::create(&part.path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to create {to}"), e)
        })?;
        let bytes = tokio::io::copy(&mut source, &mut dest).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to copy {from} -> {to}"), e)
        })?;
        dest.flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush copy", e))?;
        drop(dest);

        part.commit(&to_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to finalize {to}"), e)
        })?;

        debug!(from, to, bytes, "Copied object");
        Ok(())
    }

    async fn head_object(&self, object: &str) -> AppResult<u64> {
        let path = self.resolve(object)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(AppError::not_found("Object not found")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found("Object not found"))
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to stat object: {object}"),
                e,
            )),
        }
    }

    async fn delete(&self, object: &str) -> AppResult<()> {
        let path = self.resolve(object)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete object: {object}"),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;

    use super::*;

    async fn store(dir: &tempfile::TempDir) -> LocalObjectStore {
        LocalObjectStore::new(
            dir.path().to_str().unwrap(),
            "http://files.test/",
            TokenIssuer::new("local-store-test-secret"),
        )
        .await
        .unwrap()
    }

    fn body(parts: &[&'static str]) -> ByteStream {
        Box::pin(stream::iter(
            parts
                .iter()
                .map(|p| Ok::<_, std::io::Error>(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        ))
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_write_head_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let written = store
            .write_stream("owner/a.txt", body(&["hello ", "world"]))
            .await
            .unwrap();
        assert_eq!(written, 11);
        assert_eq!(store.head_object("owner/a.txt").await.unwrap(), 11);
        assert_eq!(
            collect(store.read("owner/a.txt").await.unwrap()).await,
            b"hello world"
        );

        store.delete("owner/a.txt").await.unwrap();
        store.delete("owner/a.txt").await.unwrap();
        let err = store.head_object("owner/a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_copy_leaves_source_and_no_part_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store
            .write_stream("inbox/scan.pdf", body(&["%PDF"]))
            .await
            .unwrap();

        store.copy("inbox/scan.pdf", "owner/1-scan.pdf").await.unwrap();
        assert_eq!(store.head_object("inbox/scan.pdf").await.unwrap(), 4);
        assert_eq!(store.head_object("owner/1-scan.pdf").await.unwrap(), 4);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("owner"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(&dir).await.copy("nope", "dest").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let failing: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("client went away")),
        ]));

        assert!(store.write_stream("owner/b.bin", failing).await.is_err());
        let err = store.head_object("owner/b.bin").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(std::fs::read_dir(dir.path().join("owner")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        for object in ["../escape", "/etc/passwd", "a/../../b", ""] {
            let err = store.head_object(object).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{object}");
        }
    }

    #[tokio::test]
    async fn test_presign_embeds_redeemable_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let url = store
            .presign("owner/a.txt", Transfer::Download, Duration::from_secs(60))
            .await
            .unwrap();

        let token = url
            .strip_prefix("http://files.test/api/filesystem/download/")
            .unwrap();
        let grant = TokenIssuer::new("local-store-test-secret")
            .validate_for(token, TokenOperation::Download)
            .unwrap();
        assert_eq!(grant.resource, "owner/a.txt");
    }

    #[tokio::test]
    async fn test_health_check_fails_when_root_disappears() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        assert!(store.health_check().await.is_ok());

        std::fs::remove_dir_all(dir.path()).unwrap();
        let err = store.health_check().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BackendUnavailable);
    }
}
