use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::multipart::Field;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("flyer io: {0}")]
    Io(#[from] std::io::Error),
    #[error("reading upload body: {0}")]
    Body(String),
    #[error("unusable flyer file name {0:?}")]
    InvalidName(String),
}

/// Something that yields an upload body piece by piece.
#[async_trait]
pub trait ChunkSource: Send {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, UploadError>;
}

#[async_trait]
impl ChunkSource for Field<'_> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, UploadError> {
        self.chunk()
            .await
            .map_err(|e| UploadError::Body(e.body_text()))
    }
}

/// A fully received flyer that is not yet visible under its final name.
#[derive(Debug)]
pub struct StagedFlyer {
    pub name: String,
    key: String,
}

/// Where uploaded flyers end up.
///
/// Uploads are received with `stage` and only take their final name on
/// `commit`, so a rejected request never replaces an existing flyer.
#[async_trait]
pub trait FlyerStore: Send + Sync {
    async fn stage(
        &self,
        filename: &str,
        body: &mut (dyn ChunkSource + '_),
    ) -> Result<StagedFlyer, UploadError>;

    /// Publishes a staged flyer and returns the name it is stored under.
    async fn commit(&self, staged: StagedFlyer) -> Result<String, UploadError>;

    async fn discard(&self, staged: StagedFlyer);

    /// Directory to serve stored flyers from, if the store is disk-backed.
    fn public_dir(&self) -> Option<&Path> {
        None
    }
}

/// Keeps the last path component only, so uploads cannot escape the store.
pub fn sanitize_filename(filename: &str) -> Result<String, UploadError> {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| UploadError::InvalidName(filename.to_string()))
}

static NEXT_STAGING_KEY: AtomicU64 = AtomicU64::new(1);

fn staging_key(name: &str) -> String {
    format!("{}-{}", NEXT_STAGING_KEY.fetch_add(1, Ordering::Relaxed), name)
}

/// `uploads` stages into `uploads.staging`, next to it and outside what is served.
fn staging_dir_for(dir: &Path) -> PathBuf {
    match dir.file_name().and_then(|n| n.to_str()) {
        Some(name) => dir.with_file_name(format!("{name}.staging")),
        None => dir.join(".staging"),
    }
}

/// Flyers written under their original name in one directory.
/// A second upload with the same name replaces the first.
pub struct DiskFlyerStore {
    dir: PathBuf,
    staging: PathBuf,
}

impl DiskFlyerStore {
    pub async fn new(dir: PathBuf) -> Result<Self, UploadError> {
        let staging = staging_dir_for(&dir);
        fs::create_dir_all(&dir).await?;
        fs::create_dir_all(&staging).await?;
        info!("flyer directory: {}", dir.display());
        Ok(Self { dir, staging })
    }

    async fn write_all(path: &Path, body: &mut (dyn ChunkSource + '_)) -> Result<u64, UploadError> {
        let mut file = fs::File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = body.next_chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }

    async fn remove_staged(&self, key: &str) {
        let path = self.staging.join(key);
        if let Err(e) = fs::remove_file(&path).await {
            warn!("could not remove staged flyer {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl FlyerStore for DiskFlyerStore {
    async fn stage(
        &self,
        filename: &str,
        body: &mut (dyn ChunkSource + '_),
    ) -> Result<StagedFlyer, UploadError> {
        let name = sanitize_filename(filename)?;
        let key = staging_key(&name);

        match Self::write_all(&self.staging.join(&key), body).await {
            Ok(bytes) => {
                info!("received flyer {:?} ({} bytes)", name, bytes);
                Ok(StagedFlyer { name, key })
            }
            Err(e) => {
                // file handle is already closed; drop the partial write
                self.remove_staged(&key).await;
                Err(e)
            }
        }
    }

    async fn commit(&self, staged: StagedFlyer) -> Result<String, UploadError> {
        let target = self.dir.join(&staged.name);
        if fs::try_exists(&target).await.unwrap_or(false) {
            warn!("flyer {:?} already exists and will be overwritten", staged.name);
        }
        let source = self.staging.join(&staged.key);
        // rename fails across filesystems; copy instead
        if fs::rename(&source, &target).await.is_err() {
            let copied = fs::copy(&source, &target).await;
            self.remove_staged(&staged.key).await;
            copied?;
        }
        info!("stored flyer {:?}", staged.name);
        Ok(staged.name)
    }

    async fn discard(&self, staged: StagedFlyer) {
        self.remove_staged(&staged.key).await;
    }

    fn public_dir(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

/// Flyers held in memory; handy when no upload directory should be touched.
#[derive(Default)]
pub struct MemoryFlyerStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    staged: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFlyerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(name).cloned()
    }

    /// True when nothing is stored or waiting to be committed.
    pub async fn is_empty(&self) -> bool {
        self.files.lock().await.is_empty() && self.staged.lock().await.is_empty()
    }
}

#[async_trait]
impl FlyerStore for MemoryFlyerStore {
    async fn stage(
        &self,
        filename: &str,
        body: &mut (dyn ChunkSource + '_),
    ) -> Result<StagedFlyer, UploadError> {
        let name = sanitize_filename(filename)?;
        let mut contents = Vec::new();
        while let Some(chunk) = body.next_chunk().await? {
            contents.extend_from_slice(&chunk);
        }
        let key = staging_key(&name);
        self.staged.lock().await.insert(key.clone(), contents);
        Ok(StagedFlyer { name, key })
    }

    async fn commit(&self, staged: StagedFlyer) -> Result<String, UploadError> {
        let contents = self
            .staged
            .lock()
            .await
            .remove(&staged.key)
            .unwrap_or_default();
        self.files.lock().await.insert(staged.name.clone(), contents);
        Ok(staged.name)
    }

    async fn discard(&self, staged: StagedFlyer) {
        self.staged.lock().await.remove(&staged.key);
    }
}
