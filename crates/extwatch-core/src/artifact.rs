use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::extension::ExtensionId;
use crate::version::ExtensionVersion;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("download failed with status {status}")]
    Status { status: reqwest::StatusCode },
}

impl DownloadError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::io(
            context,
            std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        )
    }
}

/// Process-local directory for downloaded packages, removed with the value.
pub struct ScratchDir {
    dir: tempfile::TempDir,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp dir.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created.
    pub fn create() -> Result<Self, DownloadError> {
        let dir = tempfile::Builder::new()
            .prefix("extwatch-")
            .tempdir()
            .map_err(|error| DownloadError::io("failed to create scratch directory", error))?;
        debug!("Scratch directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn artifact_path(&self, extension: &ExtensionId, version: &ExtensionVersion) -> PathBuf {
        self.dir.path().join(format!("{extension}-{version}.vsix"))
    }
}

/// A downloaded package. The file is deleted when the value is dropped, on
/// every exit path of the run that owns it.
#[derive(Debug)]
pub struct DownloadedArtifact {
    path: PathBuf,
    version: ExtensionVersion,
    size_bytes: u64,
}

impl DownloadedArtifact {
    /// Take ownership of `path` before any bytes are written, so a partial
    /// download is removed as well.
    #[must_use]
    pub fn reserve(path: PathBuf, version: ExtensionVersion) -> Self {
        Self {
            path,
            version,
            size_bytes: 0,
        }
    }

    pub fn record_size(&mut self, size_bytes: u64) {
        self.size_bytes = size_bytes;
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn version(&self) -> &ExtensionVersion {
        &self.version
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_mb(&self) -> String {
        format!("{:.2}", self.size_bytes as f64 / (1024.0 * 1024.0))
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
    }

    /// SHA-256 of the artifact contents as lowercase hex.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn sha256(&self) -> Result<String, DownloadError> {
        sha256_file(&self.path)
    }
}

impl Drop for DownloadedArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Cleaned up: {}", self.file_name()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("Nothing to clean up at {}", self.path.display());
            }
            Err(error) => warn!("Cleanup failed for {}: {error}", self.path.display()),
        }
    }
}

pub(crate) async fn download_file(
    request: reqwest::RequestBuilder,
    dest: &Path,
) -> Result<u64, DownloadError> {
    use futures_util::StreamExt;

    let response = request
        .send()
        .await
        .map_err(|error| DownloadError::http("download request failed", error))?;

    if !response.status().is_success() {
        return Err(DownloadError::Status {
            status: response.status(),
        });
    }

    let mut downloaded: u64 = 0;
    let mut file = tokio::fs::File::create(dest).await.map_err(|error| {
        DownloadError::io_with_path("failed to create download file", dest, &error)
    })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| DownloadError::http("download stream error", error))?;
        file.write_all(&chunk).await.map_err(|error| {
            DownloadError::io_with_path("failed to write download data", dest, &error)
        })?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.map_err(|error| {
        DownloadError::io_with_path("failed to flush download file", dest, &error)
    })?;

    info!("Download complete: {downloaded} bytes");
    Ok(downloaded)
}

fn sha256_file(path: &Path) -> Result<String, DownloadError> {
    let mut file = std::fs::File::open(path).map_err(|error| {
        DownloadError::io_with_path("failed to open file for checksum", path, &error)
    })?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];

    loop {
        let read = file.read(&mut buffer).map_err(|error| {
            DownloadError::io_with_path("failed to read file for checksum", path, &error)
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn augment() -> ExtensionId {
        "augment.vscode-augment".parse().expect("valid id in test")
    }

    #[test]
    fn artifact_path_names_extension_and_version() {
        let scratch = ScratchDir::create().expect("scratch dir should be created");

        let path = scratch.artifact_path(&augment(), &ExtensionVersion::new(0, 512, 0));

        assert_eq!(path.parent(), Some(scratch.path()));
        assert!(path.ends_with("augment.vscode-augment-0.512.0.vsix"));
    }

    #[test]
    fn dropping_artifact_removes_file() {
        let scratch = ScratchDir::create().expect("scratch dir should be created");
        let path = scratch.artifact_path(&augment(), &ExtensionVersion::new(1, 0, 0));
        std::fs::write(&path, b"package").expect("artifact should be written");

        let mut artifact = DownloadedArtifact::reserve(path.clone(), ExtensionVersion::new(1, 0, 0));
        artifact.record_size(7);
        assert_eq!(artifact.version(), &ExtensionVersion::new(1, 0, 0));
        drop(artifact);

        assert!(!path.exists());
    }

    #[test]
    fn dropping_reserved_artifact_without_file_is_quiet() {
        let scratch = ScratchDir::create().expect("scratch dir should be created");
        let path = scratch.artifact_path(&augment(), &ExtensionVersion::new(1, 0, 0));

        drop(DownloadedArtifact::reserve(path.clone(), ExtensionVersion::new(1, 0, 0)));

        assert!(!path.exists());
    }

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let scratch = ScratchDir::create().expect("scratch dir should be created");
        let dir = scratch.path().to_path_buf();
        assert!(dir.is_dir());

        drop(scratch);

        assert!(!dir.exists());
    }

    #[test]
    fn size_mb_formats_two_decimals() {
        let mut artifact =
            DownloadedArtifact::reserve(PathBuf::from("/nonexistent/a.vsix"), ExtensionVersion::new(1, 0, 0));
        artifact.record_size(3 * 1024 * 1024 + 512 * 1024);

        assert_eq!(artifact.size_mb(), "3.50");
    }

    #[test]
    fn sha256_file_returns_known_digest() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let file_path = temp.path().join("payload.bin");
        std::fs::write(&file_path, b"abc").expect("payload file should be written");

        let digest = sha256_file(&file_path).expect("checksum should be computed");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
