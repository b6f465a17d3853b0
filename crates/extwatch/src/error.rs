use extwatch_core::{DownloadError, ExtensionVersion, GalleryError, PackageError};
use extwatch_editor::EditorError;
use thiserror::Error;

/// Why a downloaded package could not be used.
#[derive(Debug, Error)]
pub enum DownloadFailure {
    #[error(transparent)]
    Transfer(#[from] DownloadError),
    #[error(transparent)]
    Package(#[from] PackageError),
}

/// Errors that end a run with a non-zero exit code.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    NoEditorFound(EditorError),

    #[error("could not determine the latest version of {extension}: {source}")]
    RemoteVersionUnavailable {
        extension: String,
        #[source]
        source: GalleryError,
    },

    #[error("download of version {version} failed: {source}")]
    DownloadFailed {
        version: ExtensionVersion,
        #[source]
        source: DownloadFailure,
    },

    #[error("installation into {editor} failed: {source}")]
    InstallFailed {
        editor: &'static str,
        #[source]
        source: EditorError,
    },

    #[error(
        "{editor} reports {} after installing {expected}",
        .found.as_ref().map_or_else(|| "no installed version".to_string(), |v| format!("version {v}"))
    )]
    VerificationFailed {
        editor: &'static str,
        expected: ExtensionVersion,
        found: Option<ExtensionVersion>,
    },
}

impl UpdateError {
    pub fn remote_unavailable(extension: impl ToString, source: GalleryError) -> Self {
        Self::RemoteVersionUnavailable {
            extension: extension.to_string(),
            source,
        }
    }

    pub fn download(version: &ExtensionVersion, source: impl Into<DownloadFailure>) -> Self {
        Self::DownloadFailed {
            version: version.clone(),
            source: source.into(),
        }
    }

    pub fn install(editor: &'static str, source: EditorError) -> Self {
        Self::InstallFailed { editor, source }
    }

    /// Short label used in logs and notifications.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoEditorFound(_) => "no editor found",
            Self::RemoteVersionUnavailable { .. } => "remote version unavailable",
            Self::DownloadFailed { .. } => "download failed",
            Self::InstallFailed { .. } => "install failed",
            Self::VerificationFailed { .. } => "verification failed",
        }
    }
}
