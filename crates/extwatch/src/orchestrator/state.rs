use extwatch_core::{ExtensionId, ExtensionVersion};
use extwatch_editor::{DetectedEditor, DetectedEditors, InstalledExtension};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Detecting,
    Comparing,
    AwaitingConsent,
    Downloading,
    Installing,
    Verifying,
    CleaningUp,
    Done,
    Failed,
}

/// Which editors receive the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallTarget {
    /// The editor the extension was found in, or the preferred editor for a
    /// fresh install.
    #[default]
    Selected,
    AllDetected,
}

impl InstallTarget {
    pub fn from_install_all(install_all: bool) -> Self {
        if install_all {
            Self::AllDetected
        } else {
            Self::Selected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    UpToDate {
        installed: ExtensionVersion,
        latest: ExtensionVersion,
    },
    Declined {
        /// Set when the consent channel could not ask at all.
        unavailable: Option<String>,
    },
    Installed {
        previous: Option<ExtensionVersion>,
        version: ExtensionVersion,
        editors: Vec<&'static str>,
        size_mb: String,
    },
    /// Dry run: everything up to consent happened, nothing was changed.
    Rehearsed {
        previous: Option<ExtensionVersion>,
        version: ExtensionVersion,
        editors: Vec<&'static str>,
    },
}

/// Everything later states need from detection and comparison.
#[derive(Debug, Clone)]
pub(crate) struct RunContext {
    pub extension: ExtensionId,
    pub editors: DetectedEditors,
    pub installed: Option<InstalledExtension>,
    pub latest: ExtensionVersion,
    /// Install and verification target.
    pub target: DetectedEditor,
}

impl RunContext {
    pub fn installed_version(&self) -> Option<&ExtensionVersion> {
        self.installed.as_ref().map(|installed| &installed.version)
    }

    pub fn install_targets(&self, mode: InstallTarget) -> Vec<&DetectedEditor> {
        match mode {
            InstallTarget::Selected => vec![&self.target],
            InstallTarget::AllDetected => self.editors.iter().collect(),
        }
    }
}
