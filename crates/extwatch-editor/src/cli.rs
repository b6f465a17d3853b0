use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use extwatch_platform::HideWindow;
use log::debug;
use tokio::process::Command;

use crate::detection::DetectedEditor;
use crate::error::EditorError;

/// The three editor CLI operations extwatch relies on.
#[async_trait]
pub trait EditorCli: Send + Sync {
    /// Run the version probe and return its standard output.
    async fn probe(&self, editor: &DetectedEditor) -> Result<String, EditorError>;

    /// Return the raw extension listing.
    async fn list_extensions(&self, editor: &DetectedEditor) -> Result<String, EditorError>;

    /// Install a local VSIX package.
    async fn install_extension(
        &self,
        editor: &DetectedEditor,
        package: &Path,
    ) -> Result<(), EditorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliTimeouts {
    pub probe: Duration,
    pub list: Duration,
    pub install: Duration,
}

impl Default for CliTimeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(5),
            list: Duration::from_secs(10),
            install: Duration::from_secs(120),
        }
    }
}

/// Runs the real editor executables as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessCli {
    timeouts: CliTimeouts,
}

impl ProcessCli {
    #[must_use]
    pub fn new(timeouts: CliTimeouts) -> Self {
        Self { timeouts }
    }

    fn build_command(editor: &DetectedEditor, args: &[&str], package: Option<&Path>) -> Command {
        let mut command = Command::new(&editor.command);
        command.args(args);
        if let Some(package) = package {
            command.arg(package);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .hide_window();
        command
    }

    async fn execute(
        editor: &DetectedEditor,
        args: &[&str],
        package: Option<&Path>,
        limit: Duration,
    ) -> Result<String, EditorError> {
        let label = format!("{} {}", editor.command.display(), args.join(" "));
        debug!("Running: {label}");

        let output = tokio::time::timeout(
            limit,
            Self::build_command(editor, args, package).output(),
        )
        .await
        .map_err(|_| EditorError::Timeout {
            command: label.clone(),
            seconds: limit.as_secs(),
        })??;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(EditorError::CommandFailed {
                command: label,
                status: output.status.to_string(),
            })
        }
    }
}

#[async_trait]
impl EditorCli for ProcessCli {
    async fn probe(&self, editor: &DetectedEditor) -> Result<String, EditorError> {
        Self::execute(
            editor,
            editor.descriptor.version_probe_args,
            None,
            self.timeouts.probe,
        )
        .await
    }

    async fn list_extensions(&self, editor: &DetectedEditor) -> Result<String, EditorError> {
        Self::execute(
            editor,
            editor.descriptor.list_extensions_args,
            None,
            self.timeouts.list,
        )
        .await
    }

    async fn install_extension(
        &self,
        editor: &DetectedEditor,
        package: &Path,
    ) -> Result<(), EditorError> {
        let output = Self::execute(
            editor,
            editor.descriptor.install_args,
            Some(package),
            self.timeouts.install,
        )
        .await?;
        for line in output.lines().filter(|line| !line.trim().is_empty()) {
            debug!("{}: {}", editor.descriptor.display_name, line.trim());
        }
        Ok(())
    }
}
