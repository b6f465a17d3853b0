//! The update run: detect, compare, ask, download, install, verify, clean up.

mod install;
mod report;
mod state;

use std::time::Duration;

use extwatch_core::{
    DownloadedArtifact, ExtensionId, ExtensionSource, ScratchDir, inspect_package,
    is_update_available,
};
use extwatch_editor::{EditorCli, EditorError, detect, resolve_installed};
use log::{debug, info, warn};

use crate::consent::{ConsentChannel, ConsentRequest, ConsentResult};
use crate::error::UpdateError;

pub use report::completion_summary;
pub use state::{InstallTarget, RunOutcome, RunState};

use state::RunContext;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub extension: ExtensionId,
    pub target: InstallTarget,
    pub dry_run: bool,
    pub settle_delay: Duration,
}

pub struct Orchestrator<'a> {
    cli: &'a dyn EditorCli,
    source: &'a dyn ExtensionSource,
    consent: &'a dyn ConsentChannel,
    options: RunOptions,
    history: Vec<RunState>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        cli: &'a dyn EditorCli,
        source: &'a dyn ExtensionSource,
        consent: &'a dyn ConsentChannel,
        options: RunOptions,
    ) -> Self {
        Self {
            cli,
            source,
            consent,
            options,
            history: vec![RunState::Idle],
        }
    }

    /// States entered so far, oldest first.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    fn enter(&mut self, state: RunState) {
        debug!("-> {state:?}");
        self.history.push(state);
    }

    /// Drive one run to `Done` or `Failed`.
    pub async fn run(&mut self) -> Result<RunOutcome, UpdateError> {
        let result = self.drive().await;
        self.enter(if result.is_ok() {
            RunState::Done
        } else {
            RunState::Failed
        });

        if self.consent.is_headless()
            && !self.options.dry_run
            && let Some((title, body)) = report::notification_for(&self.options.extension, &result)
        {
            self.consent.notify(&title, &body).await;
        }

        result
    }

    async fn drive(&mut self) -> Result<RunOutcome, UpdateError> {
        self.enter(RunState::Detecting);
        let context = self.detect_and_fetch().await?;

        self.enter(RunState::Comparing);
        match context.installed_version() {
            Some(installed) if !is_update_available(Some(installed), &context.latest) => {
                info!(
                    "{} is up to date ({installed}, latest {})",
                    context.extension, context.latest
                );
                return Ok(RunOutcome::UpToDate {
                    installed: installed.clone(),
                    latest: context.latest.clone(),
                });
            }
            Some(installed) => info!("Update available: {installed} -> {}", context.latest),
            None => info!(
                "{} is not installed; {} will be a fresh install",
                context.extension, context.latest
            ),
        }

        self.enter(RunState::AwaitingConsent);
        let request = ConsentRequest::for_update(
            &context.extension,
            context.installed_version(),
            &context.latest,
        );
        match self.consent.request(&request).await {
            answer if answer.approves(&request) => {}
            ConsentResult::Selected(label) => {
                info!("Update declined ({label})");
                return Ok(RunOutcome::Declined { unavailable: None });
            }
            ConsentResult::Unavailable(reason) => {
                warn!(
                    "Could not ask for consent via {} ({reason}); skipping update",
                    self.consent.name()
                );
                return Ok(RunOutcome::Declined {
                    unavailable: Some(reason),
                });
            }
        }

        if self.options.dry_run {
            return Ok(self.rehearse(&context));
        }

        self.enter(RunState::Downloading);
        let scratch = ScratchDir::create()
            .map_err(|error| UpdateError::download(&context.latest, error))?;
        let mut artifact = DownloadedArtifact::reserve(
            scratch.artifact_path(&context.extension, &context.latest),
            context.latest.clone(),
        );

        let result = self.deliver(&context, &mut artifact).await;

        self.enter(RunState::CleaningUp);
        drop(artifact);
        drop(scratch);
        result
    }

    /// Detection plus local lookup, joined with the remote lookup.
    async fn detect_and_fetch(&self) -> Result<RunContext, UpdateError> {
        let cli = self.cli;
        let extension = &self.options.extension;

        let (local, remote) = tokio::join!(
            async {
                let editors = detect(cli).await?;
                let installed = resolve_installed(cli, &editors, extension).await;
                Ok::<_, EditorError>((editors, installed))
            },
            self.source.latest_version(extension),
        );

        let (editors, installed) = local.map_err(UpdateError::NoEditorFound)?;
        let latest = remote.map_err(|error| UpdateError::remote_unavailable(extension, error))?;
        info!("Latest {extension} version: {latest}");

        let target = match &installed {
            Some(installed) => installed.editor.clone(),
            None => editors.preferred().clone(),
        };
        debug!("Target editor: {}", target.display_name());

        Ok(RunContext {
            extension: extension.clone(),
            editors,
            installed,
            latest,
            target,
        })
    }

    async fn deliver(
        &mut self,
        context: &RunContext,
        artifact: &mut DownloadedArtifact,
    ) -> Result<RunOutcome, UpdateError> {
        let size = self
            .source
            .download_package(&context.extension, &context.latest, artifact.path())
            .await
            .map_err(|error| UpdateError::download(&context.latest, error))?;
        artifact.record_size(size);
        info!("Downloaded {} {} MB", artifact.version(), artifact.size_mb());

        inspect_package(artifact.path(), &context.extension, &context.latest)
            .map_err(|error| UpdateError::download(&context.latest, error))?;
        match artifact.sha256() {
            Ok(digest) => info!("Package SHA-256: {digest}"),
            Err(error) => warn!("Could not hash package: {error}"),
        }

        self.enter(RunState::Installing);
        let editors =
            install::install_package(self.cli, context, self.options.target, artifact.path())
                .await?;

        self.enter(RunState::Verifying);
        install::verify(self.cli, context, self.options.settle_delay).await?;

        Ok(RunOutcome::Installed {
            previous: context.installed_version().cloned(),
            version: artifact.version().clone(),
            editors,
            size_mb: artifact.size_mb(),
        })
    }

    fn rehearse(&self, context: &RunContext) -> RunOutcome {
        let editors = context
            .install_targets(self.options.target)
            .into_iter()
            .map(|editor| editor.display_name())
            .collect::<Vec<_>>();

        info!(
            "[dry run] Would download {}",
            self.source
                .package_url(&context.extension, &context.latest)
        );
        info!("[dry run] Would install into {}", editors.join(", "));
        info!(
            "[dry run] Would verify {} in {} and remove the package",
            context.latest,
            context.target.display_name()
        );

        RunOutcome::Rehearsed {
            previous: context.installed_version().cloned(),
            version: context.latest.clone(),
            editors,
        }
    }
}
