use std::path::Path;
use std::time::Duration;

use extwatch_editor::{EditorCli, resolve_installed};
use log::{info, warn};

use super::state::{InstallTarget, RunContext};
use crate::error::UpdateError;

/// Install into the editors `mode` selects. Broadcast installs only fail
/// when no editor accepted the package.
pub(super) async fn install_package(
    cli: &dyn EditorCli,
    context: &RunContext,
    mode: InstallTarget,
    package: &Path,
) -> Result<Vec<&'static str>, UpdateError> {
    let targets = context.install_targets(mode);
    let mut installed = Vec::with_capacity(targets.len());
    let mut last_error = None;

    for editor in targets {
        info!("Installing {} into {}", context.latest, editor.display_name());
        match cli.install_extension(editor, package).await {
            Ok(()) => installed.push(editor.display_name()),
            Err(error) if mode == InstallTarget::AllDetected => {
                warn!("Install into {} failed: {error}", editor.display_name());
                last_error = Some(UpdateError::install(editor.display_name(), error));
            }
            Err(error) => return Err(UpdateError::install(editor.display_name(), error)),
        }
    }

    match (installed.is_empty(), last_error) {
        (true, Some(error)) => Err(error),
        _ => Ok(installed),
    }
}

/// Re-read the installed version from the target editor after the settle
/// delay and require it to equal the version just installed.
pub(super) async fn verify(
    cli: &dyn EditorCli,
    context: &RunContext,
    settle_delay: Duration,
) -> Result<(), UpdateError> {
    if !settle_delay.is_zero() {
        tokio::time::sleep(settle_delay).await;
    }

    let found = resolve_installed(cli, std::slice::from_ref(&context.target), &context.extension)
        .await
        .map(|installed| installed.version);

    if found.as_ref() == Some(&context.latest) {
        info!(
            "Verified {} {} in {}",
            context.extension,
            context.latest,
            context.target.display_name()
        );
        Ok(())
    } else {
        Err(UpdateError::VerificationFailed {
            editor: context.target.display_name(),
            expected: context.latest.clone(),
            found,
        })
    }
}
