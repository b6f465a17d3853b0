use extwatch_core::ExtensionId;

use super::state::RunOutcome;
use crate::error::UpdateError;

/// What to print once a run has finished successfully.
pub fn completion_summary(extension: &ExtensionId, outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::UpToDate { installed, .. } => {
            format!("{extension} is up to date ({installed}).")
        }
        RunOutcome::Declined { unavailable: None } => "Update skipped.".to_string(),
        RunOutcome::Declined {
            unavailable: Some(reason),
        } => format!("Update skipped: could not ask for confirmation ({reason})."),
        RunOutcome::Installed {
            previous,
            version,
            editors,
            size_mb,
        } => {
            let from = previous
                .as_ref()
                .map_or_else(|| "not installed".to_string(), ToString::to_string);
            [
                format!("Updated {extension}"),
                format!("  version:  {from} -> {version}"),
                format!("  editors:  {}", editors.join(", ")),
                format!("  package:  {size_mb} MB, verified, removed"),
                "Reload the editor window to activate the new version.".to_string(),
            ]
            .join("\n")
        }
        RunOutcome::Rehearsed {
            version, editors, ..
        } => format!(
            "Dry run complete: {extension} {version} would be installed into {}.",
            editors.join(", ")
        ),
    }
}

/// Title and body of the end-of-run notification, if the result warrants one.
pub(super) fn notification_for(
    extension: &ExtensionId,
    result: &Result<RunOutcome, UpdateError>,
) -> Option<(String, String)> {
    match result {
        Ok(RunOutcome::Installed { version, .. }) => Some((
            format!("{extension} updated"),
            format!("Installed version {version}. You may need to reload the editor window."),
        )),
        Ok(_) => None,
        Err(error) => Some((
            format!("{extension} update failed"),
            format!("{}: {error}", error.kind()),
        )),
    }
}
