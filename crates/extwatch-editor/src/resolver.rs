use extwatch_core::{ExtensionId, ExtensionVersion};
use log::{debug, info, warn};

use crate::cli::EditorCli;
use crate::detection::DetectedEditor;

/// Where an extension was found installed, and at which version.
#[derive(Debug, Clone)]
pub struct InstalledExtension {
    pub editor: DetectedEditor,
    pub version: ExtensionVersion,
}

/// Walk `editors` in order and return the first one that reports
/// `extension` as installed.
///
/// Listing failures are logged and treated as "not installed here".
pub async fn resolve_installed<'a>(
    cli: &dyn EditorCli,
    editors: impl IntoIterator<Item = &'a DetectedEditor>,
    extension: &ExtensionId,
) -> Option<InstalledExtension> {
    for editor in editors {
        let listing = match cli.list_extensions(editor).await {
            Ok(listing) => listing,
            Err(error) => {
                warn!(
                    "Could not list extensions for {}: {error}",
                    editor.display_name()
                );
                continue;
            }
        };

        let found = editor.descriptor.listing.installed_version(
            &listing,
            extension,
            editor.extensions_dir.as_deref(),
        );
        match found {
            Some(version) => {
                info!(
                    "Installed {extension} version: {version} ({})",
                    editor.display_name()
                );
                return Some(InstalledExtension {
                    editor: editor.clone(),
                    version,
                });
            }
            None => debug!("{extension} not found in {}", editor.display_name()),
        }
    }

    info!("{extension} is not installed in any detected editor");
    None
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use async_trait::async_trait;

    use super::*;
    use crate::error::EditorError;
    use crate::registry::{EditorKind, descriptor};

    struct CannedListings(HashMap<EditorKind, Result<String, EditorError>>);

    #[async_trait]
    impl EditorCli for CannedListings {
        async fn probe(&self, _editor: &DetectedEditor) -> Result<String, EditorError> {
            Ok(String::new())
        }

        async fn list_extensions(&self, editor: &DetectedEditor) -> Result<String, EditorError> {
            self.0
                .get(&editor.kind())
                .cloned()
                .unwrap_or_else(|| Ok(String::new()))
        }

        async fn install_extension(
            &self,
            _editor: &DetectedEditor,
            _package: &Path,
        ) -> Result<(), EditorError> {
            Ok(())
        }
    }

    fn editor(kind: EditorKind) -> DetectedEditor {
        DetectedEditor::new(descriptor(kind), PathBuf::from(descriptor(kind).default_command))
    }

    fn augment() -> ExtensionId {
        "augment.vscode-augment".parse().expect("valid id in test")
    }

    #[tokio::test]
    async fn first_editor_with_extension_wins() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        std::fs::create_dir(temp.path().join("augment.vscode-augment-0.400.0"))
            .expect("folder should be created");
        let cli = CannedListings(HashMap::from([
            (
                EditorKind::Cursor,
                Ok("augment.vscode-augment@0.511.0\n".to_string()),
            ),
            (
                EditorKind::VsCode,
                Ok("augment.vscode-augment\n".to_string()),
            ),
        ]));
        let editors = [
            editor(EditorKind::Cursor),
            editor(EditorKind::VsCode).with_extensions_dir(temp.path()),
        ];

        let installed = resolve_installed(&cli, &editors, &augment())
            .await
            .expect("extension should be found");

        assert_eq!(installed.editor.kind(), EditorKind::Cursor);
        assert_eq!(installed.version, ExtensionVersion::new(0, 511, 0));
    }

    #[tokio::test]
    async fn listing_failure_falls_through_to_next_editor() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        std::fs::create_dir(temp.path().join("augment.vscode-augment-0.400.0"))
            .expect("folder should be created");
        let cli = CannedListings(HashMap::from([
            (
                EditorKind::Cursor,
                Err(EditorError::Timeout {
                    command: "cursor --list-extensions".to_string(),
                    seconds: 10,
                }),
            ),
            (
                EditorKind::VsCode,
                Ok("augment.vscode-augment\n".to_string()),
            ),
        ]));
        let editors = [
            editor(EditorKind::Cursor),
            editor(EditorKind::VsCode).with_extensions_dir(temp.path()),
        ];

        let installed = resolve_installed(&cli, &editors, &augment())
            .await
            .expect("extension should be found in vs code");

        assert_eq!(installed.editor.kind(), EditorKind::VsCode);
        assert_eq!(installed.version, ExtensionVersion::new(0, 400, 0));
    }

    #[tokio::test]
    async fn absent_everywhere_is_none() {
        let cli = CannedListings(HashMap::from([(
            EditorKind::Cursor,
            Ok("github.copilot@1.250.0\n".to_string()),
        )]));

        let installed = resolve_installed(&cli, &[editor(EditorKind::Cursor)], &augment()).await;

        assert!(installed.is_none());
    }

    #[tokio::test]
    async fn no_editors_is_none() {
        let cli = CannedListings(HashMap::new());

        assert!(resolve_installed(&cli, std::iter::empty::<&DetectedEditor>(), &augment()).await.is_none());
    }
}
