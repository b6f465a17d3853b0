use std::ffi::OsString;
use std::iter::{Chain, Once};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::cli::EditorCli;
use crate::error::EditorError;
use crate::registry::{EditorDescriptor, EditorKind, REGISTRY};

/// An editor whose CLI answered the version probe.
#[derive(Debug, Clone)]
pub struct DetectedEditor {
    pub descriptor: &'static EditorDescriptor,
    pub command: PathBuf,
    /// First line of the probe output.
    pub cli_version: Option<String>,
    pub extensions_dir: Option<PathBuf>,
}

impl DetectedEditor {
    #[must_use]
    pub fn new(descriptor: &'static EditorDescriptor, command: PathBuf) -> Self {
        Self {
            descriptor,
            command,
            cli_version: None,
            extensions_dir: None,
        }
    }

    #[must_use]
    pub fn with_extensions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extensions_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> EditorKind {
        self.descriptor.kind
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        self.descriptor.display_name
    }
}

/// Editors that answered the probe, most preferred first. Never empty.
#[derive(Debug, Clone)]
pub struct DetectedEditors {
    preferred: DetectedEditor,
    others: Vec<DetectedEditor>,
}

impl DetectedEditors {
    fn from_sorted(found: Vec<DetectedEditor>) -> Option<Self> {
        let mut found = found.into_iter();
        let preferred = found.next()?;
        Some(Self {
            preferred,
            others: found.collect(),
        })
    }

    /// The highest-priority editor, used for fresh installs.
    #[must_use]
    pub fn preferred(&self) -> &DetectedEditor {
        &self.preferred
    }

    pub fn iter(&self) -> Iter<'_> {
        std::iter::once(&self.preferred).chain(self.others.iter())
    }
}

/// Editors in preference order.
pub type Iter<'a> = Chain<Once<&'a DetectedEditor>, std::slice::Iter<'a, DetectedEditor>>;

impl<'a> IntoIterator for &'a DetectedEditors {
    type Item = &'a DetectedEditor;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Probe every registered editor and return the ones that respond, most
/// preferred first.
///
/// # Errors
/// Returns [`EditorError::NoEditorFound`] when no editor responds.
pub async fn detect(cli: &dyn EditorCli) -> Result<DetectedEditors, EditorError> {
    let home = dirs::home_dir();
    detect_with(cli, &REGISTRY, |name| std::env::var_os(name), home.as_deref()).await
}

pub(crate) async fn detect_with(
    cli: &dyn EditorCli,
    registry: &'static [EditorDescriptor],
    env: impl Fn(&str) -> Option<OsString>,
    home: Option<&Path>,
) -> Result<DetectedEditors, EditorError> {
    let mut found = Vec::new();

    for descriptor in registry {
        let mut candidate = candidate(descriptor, &env, home);
        debug!("Probing {} ({})", descriptor.kind, candidate.command.display());
        match cli.probe(&candidate).await {
            Ok(output) => {
                candidate.cli_version = output
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(str::to_string);
                info!(
                    "Detected {} at {} ({})",
                    descriptor.display_name,
                    candidate.command.display(),
                    candidate.cli_version.as_deref().unwrap_or("unknown version")
                );
                found.push(candidate);
            }
            Err(error) => {
                info!("{} not available: {error}", descriptor.display_name);
            }
        }
    }

    found.sort_by_key(|editor| editor.descriptor.priority);
    DetectedEditors::from_sorted(found).ok_or_else(|| EditorError::NoEditorFound {
        checked: registry.iter().map(|d| d.display_name).collect(),
    })
}

fn candidate(
    descriptor: &'static EditorDescriptor,
    env: &impl Fn(&str) -> Option<OsString>,
    home: Option<&Path>,
) -> DetectedEditor {
    let overridden = env(descriptor.command_env).filter(|value| !value.is_empty());
    let command = match overridden {
        Some(path) => {
            debug!(
                "{} command taken from {}",
                descriptor.display_name, descriptor.command_env
            );
            PathBuf::from(path)
        }
        None => which::which(descriptor.default_command)
            .unwrap_or_else(|_| PathBuf::from(descriptor.default_command)),
    };
    let mut editor = DetectedEditor::new(descriptor, command);

    editor.extensions_dir = env(descriptor.extensions_dir_env)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|home| home.join(descriptor.extensions_dir)));
    editor
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::registry::descriptor;

    /// Answers probes only for the listed kinds and records what it was asked.
    struct FakeCli {
        available: Vec<EditorKind>,
        probed: Mutex<Vec<PathBuf>>,
    }

    impl FakeCli {
        fn with(available: &[EditorKind]) -> Self {
            Self {
                available: available.to_vec(),
                probed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EditorCli for FakeCli {
        async fn probe(&self, editor: &DetectedEditor) -> Result<String, EditorError> {
            self.probed
                .lock()
                .expect("probe log lock")
                .push(editor.command.clone());
            if self.available.contains(&editor.kind()) {
                Ok("1.95.0\nabc123\nx64\n".to_string())
            } else {
                Err(EditorError::CommandFailed {
                    command: editor.command.display().to_string(),
                    status: "exit status: 127".to_string(),
                })
            }
        }

        async fn list_extensions(&self, _editor: &DetectedEditor) -> Result<String, EditorError> {
            Ok(String::new())
        }

        async fn install_extension(
            &self,
            _editor: &DetectedEditor,
            _package: &Path,
        ) -> Result<(), EditorError> {
            Ok(())
        }
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), OsString::from(v)))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn detects_editors_in_priority_order() {
        let cli = FakeCli::with(&[EditorKind::VsCode, EditorKind::Cursor]);

        let editors = detect_with(&cli, &REGISTRY, env_from(&[]), None)
            .await
            .expect("editors should be detected");

        let kinds = editors.iter().map(DetectedEditor::kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![EditorKind::Cursor, EditorKind::VsCode]);
        assert_eq!(editors.preferred().kind(), EditorKind::Cursor);
        assert_eq!(editors.preferred().cli_version.as_deref(), Some("1.95.0"));
    }

    #[tokio::test]
    async fn skips_editors_that_fail_the_probe() {
        let cli = FakeCli::with(&[EditorKind::VsCode]);

        let editors = detect_with(&cli, &REGISTRY, env_from(&[]), None)
            .await
            .expect("vs code should be detected");

        assert_eq!(editors.iter().count(), 1);
        assert_eq!(editors.preferred().kind(), EditorKind::VsCode);
    }

    #[tokio::test]
    async fn no_responding_editor_is_an_error() {
        let cli = FakeCli::with(&[]);

        let result = detect_with(&cli, &REGISTRY, env_from(&[]), None).await;

        assert_eq!(
            result.map(|editors| editors.iter().count()),
            Err(EditorError::NoEditorFound {
                checked: vec!["Cursor", "VS Code"],
            })
        );
    }

    #[tokio::test]
    async fn environment_override_replaces_command() {
        let cli = FakeCli::with(&[EditorKind::Cursor]);
        let env = env_from(&[("CURSOR_PATH", "/opt/cursor/bin/cursor")]);

        let editors = detect_with(&cli, &REGISTRY, env, None)
            .await
            .expect("cursor should be detected");

        assert_eq!(
            editors.preferred().command,
            PathBuf::from("/opt/cursor/bin/cursor")
        );
        assert!(
            cli.probed
                .lock()
                .expect("probe log lock")
                .contains(&PathBuf::from("/opt/cursor/bin/cursor"))
        );
    }

    #[test]
    fn empty_override_is_ignored() {
        let env = env_from(&[("VSCODE_PATH", "")]);

        let editor = candidate(descriptor(EditorKind::VsCode), &env, None);

        assert_ne!(editor.command, PathBuf::new());
        assert_eq!(
            editor.command.file_stem().and_then(|stem| stem.to_str()),
            Some("code")
        );
    }

    #[test]
    fn extensions_dir_defaults_under_home() {
        let home = Path::new("/home/dev");

        let editor = candidate(descriptor(EditorKind::VsCode), &env_from(&[]), Some(home));

        assert_eq!(
            editor.extensions_dir,
            Some(PathBuf::from("/home/dev/.vscode/extensions"))
        );
    }

    #[test]
    fn extensions_dir_override_wins_over_home() {
        let env = env_from(&[("CURSOR_EXTENSIONS", "/data/cursor-ext")]);

        let editor = candidate(descriptor(EditorKind::Cursor), &env, Some(Path::new("/home/dev")));

        assert_eq!(editor.extensions_dir, Some(PathBuf::from("/data/cursor-ext")));
    }
}
