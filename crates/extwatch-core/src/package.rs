use std::io::Read;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::extension::ExtensionId;
use crate::version::ExtensionVersion;

const MANIFEST_ENTRY: &str = "extension/package.json";

/// Identity fields of the `package.json` bundled in a VSIX.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    pub publisher: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Zip {
        context: &'static str,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("invalid package manifest: {0}")]
    Manifest(#[source] serde_json::Error),
    #[error("package contains {found}, expected {expected}")]
    Mismatch { expected: String, found: String },
}

/// Read the VSIX manifest and check it describes `extension` at `version`.
///
/// # Errors
/// Returns an error when the file is not a readable VSIX archive, has no
/// manifest, or the manifest names a different extension or version.
pub fn inspect_package(
    path: &Path,
    extension: &ExtensionId,
    version: &ExtensionVersion,
) -> Result<PackageManifest, PackageError> {
    let manifest = read_manifest(path)?;
    debug!(
        "Package manifest: {}.{}@{}",
        manifest.publisher, manifest.name, manifest.version
    );

    let version_matches = manifest
        .version
        .parse::<ExtensionVersion>()
        .is_ok_and(|found| &found == version);

    if extension.matches(&manifest.publisher, &manifest.name) && version_matches {
        Ok(manifest)
    } else {
        Err(PackageError::Mismatch {
            expected: format!("{extension}@{version}"),
            found: format!(
                "{}.{}@{}",
                manifest.publisher, manifest.name, manifest.version
            ),
        })
    }
}

fn read_manifest(path: &Path) -> Result<PackageManifest, PackageError> {
    let file = std::fs::File::open(path).map_err(|source| PackageError::Io {
        context: "failed to open package",
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| PackageError::Zip {
        context: "failed to read package archive",
        source,
    })?;
    let mut entry = archive
        .by_name(MANIFEST_ENTRY)
        .map_err(|source| PackageError::Zip {
            context: "package has no extension/package.json",
            source,
        })?;

    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|source| PackageError::Io {
            context: "failed to read package manifest",
            source,
        })?;

    serde_json::from_str(&contents).map_err(PackageError::Manifest)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_vsix(path: &Path, manifest: Option<&str>) {
        let file = std::fs::File::create(path).expect("vsix file should be created");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer
            .start_file("extension.vsixmanifest", options)
            .expect("vsix manifest entry should be started");
        writer
            .write_all(b"<PackageManifest/>")
            .expect("vsix manifest should be written");
        if let Some(manifest) = manifest {
            writer
                .start_file(MANIFEST_ENTRY, options)
                .expect("package.json entry should be started");
            writer
                .write_all(manifest.as_bytes())
                .expect("package.json should be written");
        }
        writer.finish().expect("vsix should be finalized");
    }

    fn augment() -> ExtensionId {
        "augment.vscode-augment".parse().expect("valid id in test")
    }

    #[test]
    fn inspect_package_accepts_matching_manifest() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("a.vsix");
        write_vsix(
            &path,
            Some(r#"{"publisher":"Augment","name":"vscode-augment","version":"0.512.0","main":"out/extension.js"}"#),
        );

        let manifest = inspect_package(&path, &augment(), &ExtensionVersion::new(0, 512, 0))
            .expect("manifest should match");

        assert_eq!(manifest.version, "0.512.0");
    }

    #[test]
    fn inspect_package_rejects_other_version() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("a.vsix");
        write_vsix(
            &path,
            Some(r#"{"publisher":"augment","name":"vscode-augment","version":"0.511.0"}"#),
        );

        let result = inspect_package(&path, &augment(), &ExtensionVersion::new(0, 512, 0));

        assert!(matches!(
            result,
            Err(PackageError::Mismatch { ref found, .. }) if found == "augment.vscode-augment@0.511.0"
        ));
    }

    #[test]
    fn inspect_package_requires_manifest_entry() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("a.vsix");
        write_vsix(&path, None);

        let result = inspect_package(&path, &augment(), &ExtensionVersion::new(0, 512, 0));

        assert!(matches!(result, Err(PackageError::Zip { .. })));
    }

    #[test]
    fn inspect_package_rejects_non_zip_payload() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("a.vsix");
        std::fs::write(&path, b"<html>rate limited</html>").expect("file should be written");

        let result = inspect_package(&path, &augment(), &ExtensionVersion::new(0, 512, 0));

        assert!(matches!(result, Err(PackageError::Zip { .. })));
    }
}
