use std::path::Path;

use extwatch_core::{ExtensionId, ExtensionVersion};
use log::{debug, warn};
use regex::Regex;

use crate::registry::ListingFormat;

impl ListingFormat {
    /// Installed version of `extension` according to this listing style.
    #[must_use]
    pub fn installed_version(
        self,
        listing: &str,
        extension: &ExtensionId,
        extensions_dir: Option<&Path>,
    ) -> Option<ExtensionVersion> {
        match self {
            Self::InlineVersion => inline_version(listing, extension),
            Self::ExtensionsFolder => {
                if !lists_extension(listing, extension) {
                    return None;
                }
                let Some(dir) = extensions_dir else {
                    warn!("{extension} is installed but no extensions directory is known");
                    return None;
                };
                folder_version(dir, extension)
            }
        }
    }
}

fn id_pattern(extension: &ExtensionId) -> String {
    regex::escape(&extension.to_string())
}

/// Version from a `publisher.name@1.2.3` line.
#[must_use]
pub fn inline_version(listing: &str, extension: &ExtensionId) -> Option<ExtensionVersion> {
    let pattern = format!(r"(?im)^\s*{}@(\S+)\s*$", id_pattern(extension));
    let re = Regex::new(&pattern).ok()?;

    re.captures_iter(listing).find_map(|caps| {
        let raw = caps.get(1)?.as_str();
        raw.parse()
            .inspect_err(|error| debug!("Ignoring listing entry {raw}: {error}"))
            .ok()
    })
}

/// Whether a bare listing names `extension` on a line of its own.
#[must_use]
pub fn lists_extension(listing: &str, extension: &ExtensionId) -> bool {
    let pattern = format!(r"(?im)^\s*{}(?:@\S+)?\s*$", id_pattern(extension));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(listing))
}

/// Highest version among `publisher.name-<version>[-<platform>]` folders.
#[must_use]
pub fn folder_version(dir: &Path, extension: &ExtensionId) -> Option<ExtensionVersion> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!("Cannot read extensions directory {}: {error}", dir.display());
            return None;
        }
    };

    let pattern = format!(
        r"(?i)^{}-(\d+\.\d+\.\d+)(?:-[a-z0-9]+)*$",
        id_pattern(extension)
    );
    let re = Regex::new(&pattern).ok()?;

    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            let version = re.captures(name)?.get(1)?.as_str().parse().ok()?;
            debug!("Found {name} in {}", dir.display());
            Some(version)
        })
        .max()
}
