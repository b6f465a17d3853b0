//! Editor-independent building blocks for extwatch.
//!
//! - Extension identifiers and semantic version values.
//! - Marketplace access: latest-version resolution with a page-scrape
//!   fallback, and package downloads.
//! - Scratch storage for downloaded packages and the artifact guard that
//!   removes them.
//! - VSIX manifest inspection.

pub mod artifact;
mod extension;
pub mod gallery;
mod package;
mod version;

/// Scratch directory and self-deleting package guard.
pub use artifact::{DownloadError, DownloadedArtifact, ScratchDir};
/// `publisher.name` extension identifier.
pub use extension::{ExtensionId, ExtensionIdError};
/// Marketplace client and the seam the orchestrator depends on.
pub use gallery::{ExtensionSource, GalleryError, Marketplace};
/// VSIX manifest reader.
pub use package::{PackageError, PackageManifest, inspect_package};
/// Semantic version value and the update predicate.
pub use version::{ExtensionVersion, VersionParseError, is_update_available};
