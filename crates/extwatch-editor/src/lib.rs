//! Editor families extwatch can manage, and how to talk to each one's CLI.
//!
//! - [`REGISTRY`] describes every supported editor as data.
//! - [`detect`] probes the registry against the local machine.
//! - [`resolve_installed`] finds the installed version of an extension,
//!   dispatching on each editor's [`ListingFormat`].

mod cli;
mod detection;
mod error;
mod listing;
mod registry;
mod resolver;

pub use cli::{CliTimeouts, EditorCli, ProcessCli};
pub use detection::{DetectedEditor, DetectedEditors, detect};
pub use error::EditorError;
pub use listing::{folder_version, inline_version, lists_extension};
pub use registry::{EditorDescriptor, EditorKind, ListingFormat, REGISTRY, descriptor};
pub use resolver::{InstalledExtension, resolve_installed};
