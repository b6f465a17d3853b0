/// Supported editor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    Cursor,
    VsCode,
}

impl EditorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::VsCode => "vscode",
        }
    }
}

impl std::fmt::Display for EditorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an editor's extension listing reports versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    /// One `publisher.name@1.2.3` entry per line.
    InlineVersion,
    /// Bare identifiers; the version is read from the
    /// `publisher.name-<version>` folder in the extensions directory.
    ExtensionsFolder,
}

#[derive(Debug, PartialEq, Eq)]
pub struct EditorDescriptor {
    pub kind: EditorKind,
    pub display_name: &'static str,
    pub default_command: &'static str,
    /// Environment variable holding a replacement for `default_command`.
    pub command_env: &'static str,
    pub version_probe_args: &'static [&'static str],
    pub list_extensions_args: &'static [&'static str],
    /// The package path is appended after these.
    pub install_args: &'static [&'static str],
    /// Environment variable overriding `extensions_dir`.
    pub extensions_dir_env: &'static str,
    /// Relative to the home directory.
    pub extensions_dir: &'static str,
    pub listing: ListingFormat,
    /// Lower is preferred.
    pub priority: u8,
}

pub static REGISTRY: [EditorDescriptor; 2] = [
    EditorDescriptor {
        kind: EditorKind::Cursor,
        display_name: "Cursor",
        default_command: "cursor",
        command_env: "CURSOR_PATH",
        version_probe_args: &["--version"],
        list_extensions_args: &["--list-extensions", "--show-versions"],
        install_args: &["--install-extension"],
        extensions_dir_env: "CURSOR_EXTENSIONS",
        extensions_dir: ".cursor/extensions",
        listing: ListingFormat::InlineVersion,
        priority: 0,
    },
    EditorDescriptor {
        kind: EditorKind::VsCode,
        display_name: "VS Code",
        default_command: "code",
        command_env: "VSCODE_PATH",
        version_probe_args: &["--version"],
        list_extensions_args: &["--list-extensions"],
        install_args: &["--install-extension"],
        extensions_dir_env: "VSCODE_EXTENSIONS",
        extensions_dir: ".vscode/extensions",
        listing: ListingFormat::ExtensionsFolder,
        priority: 1,
    },
];

#[must_use]
pub fn descriptor(kind: EditorKind) -> &'static EditorDescriptor {
    match kind {
        EditorKind::Cursor => &REGISTRY[0],
        EditorKind::VsCode => &REGISTRY[1],
    }
}
