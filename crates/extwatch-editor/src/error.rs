use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("No supported editor found (checked: {})", .checked.join(", "))]
    NoEditorFound { checked: Vec<&'static str> },

    #[error("{command} exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("{command} did not finish within {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        EditorError::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EditorError;

    #[test]
    fn io_error_conversion_maps_to_io_variant() {
        let mapped = EditorError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(
            mapped,
            EditorError::IoError { kind, .. } if kind == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn no_editor_found_lists_checked_editors() {
        let error = EditorError::NoEditorFound {
            checked: vec!["Cursor", "VS Code"],
        };

        assert_eq!(
            error.to_string(),
            "No supported editor found (checked: Cursor, VS Code)"
        );
    }
}
