use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A marketplace extension identifier of the form `publisher.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionId {
    publisher: String,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionIdError {
    #[error("Expected publisher.name, got: {input}")]
    InvalidFormat { input: String },
    #[error("Invalid character in extension identifier: {input}")]
    InvalidCharacter { input: String },
}

impl ExtensionId {
    #[must_use]
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive comparison; editors normalise identifiers to lower
    /// case while the marketplace keeps the publisher's spelling.
    #[must_use]
    pub fn matches(&self, publisher: &str, name: &str) -> bool {
        self.publisher.eq_ignore_ascii_case(publisher) && self.name.eq_ignore_ascii_case(name)
    }
}

impl FromStr for ExtensionId {
    type Err = ExtensionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (publisher, name) = s
            .split_once('.')
            .filter(|(publisher, name)| !publisher.is_empty() && !name.is_empty())
            .ok_or_else(|| ExtensionIdError::InvalidFormat {
                input: s.to_string(),
            })?;

        let valid = |part: &str| {
            part.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if !valid(publisher) || !valid(name) {
            return Err(ExtensionIdError::InvalidCharacter {
                input: s.to_string(),
            });
        }

        Ok(Self {
            publisher: publisher.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.publisher, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_publisher_and_name() {
        let id: ExtensionId = "augment.vscode-augment".parse().unwrap();
        assert_eq!(id.publisher(), "augment");
        assert_eq!(id.name(), "vscode-augment");
        assert_eq!(id.to_string(), "augment.vscode-augment");
    }

    #[test]
    fn rejects_missing_separator() {
        let result: Result<ExtensionId, _> = "vscode-augment".parse();
        assert!(matches!(result, Err(ExtensionIdError::InvalidFormat { .. })));
    }

    #[test]
    fn rejects_empty_parts() {
        assert!(".name".parse::<ExtensionId>().is_err());
        assert!("publisher.".parse::<ExtensionId>().is_err());
    }

    #[test]
    fn rejects_path_characters() {
        let result: Result<ExtensionId, _> = "pub.../../etc".parse();
        assert!(matches!(
            result,
            Err(ExtensionIdError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn matches_ignores_case() {
        let id: ExtensionId = "GitHub.Copilot".parse().unwrap();
        assert!(id.matches("github", "copilot"));
        assert!(!id.matches("github", "copilot-chat"));
    }
}
