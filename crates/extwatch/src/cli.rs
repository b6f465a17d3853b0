use clap::Parser;

/// Check a marketplace extension for updates and install them into the
/// local editors.
#[derive(Debug, Clone, Parser)]
#[command(name = "extwatch", version, about)]
pub struct Cli {
    /// Walk through the whole run without downloading, installing or
    /// deleting anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Install into every detected editor instead of only the one the
    /// extension was found in.
    #[arg(long)]
    pub install_all: bool,

    /// Log at debug level.
    #[arg(long)]
    pub debug: bool,

    /// Extension to manage, as `publisher.name`. Overrides the configured id.
    #[arg(long, value_name = "PUBLISHER.NAME")]
    pub extension: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Cli;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_default_to_off() {
        let cli = Cli::try_parse_from(["extwatch"]).expect("no flags should parse");

        assert!(!cli.dry_run);
        assert!(!cli.install_all);
        assert!(!cli.debug);
        assert_eq!(cli.extension, None);
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "extwatch",
            "--dry-run",
            "--install-all",
            "--debug",
            "--extension",
            "github.copilot",
        ])
        .expect("flags should parse");

        assert!(cli.dry_run);
        assert!(cli.install_all);
        assert!(cli.debug);
        assert_eq!(cli.extension.as_deref(), Some("github.copilot"));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["extwatch", "--force"]).is_err());
    }
}
