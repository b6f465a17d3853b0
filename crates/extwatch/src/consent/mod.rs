//! Asking the operator whether to install an update.
//!
//! One [`ConsentChannel`] is chosen per run: an interactive terminal prompt
//! when both stdin and stdout are terminals, a native dialog otherwise, or a
//! synthetic approval for dry runs.

mod dialog;
mod terminal;

use std::io::IsTerminal;

use async_trait::async_trait;
use extwatch_core::{ExtensionId, ExtensionVersion};

pub use dialog::NativeDialogChannel;
pub use terminal::TerminalPrompt;

pub const CANCEL_OPTION: &str = "Cancel";
pub const INSTALL_OPTION: &str = "Install";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRequest {
    pub title: String,
    pub body: String,
    /// Ordered choices. The last one approves the request.
    pub options: Vec<String>,
    pub default_option: String,
}

impl ConsentRequest {
    pub fn for_update(
        extension: &ExtensionId,
        installed: Option<&ExtensionVersion>,
        latest: &ExtensionVersion,
    ) -> Self {
        let installed = installed.map_or_else(|| "not installed".to_string(), ToString::to_string);
        Self {
            title: format!("{extension} update available"),
            body: format!("Installed: {installed}\nLatest:    {latest}\n\nInstall {latest} now?"),
            options: vec![CANCEL_OPTION.to_string(), INSTALL_OPTION.to_string()],
            default_option: INSTALL_OPTION.to_string(),
        }
    }

    pub fn affirmative_option(&self) -> &str {
        self.options.last().map_or(INSTALL_OPTION, String::as_str)
    }

    pub fn negative_option(&self) -> &str {
        self.options.first().map_or(CANCEL_OPTION, String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentResult {
    Selected(String),
    /// The channel could not ask at all.
    Unavailable(String),
}

impl ConsentResult {
    pub fn approves(&self, request: &ConsentRequest) -> bool {
        matches!(self, Self::Selected(label) if label == request.affirmative_option())
    }
}

#[async_trait]
pub trait ConsentChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the run reports its result through native notifications.
    fn is_headless(&self) -> bool {
        false
    }

    async fn request(&self, request: &ConsentRequest) -> ConsentResult;

    /// Informational message at the end of a run.
    async fn notify(&self, _title: &str, _body: &str) {}
}

/// Approves every request without asking.
pub struct DryRunConsent;

#[async_trait]
impl ConsentChannel for DryRunConsent {
    fn name(&self) -> &'static str {
        "dry run"
    }

    async fn request(&self, request: &ConsentRequest) -> ConsentResult {
        log::info!("[dry run] Consent assumed for: {}", request.title);
        ConsentResult::Selected(request.affirmative_option().to_string())
    }
}

fn is_interactive_terminal() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Pick the channel for this run.
pub fn select_channel(dry_run: bool) -> Box<dyn ConsentChannel> {
    channel_for(dry_run, is_interactive_terminal())
}

fn channel_for(dry_run: bool, interactive: bool) -> Box<dyn ConsentChannel> {
    let channel: Box<dyn ConsentChannel> = if dry_run {
        Box::new(DryRunConsent)
    } else if interactive {
        Box::new(TerminalPrompt)
    } else {
        Box::new(NativeDialogChannel)
    };
    log::debug!("Consent channel: {}", channel.name());
    channel
}
