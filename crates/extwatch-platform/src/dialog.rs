//! Blocking native message dialogs rendered by an external helper program.
//!
//! - macOS: `osascript` (`display dialog`)
//! - Linux: `zenity`, only when a graphical session is reachable
//! - Windows: a WinForms form built by PowerShell

use log::debug;
use thiserror::Error;

#[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
use crate::HideWindow;

/// A modal dialog with two or more labelled buttons.
#[derive(Debug, Clone, Copy)]
pub struct DialogRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    /// Button labels, left to right. The last one is the affirmative choice.
    pub buttons: &'a [String],
    pub default_button: &'a str,
}

#[derive(Debug, Error)]
pub enum DialogError {
    #[error("no graphical session is available")]
    NoSession,
    #[error("native dialogs are not supported on this platform")]
    Unsupported,
    #[error("dialog request has no buttons")]
    NoButtons,
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed ({status}): {details}")]
    Failed {
        program: &'static str,
        status: String,
        details: String,
    },
    #[error("could not read the selected button from {program} output")]
    UnreadableResult { program: &'static str },
}

/// Show a dialog and wait for the user to pick a button.
///
/// Dismissing the dialog (escape, window close, the system cancel button)
/// selects the button labelled `Cancel` if there is one, otherwise the first
/// button.
///
/// # Errors
/// Returns an error when the dialog helper cannot be started, there is no
/// graphical session, or the helper output cannot be interpreted.
pub async fn show_dialog(request: &DialogRequest<'_>) -> Result<String, DialogError> {
    if request.buttons.is_empty() {
        return Err(DialogError::NoButtons);
    }
    debug!(
        "Showing native dialog '{}' with buttons {:?}",
        request.title, request.buttons
    );
    platform_dialog(request).await
}

fn dismissal_label(buttons: &[String]) -> String {
    buttons
        .iter()
        .find(|label| label.eq_ignore_ascii_case("cancel"))
        .or_else(|| buttons.first())
        .cloned()
        .unwrap_or_default()
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn applescript_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn applescript_dialog(request: &DialogRequest<'_>) -> String {
    let buttons = request
        .buttons
        .iter()
        .map(|label| applescript_quote(label))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "display dialog {} with title {} buttons {{{buttons}}} default button {} with icon note",
        applescript_quote(request.body),
        applescript_quote(request.title),
        applescript_quote(request.default_button),
    )
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_button_returned(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.split_once("button returned:"))
        .map(|(_, rest)| rest.split(',').next().unwrap_or(rest).trim().to_string())
        .filter(|label| !label.is_empty())
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn zenity_args(request: &DialogRequest<'_>) -> Vec<String> {
    let mut args = Vec::new();
    let (first, rest) = request
        .buttons
        .split_first()
        .map_or((None, &[][..]), |(first, rest)| (Some(first), rest));

    if rest.is_empty() {
        args.push("--info".to_string());
        if let Some(only) = first {
            args.push(format!("--ok-label={only}"));
        }
    } else {
        args.push("--question".to_string());
        if let Some(cancel) = first {
            args.push(format!("--cancel-label={cancel}"));
        }
        if let Some((affirmative, middle)) = rest.split_last() {
            args.push(format!("--ok-label={affirmative}"));
            for extra in middle {
                args.push(format!("--extra-button={extra}"));
            }
        }
        if request.default_button == request.buttons[0] {
            args.push("--default-cancel".to_string());
        }
    }

    args.push(format!("--title={}", request.title));
    args.push(format!("--text={}", request.body));
    args.push("--no-markup".to_string());
    args
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn zenity_selection(buttons: &[String], code: Option<i32>, stdout: &str) -> Option<String> {
    match code {
        Some(0) => buttons.last().cloned(),
        Some(1) => {
            let extra = stdout.trim();
            if extra.is_empty() {
                Some(dismissal_label(buttons))
            } else {
                Some(extra.to_string())
            }
        }
        _ => None,
    }
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn powershell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// A form with one button per requested label. The clicked label is written
/// to stdout; closing the window writes nothing.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn windows_form_script(request: &DialogRequest<'_>) -> String {
    let buttons = request
        .buttons
        .iter()
        .map(|label| powershell_quote(label))
        .collect::<Vec<_>>()
        .join(", ");
    [
        "Add-Type -AssemblyName System.Windows.Forms, System.Drawing".to_string(),
        "$form = New-Object System.Windows.Forms.Form".to_string(),
        format!("$form.Text = {}", powershell_quote(request.title)),
        "$form.AutoSize = $true; $form.AutoSizeMode = 'GrowAndShrink'".to_string(),
        "$form.StartPosition = 'CenterScreen'; $form.TopMost = $true".to_string(),
        "$form.FormBorderStyle = 'FixedDialog'; $form.MaximizeBox = $false; $form.MinimizeBox = $false"
            .to_string(),
        "$layout = New-Object System.Windows.Forms.FlowLayoutPanel".to_string(),
        "$layout.FlowDirection = 'TopDown'; $layout.AutoSize = $true; $layout.Padding = 12".to_string(),
        "$label = New-Object System.Windows.Forms.Label".to_string(),
        format!("$label.Text = {}", powershell_quote(request.body)),
        "$label.AutoSize = $true; $label.MaximumSize = New-Object System.Drawing.Size(480, 0)"
            .to_string(),
        "$layout.Controls.Add($label)".to_string(),
        "$row = New-Object System.Windows.Forms.FlowLayoutPanel".to_string(),
        "$row.AutoSize = $true".to_string(),
        "$script:choice = ''".to_string(),
        format!("foreach ($text in @({buttons})) {{"),
        "  $button = New-Object System.Windows.Forms.Button".to_string(),
        "  $button.Text = $text; $button.AutoSize = $true".to_string(),
        "  $button.Add_Click({ $script:choice = $this.Text; $form.Close() })".to_string(),
        "  $row.Controls.Add($button)".to_string(),
        format!(
            "  if ($text -ceq {}) {{ $form.AcceptButton = $button }}",
            powershell_quote(request.default_button)
        ),
        "}".to_string(),
        "$layout.Controls.Add($row)".to_string(),
        "$form.Controls.Add($layout)".to_string(),
        "[void]$form.ShowDialog()".to_string(),
        "Write-Output $script:choice".to_string(),
    ]
    .join("\n")
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn windows_selection(buttons: &[String], stdout: &str) -> Option<String> {
    let choice = stdout.trim();
    if choice.is_empty() {
        return Some(dismissal_label(buttons));
    }
    buttons.iter().find(|label| label.as_str() == choice).cloned()
}

#[cfg(target_os = "macos")]
async fn platform_dialog(request: &DialogRequest<'_>) -> Result<String, DialogError> {
    const PROGRAM: &str = "osascript";

    let output = tokio::process::Command::new(PROGRAM)
        .args(["-e", &applescript_dialog(request)])
        .stdin(std::process::Stdio::null())
        .hide_window()
        .output()
        .await
        .map_err(|source| DialogError::Launch {
            program: PROGRAM,
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if output.status.success() {
        return parse_button_returned(&stdout)
            .ok_or(DialogError::UnreadableResult { program: PROGRAM });
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    // -128 is "User canceled", raised by the cancel button and by escape.
    if stderr.contains("(-128)") {
        return Ok(dismissal_label(request.buttons));
    }

    Err(DialogError::Failed {
        program: PROGRAM,
        status: output.status.to_string(),
        details: stderr.trim().to_string(),
    })
}

#[cfg(target_os = "linux")]
async fn platform_dialog(request: &DialogRequest<'_>) -> Result<String, DialogError> {
    const PROGRAM: &str = "zenity";

    let has_session = ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|value| !value.is_empty()));
    if !has_session {
        return Err(DialogError::NoSession);
    }

    let output = tokio::process::Command::new(PROGRAM)
        .args(zenity_args(request))
        .stdin(std::process::Stdio::null())
        .hide_window()
        .output()
        .await
        .map_err(|source| DialogError::Launch {
            program: PROGRAM,
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    zenity_selection(request.buttons, output.status.code(), &stdout).ok_or_else(|| {
        DialogError::Failed {
            program: PROGRAM,
            status: output.status.to_string(),
            details: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    })
}

#[cfg(target_os = "windows")]
async fn platform_dialog(request: &DialogRequest<'_>) -> Result<String, DialogError> {
    const PROGRAM: &str = "powershell";

    let script = windows_form_script(request);

    let output = tokio::process::Command::new(PROGRAM)
        .args(["-NoProfile", "-NonInteractive", "-Command", &script])
        .stdin(std::process::Stdio::null())
        .hide_window()
        .output()
        .await
        .map_err(|source| DialogError::Launch {
            program: PROGRAM,
            source,
        })?;

    if !output.status.success() {
        return Err(DialogError::Failed {
            program: PROGRAM,
            status: output.status.to_string(),
            details: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    windows_selection(request.buttons, &String::from_utf8_lossy(&output.stdout))
        .ok_or(DialogError::UnreadableResult { program: PROGRAM })
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
async fn platform_dialog(_request: &DialogRequest<'_>) -> Result<String, DialogError> {
    Err(DialogError::Unsupported)
}
