use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{ConsentChannel, ConsentRequest, ConsentResult};

/// Line-based prompt on the controlling terminal.
pub struct TerminalPrompt;

fn render(request: &ConsentRequest) -> String {
    let rule = "-".repeat(request.title.len().max(24));
    format!("\n{}\n{rule}\n{}\n[y/N]: ", request.title, request.body)
}

fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[async_trait]
impl ConsentChannel for TerminalPrompt {
    fn name(&self) -> &'static str {
        "terminal"
    }

    async fn request(&self, request: &ConsentRequest) -> ConsentResult {
        let mut stderr = tokio::io::stderr();
        if let Err(error) = stderr.write_all(render(request).as_bytes()).await {
            return ConsentResult::Unavailable(format!("cannot write prompt: {error}"));
        }
        let _ = stderr.flush().await;

        let mut answer = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut answer).await {
            Ok(0) => ConsentResult::Unavailable("stdin closed".to_string()),
            Ok(_) if is_yes(&answer) => {
                ConsentResult::Selected(request.affirmative_option().to_string())
            }
            Ok(_) => ConsentResult::Selected(request.negative_option().to_string()),
            Err(error) => ConsentResult::Unavailable(format!("cannot read answer: {error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_answers_are_case_insensitive() {
        for answer in ["y", "Y", "yes", "YES", " Yes \n"] {
            assert!(is_yes(answer), "{answer:?} should be affirmative");
        }
    }

    #[test]
    fn everything_else_is_negative() {
        for answer in ["", "\n", "n", "no", "yep", "sure", "y es"] {
            assert!(!is_yes(answer), "{answer:?} should be negative");
        }
    }

    #[test]
    fn prompt_shows_title_body_and_default() {
        let request = ConsentRequest {
            title: "a.b update available".to_string(),
            body: "Installed: 1.0.0\nLatest:    1.1.0".to_string(),
            options: vec!["Cancel".to_string(), "Install".to_string()],
            default_option: "Install".to_string(),
        };

        let prompt = render(&request);

        assert!(prompt.contains("a.b update available"));
        assert!(prompt.contains("Latest:    1.1.0"));
        assert!(prompt.ends_with("[y/N]: "));
    }
}
