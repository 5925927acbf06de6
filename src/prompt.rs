//! Operator prompts on the controlling terminal.

use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tool_enroll::Confirmer;
use tracing::warn;

/// Asks on stdout and waits for a yes/no line on stdin.
///
/// There is no default answer: anything else is asked again. A closed
/// stdin reads as "no" so that an unattended run never mutates on a guess.
pub struct TerminalConfirmer {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalConfirmer {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(io::stdin()).lines()),
        }
    }
}

impl Default for TerminalConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_answer(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut lines = self.lines.lock().await;
        let mut stdout = io::stdout();
        loop {
            let question = format!("\n{prompt} (y/n): ");
            if stdout.write_all(question.as_bytes()).await.is_err()
                || stdout.flush().await.is_err()
            {
                warn!("stdout unavailable, answering no");
                return false;
            }
            match lines.next_line().await {
                Ok(Some(line)) => match parse_answer(&line) {
                    Some(answer) => return answer,
                    None => {
                        let _ = stdout.write_all(b"Please answer y or n.\n").await;
                    }
                },
                Ok(None) => {
                    warn!("stdin closed, answering no");
                    return false;
                }
                Err(err) => {
                    warn!(error = %err, "failed to read answer, answering no");
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_are_strict_yes_or_no() {
        assert_eq!(parse_answer(" Y "), Some(true));
        assert_eq!(parse_answer("yes"), Some(true));
        assert_eq!(parse_answer("No"), Some(false));
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("sure"), None);
    }
}
