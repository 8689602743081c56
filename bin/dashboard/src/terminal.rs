//! Terminal stand-ins for the wallet popup and the toast notifications.

use action::{Notice, NoticeLevel, Notifier, SignaturePrompt, TxSummary};
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};

/// Prints notices to stdout and mirrors them into the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(message = %notice.message, "Notice"),
            NoticeLevel::Success => info!(message = %notice.message, link = ?notice.link, "Success"),
            NoticeLevel::Error => error!(message = %notice.message, "Failure"),
        }
        println!("{}", render_notice(&notice));
    }
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "success",
        NoticeLevel::Error => "error",
    };
    match &notice.link {
        Some(link) => format!("[{tag}] {} View: {link}", notice.message),
        None => format!("[{tag}] {}", notice.message),
    }
}

/// Asks for confirmation on stdin before anything is signed.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    /// Sign without asking
    pub assume_yes: bool,
}

impl SignaturePrompt for TerminalPrompt {
    async fn confirm(&self, summary: &TxSummary) -> bool {
        if self.assume_yes {
            info!(%summary, "Signing without confirmation");
            return true;
        }

        let question = format!("{summary}\nSign and send? [y/N] ");
        let answer = tokio::task::spawn_blocking(move || {
            print!("{question}");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok::<_, io::Error>(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read confirmation");
                false
            }
            Err(e) => {
                warn!(error = %e, "Confirmation prompt aborted");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_render_notice_with_link() {
        let notice = Notice::success("Transfer successful!", "https://sepolia.etherscan.io/tx/0x01");
        assert_eq!(
            render_notice(&notice),
            "[success] Transfer successful! View: https://sepolia.etherscan.io/tx/0x01"
        );
        assert_eq!(render_notice(&Notice::info("hi")), "[info] hi");
    }

    #[tokio::test]
    async fn test_assume_yes_skips_stdin() {
        let prompt = TerminalPrompt { assume_yes: true };
        let summary = TxSummary::Approve {
            symbol: "LINK".to_string(),
            amount: "1".to_string(),
            spender: Default::default(),
        };
        assert!(prompt.confirm(&summary).await);
    }
}
