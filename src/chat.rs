//! Terminal front end: `codex ask`, `codex chat` and `codex modes`.
//!
//! Answers are written one character at a time with a short delay
//! (`chat.typing_delay_ms`; `0` prints the whole answer at once).
//! Characters always appear in generation order.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::assistant::{Assistant, Session};
use crate::config::Config;
use crate::prompt::Mode;

/// Write `text` to stdout one character at a time.
pub async fn type_out(text: &str, delay: Duration) -> Result<()> {
    let mut stdout = std::io::stdout();
    if delay.is_zero() {
        writeln!(stdout, "{}", text)?;
        return Ok(());
    }
    let mut buf = [0u8; 4];
    for c in text.chars() {
        stdout.write_all(c.encode_utf8(&mut buf).as_bytes())?;
        stdout.flush()?;
        tokio::time::sleep(delay).await;
    }
    writeln!(stdout)?;
    Ok(())
}

/// Run the ask command: one question, empty history.
pub async fn run_ask(config: &Config, question: &str, mode: Mode) -> Result<()> {
    let assistant = Assistant::from_config(config).await?;
    let answer = assistant.answer(question, mode, &[]).await;
    assistant.close().await;

    type_out(&answer?, typing_delay(config)).await
}

/// Run the chat command: an interactive session on stdin.
pub async fn run_chat(config: &Config, mode: Mode) -> Result<()> {
    let assistant = Assistant::from_config(config).await?;
    let mut session = Session::new(assistant.persona_name(), mode);
    let delay = typing_delay(config);

    println!(
        "{}'s Personal Codex. Currently in {}.",
        assistant.persona_name(),
        session.mode.label()
    );
    println!("Ask about skills, projects and journey. Commands: /mode <name>, /reset, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match ChatCommand::parse(input) {
            ChatCommand::Quit => break,
            ChatCommand::Reset => {
                session.reset();
                println!("History cleared.");
            }
            ChatCommand::Mode(name) => match name.parse::<Mode>() {
                Ok(mode) => {
                    session.mode = mode;
                    println!("Switched to {}.", mode.label());
                }
                Err(e) => println!("{}", e),
            },
            ChatCommand::Ask(question) => match session.ask(&assistant, question).await {
                Ok(answer) => {
                    print!("{}: ", assistant.persona_name());
                    type_out(&answer, delay).await?;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "answer failed");
                    println!("Error: {}", e);
                }
            },
        }
    }

    assistant.close().await;
    Ok(())
}

/// Run the modes command: list every mode with its description.
pub fn run_modes() {
    for mode in Mode::ALL {
        println!(
            "  {:<14} {:<22} {}",
            mode.as_str(),
            mode.label(),
            mode.description()
        );
    }
}

fn typing_delay(config: &Config) -> Duration {
    Duration::from_millis(config.chat.typing_delay_ms)
}

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Quit,
    Reset,
    Mode(&'a str),
    Ask(&'a str),
}

impl<'a> ChatCommand<'a> {
    fn parse(input: &'a str) -> Self {
        match input {
            "/quit" | "/exit" => ChatCommand::Quit,
            "/reset" => ChatCommand::Reset,
            _ => match input.strip_prefix("/mode") {
                Some(rest) if rest.is_empty() || rest.starts_with(' ') => {
                    ChatCommand::Mode(rest.trim())
                }
                _ => ChatCommand::Ask(input),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_commands() {
        assert_eq!(ChatCommand::parse("/quit"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/reset"), ChatCommand::Reset);
        assert_eq!(
            ChatCommand::parse("/mode fast_facts"),
            ChatCommand::Mode("fast_facts")
        );
        assert_eq!(ChatCommand::parse("/mode"), ChatCommand::Mode(""));
        assert_eq!(
            ChatCommand::parse("/modest question"),
            ChatCommand::Ask("/modest question")
        );
        assert_eq!(
            ChatCommand::parse("What are your skills?"),
            ChatCommand::Ask("What are your skills?")
        );
    }
}
