use std::io::IsTerminal;
use std::io::{self, Read};
use std::path::PathBuf;

use crate::args::CliArgs;

/// What to send in one-shot mode.
#[derive(Debug, PartialEq)]
pub(super) enum Question {
    Text(String),
    Voice(PathBuf),
}

pub(super) fn resolve_question(args: &CliArgs) -> anyhow::Result<Question> {
    if let Some(path) = &args.voice {
        return Ok(Question::Voice(path.clone()));
    }
    if let Some(prompt) = args.prompt.clone() {
        return Ok(Question::Text(prompt));
    }
    if let Some(prompt) = prompt_from_stdin()? {
        return Ok(Question::Text(prompt));
    }
    Err(anyhow::anyhow!(
        "no question provided; use --prompt, --voice or pipe input"
    ))
}

fn prompt_from_stdin() -> anyhow::Result<Option<String>> {
    if io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}
