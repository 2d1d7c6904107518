use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "estate-chat",
    about = "Chat with the real-estate assistant from the terminal"
)]
pub struct CliArgs {
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Backend base URL, overrides `[backend].base_url`
    #[arg(long)]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Ask one question and print the answer
    #[arg(long, short = 'p')]
    pub prompt: Option<String>,
    /// Send a recorded audio file as a voice question
    #[arg(long, conflicts_with = "prompt")]
    pub voice: Option<PathBuf>,
}

impl CliArgs {
    pub fn has_non_interactive_input(&self) -> bool {
        self.prompt.is_some() || self.voice.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_or_voice_is_non_interactive() {
        let args = CliArgs::parse_from(["estate-chat"]);
        assert!(!args.has_non_interactive_input());

        let args = CliArgs::parse_from(["estate-chat", "--prompt", "villas in Jumeirah"]);
        assert!(args.has_non_interactive_input());

        let args = CliArgs::parse_from(["estate-chat", "--voice", "question.wav"]);
        assert_eq!(args.voice, Some(PathBuf::from("question.wav")));
        assert!(args.has_non_interactive_input());
    }

    #[test]
    fn prompt_and_voice_conflict() {
        let parsed = CliArgs::try_parse_from(["estate-chat", "-p", "hi", "--voice", "a.wav"]);
        assert!(parsed.is_err());
    }
}
