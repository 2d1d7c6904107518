mod prompt;

use std::io::{self, Write};
use std::sync::Arc;

use estate_chat::capture::VoicePayload;
use estate_chat::{HttpBackend, Message, SendOutcome, SessionManager};

use crate::args::CliArgs;

use super::format::listing_card;
use prompt::Question;

pub async fn run_non_interactive(args: &CliArgs, backend: HttpBackend) -> anyhow::Result<()> {
    let question = prompt::resolve_question(args)?;
    let mut session = SessionManager::new(Arc::new(backend));
    let outcome = match question {
        Question::Text(text) => session.send_text(&text).await,
        Question::Voice(path) => {
            let voice = VoicePayload::from_file(&path)
                .map_err(|err| anyhow::anyhow!("cannot read {}: {err}", path.display()))?;
            session.send_voice(voice).await
        }
    };

    match outcome {
        SendOutcome::Answered => {
            let mut stdout = io::stdout().lock();
            if let Some(reply) = session.state().messages().last() {
                print_reply(&mut stdout, reply)?;
            }
            if let Some(id) = session.state().conversation_id() {
                log::debug!("conversation {id}");
            }
            Ok(())
        }
        SendOutcome::Failed(err) => {
            log::warn!("one-shot request failed: {err}");
            let shown = session.state().last_error().unwrap_or_default();
            Err(anyhow::anyhow!("{shown}"))
        }
        SendOutcome::Rejected(rejection) => Err(anyhow::anyhow!("question rejected: {rejection}")),
    }
}

fn print_reply(out: &mut impl Write, reply: &Message) -> io::Result<()> {
    writeln!(out, "{}", reply.text())?;
    for listing in reply.listings() {
        writeln!(out)?;
        for line in listing_card(listing) {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}
