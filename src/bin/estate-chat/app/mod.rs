mod format;
mod non_interactive;
mod tui;

use clap::Parser;
use std::io::IsTerminal;

use estate_chat::HttpBackend;

use crate::args::CliArgs;
use crate::config::{load_config, AppConfig};
use crate::logging::init_logging;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;
    let backend = build_backend(&args, &loaded.config)?;
    log::info!("using assistant backend at {}", backend.base_url());

    if args.has_non_interactive_input() || !std::io::stdin().is_terminal() {
        return non_interactive::run_non_interactive(&args, backend).await;
    }
    tui::run_tui(loaded.config, backend).await
}

fn build_backend(args: &CliArgs, config: &AppConfig) -> anyhow::Result<HttpBackend> {
    let base_url = args
        .base_url
        .as_deref()
        .unwrap_or(config.backend.base_url.as_str());
    let timeout = args.timeout.or(config.backend.timeout_seconds);
    Ok(HttpBackend::new(base_url, timeout)?)
}
