mod runtime;
mod ui;

use estate_chat::HttpBackend;
use tokio::runtime::Handle;

use crate::config::AppConfig;

/// Runs the full-screen chat. The UI loop is synchronous and blocks this
/// worker; requests go out on the runtime behind `handle`.
pub async fn run_tui(config: AppConfig, backend: HttpBackend) -> anyhow::Result<()> {
    let handle = Handle::current();
    tokio::task::block_in_place(move || runtime::run(config, backend, handle))
}
