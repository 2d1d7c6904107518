#[path = "estate-chat/app/mod.rs"]
mod app;
#[path = "estate-chat/args.rs"]
mod args;
#[path = "estate-chat/config/mod.rs"]
mod config;
#[path = "estate-chat/logging.rs"]
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
