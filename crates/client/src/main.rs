mod app;
mod config;

use clap::Parser;

use config::ClientConfig;

#[derive(Parser)]
#[command(name = "cursors")]
#[command(about = "Shared-cursor world client")]
struct Args {
    #[arg(
        short,
        long,
        help = "Server address to connect to (e.g., 127.0.0.1:8005)"
    )]
    server: Option<String>,

    #[arg(long, help = "Decode server strings with the legacy text encoding")]
    legacy_text: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut config = ClientConfig::default();
    if let Some(server) = args.server {
        config.server = server;
    }
    config.legacy_text = args.legacy_text;

    app::run(config).await
}
