/// MT4 Logger - print one `<unix-seconds> <balance> <equity>` line
///
/// Meant to be run periodically with stdout appended to a log file.
use chrono::Utc;
use clap::Parser;
use mt4_panel::shared::account_log::{fetch_summary, format_line, DEFAULT_WAIT};
use mt4_panel::shared::config::DEFAULT_ACCOUNT;
use mt4_panel::shared::logging::init_stderr_logging;
use mt4_panel::shared::websocket::DEFAULT_URL;
use mt4_panel::{WebSocketClient, WebSocketConfig};
use std::error::Error;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mt4-logger", about = "Sample balance and equity of an MT4 account")]
struct Cli {
    /// Account identifier, also the subscription topic.
    #[arg(default_value = DEFAULT_ACCOUNT)]
    account: String,

    /// Snapshot feed URL.
    #[arg(long, env = "MT4_PANEL_URL", default_value = DEFAULT_URL)]
    url: String,

    /// How long to wait for a snapshot, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_WAIT.as_millis() as u64)]
    wait_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_stderr_logging();

    let mut transport = WebSocketClient::with_config(WebSocketConfig::new(cli.url))
        .connect_once()
        .await?;
    let summary = fetch_summary(
        &mut transport,
        &cli.account,
        Duration::from_millis(cli.wait_ms),
    )
    .await?;

    println!("{}", format_line(Utc::now(), &summary));
    Ok(())
}
