/// MT4 Panel - live positions, orders and pending orders for one account
///
/// Layout:
/// - One table for the current display mode (positions / orders / pending)
/// - Footer with profit, and balance/equity when revealed
/// - Red "NO DATA" banner while the feed is stale
///
/// Keys: space cycle, p/o/P select mode, h hide pending, H hide balance, q quit
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mt4_panel::shared::config::{default_show_file, DEFAULT_ACCOUNT};
use mt4_panel::shared::logging::{default_log_file, init_file_logging};
use mt4_panel::shared::websocket::DEFAULT_URL;
use mt4_panel::{
    run_ingestion, run_input, CrosstermKeys, Dashboard, PanelConfig, TerminalRenderer,
    WebSocketClient, WebSocketConfig,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io,
    path::PathBuf,
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "mt4-panel", about = "Live MT4 account panel")]
struct Cli {
    /// Account identifier, also the subscription topic.
    #[arg(default_value = DEFAULT_ACCOUNT)]
    account: String,

    /// Snapshot feed URL.
    #[arg(long, env = "MT4_PANEL_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Seconds without a sighting before an order (or the feed) is stale.
    #[arg(long, default_value_t = 5)]
    ttl_secs: u64,

    /// Poll interval for the feed and the keyboard, in milliseconds.
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Start with pending orders hidden from the orders view.
    #[arg(long, default_value_t = false)]
    hide_pending: bool,

    /// Count pending orders in the position suffix.
    #[arg(long, default_value_t = false)]
    count_pending: bool,

    /// Show stop loss and take profit columns in the orders view.
    #[arg(long, default_value_t = false)]
    show_stops: bool,

    /// Flag pending orders within this fraction of ATR from the market.
    #[arg(long, default_value_t = 0.5)]
    near_trigger_atr: f64,

    /// Marker file revealing balance and equity. Defaults to ~/.show-profit.
    #[arg(long)]
    show_file: Option<PathBuf>,

    /// Log file. Defaults to <tmp>/mt4-panel.log.
    #[arg(long, env = "MT4_PANEL_LOG")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn panel_config(&self) -> PanelConfig {
        let show_file = self.show_file.clone().or_else(default_show_file);

        PanelConfig::new(&self.account)
            .with_ttl(Duration::from_secs(self.ttl_secs))
            .with_poll_interval(Duration::from_millis(self.poll_ms))
            .with_hide_pending(self.hide_pending)
            .with_count_pending(self.count_pending)
            .with_show_stops(self.show_stops)
            .with_near_trigger_atr(self.near_trigger_atr)
            .with_show_file(show_file.as_deref())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let log_file = cli.log_file.clone().unwrap_or_else(default_log_file);
    init_file_logging(&log_file)?;

    let config = cli.panel_config();
    let poll = config.poll_interval;
    info!(account = %config.account, url = %cli.url, ttl = ?config.ttl, "starting mt4-panel");

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    let dashboard = Dashboard::new(config, TerminalRenderer::new(terminal));

    let (transport, mut status_rx) =
        WebSocketClient::with_config(WebSocketConfig::new(cli.url.as_str())).start();
    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            info!(?status, "connection status");
        }
    });

    let shutdown = Arc::new(AtomicBool::new(false));
    let ingestion = {
        let dashboard = dashboard.clone();
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { run_ingestion(dashboard, transport, &shutdown, poll).await })
    };

    let input_result = run_input(&dashboard, &mut CrosstermKeys, &shutdown, poll);
    let ingestion_result = ingestion.await;

    // Restore terminal
    disable_raw_mode()?;
    dashboard.with_renderer(|renderer| -> io::Result<()> {
        let terminal = renderer.terminal_mut();
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()
    })?;

    input_result?;
    ingestion_result??;
    info!("mt4-panel stopped");
    Ok(())
}
