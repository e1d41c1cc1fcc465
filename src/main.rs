mod app;
mod config;
mod error;
mod event;
mod log;
mod network;
mod ui;

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::app::App;
use crate::config::{CliArgs, Config};
use crate::error::{WifiError, WifiResult};
use crate::event::EventHandler;
use crate::log::EventLog;
use crate::network::{ConnectionManager, NmAssociation};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    if cli.print_default_config {
        print!("{}", config::default_config_toml());
        return Ok(());
    }

    // Initialize color-eyre with custom panic hook that restores terminal
    install_panic_hook();

    let config = config::load(&cli)?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(&config)?;

    info!("wifi-connect starting");

    let mut event_handler = EventHandler::new(config.tick_rate());

    // Connect to NetworkManager
    let nm = match NmAssociation::new(
        config.interface().map(str::to_string),
        event_handler.sender(),
    )
    .await
    {
        Ok(nm) => Arc::new(nm),
        Err(e) => {
            eprintln!("Failed to connect to NetworkManager D-Bus: {}", e);
            eprintln!("Is NetworkManager running? Try: systemctl status NetworkManager");
            std::process::exit(1);
        }
    };

    if !nm.is_running().await {
        eprintln!("NetworkManager is not running.");
        eprintln!("Start it with: sudo systemctl start NetworkManager");
        std::process::exit(1);
    }

    info!(
        "Connected to NetworkManager v{}",
        nm.version().await.unwrap_or_default()
    );

    let mut log = EventLog::new(config.general.log_capacity);
    match nm.wireless_enabled().await {
        Ok(true) => {}
        Ok(false) => log.append("wireless is disabled; connection requests will be unavailable"),
        Err(e) => warn!("Could not read WirelessEnabled: {}", e),
    }

    let manager = ConnectionManager::new(nm.clone(), config.presets.clone());
    let mut app = App::new(manager, log, config.tick_rate());

    let mut terminal = setup_terminal()?;

    // ── Main event loop ───────────────────────────────────────────────
    // Every mutation of the registry and the log happens here.
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        tokio::select! {
            maybe_event = event_handler.next() => match maybe_event {
                Some(event) => app.handle_event(event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                app.should_quit = true;
            }
        }

        if app.should_quit {
            break;
        }
    }

    event_handler.stop();
    app.shutdown();
    nm.drain().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("wifi-connect exiting");
    Ok(())
}

/// Raw mode plus alternate screen
fn setup_terminal() -> WifiResult<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()
        .map_err(|e| WifiError::Terminal(format!("Failed to enable raw mode: {}", e)))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

/// Install a panic hook that restores the terminal before printing the panic
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(panic_info);
    }));
    color_eyre::install().ok();
}

/// Initialize tracing to the configured log file, or disable it
/// (stdout belongs to the TUI).
fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::EnvFilter;

    let Some(path) = config.log_file() else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .with_writer(io::sink)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.general.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}
