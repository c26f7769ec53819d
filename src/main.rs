mod auth;
mod backend;
mod config;
mod controller;
mod host;
mod logging;
mod model;
mod view;

#[cfg(test)]
mod test_utils;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rspotify::{AuthCodeSpotify, Token};

use auth::BackendCredential;
use backend::{ApiBackend, CliBackend, MusicBackend, RelayBackend, TokioCommandRunner};
use config::{Args, BackendKind};
use controller::SessionController;
use host::{HostEvent, TerminalHost};
use view::HostView;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== nvim-spotify starting ===");

    let config = config::Config::load(args)?;
    tracing::info!(backend = ?config.backend, timeout = ?config.timeout, "Configuration loaded");

    let credential = auth::load_credential(&config)?;
    let backend = setup_backend(&config, credential).await?;

    let screen = terminal::size()?;
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let host = TerminalHost::new(screen);
    let mut controller = SessionController::new(host, backend);

    let res = run_app(&mut terminal, &mut controller).await;

    // Surfaces must go before the terminal is handed back
    controller.close();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("nvim-spotify shutting down");
    Ok(())
}

async fn setup_rspotify(access_token: Token) -> Result<AuthCodeSpotify> {
    let spotify = AuthCodeSpotify::with_config(
        Default::default(),
        Default::default(),
        rspotify::Config {
            token_cached: false,
            token_refreshing: false,
            ..Default::default()
        },
    );

    *spotify
        .token
        .lock()
        .await
        .map_err(|_| anyhow::anyhow!("rspotify token lock poisoned"))? = Some(access_token);
    tracing::debug!("rspotify token set");
    Ok(spotify)
}

async fn setup_backend(
    config: &config::Config,
    credential: BackendCredential,
) -> Result<Arc<dyn MusicBackend>> {
    let backend: Arc<dyn MusicBackend> = match (config.backend, credential) {
        (BackendKind::Api, BackendCredential::OAuth(token)) => {
            let client = setup_rspotify(token).await?;
            Arc::new(ApiBackend::new(client, config.timeout))
        }
        (BackendKind::Relay, BackendCredential::Relay(refresh_token)) => Arc::new(
            RelayBackend::new(config.relay_url.clone(), refresh_token, config.timeout)?,
        ),
        (BackendKind::Cli, _) => Arc::new(CliBackend::new(
            config.cli_binary.clone(),
            TokioCommandRunner::new(config.timeout),
        )),
        (kind, _) => anyhow::bail!("No usable credential for the {:?} backend", kind),
    };
    tracing::info!(backend = ?config.backend, "Backend ready");
    Ok(backend)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut SessionController<TerminalHost>,
) -> io::Result<()> {
    loop {
        controller.host_mut().auto_clear_status();

        let area = terminal.size()?;
        controller.host_mut().set_screen_size(area.width, area.height);

        terminal.draw(|f| HostView::render(f, controller.host()))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match controller.host_mut().handle_key(key) {
                    Some(HostEvent::Command(command)) => controller.dispatch(command).await,
                    Some(HostEvent::Quit) => break,
                    None => {}
                }
            }
        }

        // Leave-focus bindings queued by the host while handling the key
        while let Some(command) = controller.host_mut().take_pending() {
            controller.dispatch(command).await;
        }
    }

    Ok(())
}
