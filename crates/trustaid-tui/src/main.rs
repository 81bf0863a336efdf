use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use trustaid_core::logging::{default_log_dir, setup_logging, LogConfig, LogTarget};
use trustaid_core::{BackendClient, Conversation, DemoResponder, PrefStore, Responders, Settings};

mod app;
mod cli;
mod handler;
mod render;
mod tui;
mod ui;

use app::App;
use cli::{Cli, Command};
use tui::EventHandler;

const TICK_RATE: Duration = Duration::from_millis(300);

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Command::Chat);

    // The TUI owns the terminal, so only one-shot commands log to stderr
    let target = match &command {
        Command::Chat => LogTarget::File(default_log_dir()?),
        _ => LogTarget::Stderr,
    };
    let _log_guard = setup_logging(&LogConfig::from_env(target))?;

    let mut prefs = PrefStore::open()?;
    let mut settings = Settings::load(&prefs);
    apply_overrides(&cli, &mut settings, &mut prefs)?;
    tracing::info!(
        api_base = %settings.api_base,
        demo_mode = settings.demo_mode,
        pipeline = settings.pipeline.as_str(),
        prefs = %prefs.path().display(),
        "settings loaded"
    );

    match &command {
        Command::Chat => run_chat(settings, prefs).await,
        Command::Ask { query } => ask_once(query, &settings).await,
        Command::Health => check_health(&settings).await,
    }
}

/// Command-line settings win for this session and are saved like any other change.
fn apply_overrides(cli: &Cli, settings: &mut Settings, prefs: &mut PrefStore) -> Result<()> {
    if let Some(api_base) = &cli.api_base {
        settings.set_api_base(prefs, api_base)?;
    }
    if let Some(demo) = cli.demo {
        settings.set_demo_mode(prefs, demo)?;
    }
    if let Some(pipeline) = cli.pipeline {
        settings.set_pipeline(prefs, pipeline)?;
    }
    Ok(())
}

async fn run_chat(settings: Settings, prefs: PrefStore) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(settings, prefs);
    let mut events = EventHandler::new(TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn ask_once(query: &str, settings: &Settings) -> Result<()> {
    let responders = Responders::new(
        Arc::new(BackendClient::new(&settings.api_base)),
        Arc::new(DemoResponder::default()),
    );
    let mut conversation = Conversation::new();
    conversation.submit(Some(query), settings, &responders).await;

    // Skip the echoed question
    for entry in conversation.transcript().iter().skip(1) {
        for line in render::entry_lines(entry) {
            let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            println!("{}", text);
        }
    }

    match conversation.error() {
        Some(error) => Err(anyhow!("request to {} failed: {}", settings.api_base, error)),
        None => Ok(()),
    }
}

async fn check_health(settings: &Settings) -> Result<()> {
    let client = BackendClient::new(&settings.api_base);
    let health = client
        .health()
        .await
        .map_err(|e| anyhow!("{} is unreachable: {}", client.base_url(), e))?;

    println!(
        "{}: {}{}",
        client.base_url(),
        if health.ok { "ok" } else { "not ok" },
        if health.demo { " (backend in demo mode)" } else { "" }
    );
    Ok(())
}
