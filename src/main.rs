mod app;
mod backend;
mod catalog;
mod config;
mod constants;
mod envelope;
mod input;
mod jitter;
mod mock;
mod model;
mod normalize;
mod player;
mod samples;
mod state;
mod theme;
mod transport;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use backend::BackendKind;
use constants::constants;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Video backend: 'catalog' (network with fallback data) or 'mock' (synthetic)
  #[arg(short, long, value_enum, default_value = "catalog")]
  backend: BackendKind,

  /// Catalog base URL (defaults to the built-in endpoint)
  #[arg(long, env = "STREAMFREE_BASE_URL")]
  base_url: Option<String>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

// --- Logging ---

/// Route tracing output to a file in the cache dir so the TUI stays clean.
/// The returned guard flushes the writer on drop.
fn init_logging() -> Result<Option<WorkerGuard>> {
  let Some(dirs) = ProjectDirs::from("", "", &constants().app_name) else {
    return Ok(None);
  };
  let log_dir = dirs.cache_dir();
  std::fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;

  let appender = tracing_appender::rolling::never(log_dir, &constants().log_file);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streamfree=info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Ok(Some(guard))
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = init_logging().context("Failed to initialize logging")?;

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, args).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, args: Args) -> Result<()> {
  let base_url = args.base_url.unwrap_or_else(|| constants().base_url.clone());
  info!(backend = args.backend.label(), base_url = %base_url, "streamfree starting");
  let mut app = App::new(args.backend, &base_url);

  loop {
    app.check_pending().await?;
    app.player.check_mpv_status();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.player.stop().await?;
  info!("streamfree exiting");
  Ok(())
}
