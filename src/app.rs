use anyhow::Result;
use ratatui::widgets::ListState;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::backend::{BackendKind, VideoBackend, build_backend};
use crate::config::Settings;
use crate::constants::constants;
use crate::envelope::Envelope;
use crate::model::{DownloadTicket, KeyStatus, Quality, Video};
use crate::player::MediaPlayer;
use crate::state::{Dialog, Effect, Tab, View, ViewState};
use crate::theme::THEMES;

/// Keyboard focus on the home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
}

/// In-flight backend calls, each tagged with the request token it answers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) search_rx: Option<(u64, oneshot::Receiver<Envelope<Vec<Video>>>)>,
  pub(crate) trending_rx: Option<(u64, oneshot::Receiver<Envelope<Vec<Video>>>)>,
  pub(crate) download_rx: Option<(u64, Quality, oneshot::Receiver<Envelope<DownloadTicket>>)>,
  pub(crate) validate_rx: Option<oneshot::Receiver<Envelope<KeyStatus>>>,
}

impl AsyncTasks {
  pub(crate) fn is_idle(&self) -> bool {
    self.search_rx.is_none() && self.trending_rx.is_none() && self.download_rx.is_none() && self.validate_rx.is_none()
  }
}

pub struct App {
  pub state: ViewState,
  pub backend: Arc<dyn VideoBackend>,
  backend_kind: BackendKind,
  base_url: String,
  client: Client,
  settings: Settings,
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub list_state: ListState,
  pub player: MediaPlayer,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
  /// When the last error was set, for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(backend_kind: BackendKind, base_url: &str) -> Self {
    let settings = Settings::load();
    let client = Client::new();
    let backend = build_backend(backend_kind, None, base_url, &client);
    let mut app = Self::from_parts(backend_kind, base_url, client, settings, backend);
    app.start();
    app
  }

  fn from_parts(
    backend_kind: BackendKind,
    base_url: &str,
    client: Client,
    settings: Settings,
    backend: Arc<dyn VideoBackend>,
  ) -> Self {
    Self {
      state: ViewState::new(),
      backend,
      backend_kind,
      base_url: base_url.to_string(),
      client,
      settings,
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      theme_index: 0,
      list_state: ListState::default(),
      player: MediaPlayer::new(),
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      tasks: AsyncTasks::default(),
      error_time: None,
    }
  }

  fn start(&mut self) {
    let key = self.settings.api_key.clone();
    info!(backend = self.backend_kind.label(), has_key = key.is_some(), "app: starting");
    let effects = self.state.startup(key.as_deref());
    self.apply(effects);
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    &THEMES[self.theme_index % THEMES.len()]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.clear_error();
    }
  }

  /// Execute side effects requested by a state transition.
  pub fn apply(&mut self, effects: Vec<Effect>) {
    for effect in effects {
      match effect {
        Effect::RebuildBackend(key) => {
          debug!(backend = self.backend_kind.label(), has_key = key.is_some(), "app: rebuilding backend");
          let validate = key.is_some();
          self.backend = build_backend(self.backend_kind, key, &self.base_url, &self.client);
          self.info_message = None;
          self.tasks.validate_rx = None;
          if validate {
            self.trigger_validate();
          }
        }
        Effect::PersistKey(key) => {
          self.settings.api_key = key;
          if let Err(e) = self.settings.save() {
            warn!(err = %e, "settings: save failed");
            self.set_error(format!("Could not save settings: {:#}", e));
          }
        }
        Effect::LoadTrending { token } => {
          let backend = Arc::clone(&self.backend);
          let limit = constants().trending_limit;
          let (tx, rx) = oneshot::channel();
          tokio::spawn(async move {
            let _ = tx.send(backend.trending_videos(limit).await);
          });
          self.tasks.trending_rx = Some((token, rx));
        }
        Effect::Search { query, token } => {
          info!(query = %query, "search triggered");
          self.status_message = Some(format!("Searching '{}'…", query));
          let backend = Arc::clone(&self.backend);
          let (tx, rx) = oneshot::channel();
          tokio::spawn(async move {
            let _ = tx.send(backend.search_videos(&query, 1).await);
          });
          self.tasks.search_rx = Some((token, rx));
        }
        Effect::Download { video_id, quality, token } => {
          info!(id = %video_id, quality = quality.label(), "download requested");
          let backend = Arc::clone(&self.backend);
          let (tx, rx) = oneshot::channel();
          tokio::spawn(async move {
            let _ = tx.send(backend.download_video(&video_id, quality).await);
          });
          self.tasks.download_rx = Some((token, quality, rx));
        }
      }
    }
  }

  /// Check the freshly configured key in the background.
  fn trigger_validate(&mut self) {
    let backend = Arc::clone(&self.backend);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(backend.validate_api_key().await);
    });
    self.tasks.validate_rx = Some(rx);
  }

  pub async fn check_pending(&mut self) -> Result<()> {
    if let Some((token, mut rx)) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok(env) => {
          self.status_message = None;
          if self.state.search_finished(token, env) && !self.state.results.is_empty() {
            self.list_state.select(Some(0));
            self.mode = AppMode::Results;
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some((token, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.state.search_finished(token, Envelope::failed("Search task failed."));
        }
      }
    }

    if let Some((token, mut rx)) = self.tasks.trending_rx.take() {
      match rx.try_recv() {
        Ok(env) => {
          debug!(success = env.success, "trending: response");
          self.state.trending_finished(token, env);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.trending_rx = Some((token, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.state.trending_finished(token, Envelope::failed("Trending task failed."));
        }
      }
    }

    if let Some((token, quality, mut rx)) = self.tasks.download_rx.take() {
      match rx.try_recv() {
        Ok(env) => {
          self.state.download_finished(token, quality, env);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.download_rx = Some((token, quality, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.state.download_finished(token, quality, Envelope::failed("Download task failed."));
        }
      }
    }

    if let Some(mut rx) = self.tasks.validate_rx.take() {
      match rx.try_recv() {
        Ok(env) => match (env.success, env.data.as_ref()) {
          (true, Some(status)) => {
            info!(plan = %status.plan, used = status.used_today, "api key accepted");
            self.info_message = Some(format!(
              "API key accepted ({} plan, {}/{} used today)",
              status.plan, status.used_today, status.daily_limit
            ));
          }
          _ => {
            warn!(err = env.error_message(), "api key rejected");
            self.set_error(format!("API key check failed: {}", env.error_message()));
          }
        },
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.validate_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }

    self.sync_selection();
    Ok(())
  }

  /// Keep the list selection inside the visible list.
  pub fn sync_selection(&mut self) {
    let count = self.state.visible().len();
    if count == 0 {
      self.list_state.select(None);
      if self.mode == AppMode::Results {
        self.mode = AppMode::Input;
      }
    } else {
      let sel = self.list_state.selected().unwrap_or(0);
      self.list_state.select(Some(sel.min(count - 1)));
    }
  }

  pub fn selected_video(&self) -> Option<&Video> {
    self.list_state.selected().and_then(|i| self.state.visible().get(i))
  }

  /// Video the current action applies to: the one playing in the player view,
  /// otherwise the list selection.
  pub fn focused_video(&self) -> Option<&Video> {
    match self.state.view {
      View::Player => self.state.selected.as_ref(),
      View::Home => self.selected_video(),
    }
  }

  pub fn trigger_search(&mut self) {
    self.clear_error();
    let query = self.input.clone();
    let effects = self.state.submit_search(&query);
    if self.state.tab == Tab::Trending {
      self.tasks.search_rx = None;
      self.status_message = None;
    }
    self.apply(effects);
  }

  pub fn show_trending(&mut self) {
    self.state.show_trending();
    self.tasks.search_rx = None;
    self.status_message = None;
    self.input.clear();
    self.cursor_position = 0;
    self.input_scroll = 0;
    self.list_state.select(Some(0));
  }

  pub fn toggle_tab(&mut self) {
    match self.state.tab {
      Tab::Trending => self.state.show_search_results(),
      Tab::Search => self.state.tab = Tab::Trending,
    }
    self.list_state.select(Some(0));
  }

  pub async fn play_selected(&mut self) {
    let Some(video) = self.selected_video().cloned() else { return };
    self.state.play(video.clone());
    self.start_playback(&video).await;
  }

  pub async fn start_playback(&mut self, video: &Video) {
    self.clear_error();
    if let Err(e) = self.player.play(video).await {
      warn!(err = %e, "player: failed to start");
      self.set_error(format!("Playback error: {:#}", e));
      let _ = self.player.stop().await;
    }
  }

  pub async fn back_to_home(&mut self) -> Result<()> {
    self.player.stop().await?;
    self.state.back();
    Ok(())
  }

  pub fn request_download(&mut self) {
    let Some(video) = self.focused_video().cloned() else { return };
    self.state.request_download(video);
  }

  pub fn confirm_download(&mut self) {
    let Some(Dialog::Download { choice, .. }) = self.state.dialog else { return };
    let quality = Quality::ALL[choice % Quality::ALL.len()];
    let effects = self.state.confirm_download(quality);
    self.apply(effects);
  }

  pub fn save_settings(&mut self) {
    let Some(Dialog::Settings { ref draft, .. }) = self.state.dialog else { return };
    let draft = draft.clone();
    let effects = self.state.save_key(&draft);
    self.apply(effects);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mock::{MockLatency, MockService};

  fn app_with_mock(key: Option<&str>) -> App {
    let backend: Arc<dyn VideoBackend> = Arc::new(MockService::new(key.map(str::to_string), MockLatency::none()));
    let settings = Settings { api_key: key.map(str::to_string) };
    App::from_parts(BackendKind::Mock, "https://catalog.test", Client::new(), settings, backend)
  }

  async fn settle(app: &mut App) {
    tokio::time::timeout(Duration::from_secs(2), async {
      while !app.tasks.is_idle() {
        app.check_pending().await.unwrap();
        tokio::task::yield_now().await;
      }
    })
    .await
    .unwrap();
  }

  #[tokio::test]
  async fn no_key_start_spawns_no_requests() {
    let mut app = app_with_mock(None);
    app.start();
    assert!(app.tasks.is_idle());
    assert!(app.state.needs_key());
    assert_eq!(app.backend.name(), "mock");
  }

  #[tokio::test]
  async fn no_key_start_against_catalog_shows_prompt_without_network() {
    use crate::catalog::CatalogService;
    use crate::transport::testing::{ScriptedHttp, transport};
    use ratatui::{Terminal, backend::TestBackend};

    let catalog = Arc::new(CatalogService::new(transport(ScriptedHttp::offline(), None)));
    let backend: Arc<dyn VideoBackend> = catalog.clone();
    let mut app =
      App::from_parts(BackendKind::Catalog, "https://catalog.test", Client::new(), Settings::default(), backend);
    app.start();
    assert!(app.tasks.is_idle());
    app.check_pending().await.unwrap();

    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    terminal.draw(|frame| crate::ui::ui(frame, &mut app)).unwrap();
    let screen: String = terminal.backend().buffer().content().iter().map(|cell| cell.symbol()).collect();
    assert!(screen.contains("API Key Required"));
    assert!(screen.contains("[catalog]"));
    assert_eq!(catalog.transport().http().calls(), 0);
  }

  #[tokio::test]
  async fn search_results_land_in_list() {
    let mut app = app_with_mock(Some("long-enough-key"));
    app.state.api_key = Some("long-enough-key".to_string());
    app.input = "ocean".to_string();
    app.trigger_search();
    assert!(app.status_message.is_some());
    settle(&mut app).await;

    assert_eq!(app.state.tab, Tab::Search);
    assert_eq!(app.state.results.len(), 3);
    assert_eq!(app.mode, AppMode::Results);
    assert_eq!(app.list_state.selected(), Some(0));
    assert!(app.status_message.is_none());
  }

  #[tokio::test]
  async fn blank_search_drops_pending_request() {
    let mut app = app_with_mock(Some("long-enough-key"));
    app.state.api_key = Some("long-enough-key".to_string());
    app.input = "ocean".to_string();
    app.trigger_search();
    app.input = "  ".to_string();
    app.trigger_search();
    assert!(app.tasks.search_rx.is_none());
    assert_eq!(app.state.tab, Tab::Trending);
  }

  #[tokio::test]
  async fn download_alert_after_confirm() {
    let mut app = app_with_mock(Some("long-enough-key"));
    app.state.api_key = Some("long-enough-key".to_string());
    app.state.results = crate::samples::demo_videos();
    app.state.tab = Tab::Search;
    app.list_state.select(Some(0));
    app.request_download();
    app.confirm_download();
    settle(&mut app).await;
    assert!(matches!(&app.state.dialog, Some(Dialog::Alert(msg)) if msg.contains("video_1_720p.mp4")));
  }

  #[tokio::test]
  async fn saving_key_validates_it() {
    let mut app = app_with_mock(None);
    app.apply(vec![Effect::RebuildBackend(Some("long-enough-key".to_string()))]);
    assert!(app.tasks.validate_rx.is_some());
    settle(&mut app).await;
    assert!(app.info_message.as_deref().is_some_and(|m| m.contains("Premium")));
  }

  #[test]
  fn selection_is_clamped_to_visible_list() {
    let mut app = app_with_mock(None);
    app.state.trending = crate::samples::demo_videos();
    app.list_state.select(Some(10));
    app.sync_selection();
    assert_eq!(app.list_state.selected(), Some(3));

    app.state.trending.clear();
    app.mode = AppMode::Results;
    app.sync_selection();
    assert_eq!(app.list_state.selected(), None);
    assert_eq!(app.mode, AppMode::Input);
  }

  #[test]
  fn theme_cycles() {
    let mut app = app_with_mock(None);
    let first = app.theme().name;
    for _ in 0..THEMES.len() {
      app.next_theme();
    }
    assert_eq!(app.theme().name, first);
  }
}
