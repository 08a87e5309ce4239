//! Application state and its transitions.
//!
//! Every user action is a method on [`ViewState`] that mutates the state and
//! returns the side effects the runtime should perform. Nothing here touches
//! the network, the terminal or the disk.

use crate::envelope::Envelope;
use crate::model::{DownloadTicket, Quality, Video};
use crate::samples::demo_videos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
  #[default]
  Home,
  Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
  #[default]
  Trending,
  Search,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
  /// Key entry. `cursor` is a char index into `draft`.
  Settings { draft: String, cursor: usize },
  /// Quality picker. `choice` indexes [`Quality::ALL`].
  Download { video: Video, choice: usize, pending: Option<Quality> },
  Alert(String),
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  LoadTrending { token: u64 },
  Search { query: String, token: u64 },
  Download { video_id: String, quality: Quality, token: u64 },
  PersistKey(Option<String>),
  RebuildBackend(Option<String>),
}

/// Latest issued request id per operation. A response whose token no longer
/// matches is dropped.
#[derive(Debug, Default, Clone, Copy)]
struct Tokens {
  search: u64,
  trending: u64,
  download: u64,
}

#[derive(Debug, Default)]
pub struct ViewState {
  pub view: View,
  pub tab: Tab,
  pub api_key: Option<String>,
  pub query: String,
  pub results: Vec<Video>,
  pub trending: Vec<Video>,
  pub selected: Option<Video>,
  pub dialog: Option<Dialog>,
  pub searching: bool,
  pub loading_trending: bool,
  download_title: Option<String>,
  tokens: Tokens,
}

fn normalize_key(key: Option<&str>) -> Option<String> {
  key.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string)
}

impl ViewState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn needs_key(&self) -> bool {
    self.api_key.is_none()
  }

  /// Loading indicator for the active tab.
  pub fn loading(&self) -> bool {
    match self.tab {
      Tab::Search => self.searching,
      Tab::Trending => self.loading_trending,
    }
  }

  /// List currently shown on the home view.
  pub fn visible(&self) -> &[Video] {
    match self.tab {
      Tab::Trending => &self.trending,
      Tab::Search => &self.results,
    }
  }

  fn seed_demo(&mut self) {
    if self.results.is_empty() {
      self.results = demo_videos();
    }
  }

  fn load_trending(&mut self) -> Effect {
    self.tokens.trending += 1;
    self.loading_trending = true;
    Effect::LoadTrending { token: self.tokens.trending }
  }

  fn cancel_search(&mut self) {
    self.tokens.search += 1;
    self.searching = false;
  }

  /// Apply the key read from settings at launch. Without a key nothing is
  /// requested.
  pub fn startup(&mut self, key: Option<&str>) -> Vec<Effect> {
    self.api_key = normalize_key(key);
    let Some(key) = self.api_key.clone() else {
      return Vec::new();
    };
    self.seed_demo();
    vec![Effect::RebuildBackend(Some(key)), self.load_trending()]
  }

  pub fn open_settings(&mut self) {
    let draft = self.api_key.clone().unwrap_or_default();
    let cursor = draft.chars().count();
    self.dialog = Some(Dialog::Settings { draft, cursor });
  }

  pub fn close_dialog(&mut self) {
    self.dialog = None;
  }

  pub fn save_key(&mut self, draft: &str) -> Vec<Effect> {
    let key = normalize_key(Some(draft));
    self.api_key = key.clone();
    self.dialog = None;

    let mut effects = vec![Effect::PersistKey(key.clone()), Effect::RebuildBackend(key.clone())];
    if key.is_some() {
      self.seed_demo();
      effects.push(self.load_trending());
    } else {
      self.tokens.trending += 1;
      self.loading_trending = false;
      self.trending.clear();
    }
    effects
  }

  pub fn submit_search(&mut self, query: &str) -> Vec<Effect> {
    self.query = query.to_string();
    if self.needs_key() {
      self.open_settings();
      return Vec::new();
    }

    let trimmed = query.trim();
    if trimmed.is_empty() {
      self.cancel_search();
      self.tab = Tab::Trending;
      self.results.clear();
      return Vec::new();
    }

    self.tab = Tab::Search;
    self.searching = true;
    self.tokens.search += 1;
    vec![Effect::Search { query: trimmed.to_string(), token: self.tokens.search }]
  }

  /// Returns false when the response was stale and dropped.
  pub fn search_finished(&mut self, token: u64, env: Envelope<Vec<Video>>) -> bool {
    if token != self.tokens.search {
      return false;
    }
    self.searching = false;
    if env.success {
      self.results = env.data.unwrap_or_default();
    } else {
      self.results.clear();
      self.dialog = Some(Dialog::Alert(format!("Search failed. Please try again.\n{}", env.error_message())));
    }
    true
  }

  pub fn trending_finished(&mut self, token: u64, env: Envelope<Vec<Video>>) -> bool {
    if token != self.tokens.trending {
      return false;
    }
    self.loading_trending = false;
    if let Some(videos) = env.into_data() {
      self.trending = videos;
    }
    true
  }

  /// Trending tab button: drops the search entirely.
  pub fn show_trending(&mut self) {
    self.cancel_search();
    self.tab = Tab::Trending;
    self.results.clear();
    self.query.clear();
  }

  /// Search-results tab button, only offered while results exist.
  pub fn show_search_results(&mut self) {
    if !self.results.is_empty() {
      self.tab = Tab::Search;
    }
  }

  pub fn play(&mut self, video: Video) {
    self.selected = Some(video);
    self.view = View::Player;
  }

  pub fn back(&mut self) {
    self.view = View::Home;
    self.selected = None;
  }

  pub fn request_download(&mut self, video: Video) {
    if self.needs_key() {
      self.open_settings();
      return;
    }
    let choice = Quality::ALL.iter().position(|q| *q == Quality::default()).unwrap_or(0);
    self.dialog = Some(Dialog::Download { video, choice, pending: None });
  }

  pub fn confirm_download(&mut self, quality: Quality) -> Vec<Effect> {
    if self.needs_key() {
      self.dialog = Some(Dialog::Alert("An API key is required to download".to_string()));
      return Vec::new();
    }
    let Some(Dialog::Download { video, pending, .. }) = self.dialog.as_mut() else {
      return Vec::new();
    };
    if pending.is_some() {
      return Vec::new();
    }
    *pending = Some(quality);
    self.download_title = Some(video.title.clone());
    self.tokens.download += 1;
    vec![Effect::Download { video_id: video.id.clone(), quality, token: self.tokens.download }]
  }

  pub fn download_finished(&mut self, token: u64, quality: Quality, env: Envelope<DownloadTicket>) -> bool {
    if token != self.tokens.download {
      return false;
    }
    let title = self.download_title.take().unwrap_or_default();
    let reason = env.error_message().to_string();
    let message = match env.into_data() {
      Some(ticket) => {
        format!("Download {} started for: {}\n{}\n{}", quality.label(), title, ticket.filename, ticket.download_url)
      }
      None => format!("Could not start the download. Please try again.\n{}", reason),
    };
    self.dialog = Some(Dialog::Alert(message));
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const KEY: &str = "valid-key-123";

  fn with_key() -> ViewState {
    let mut state = ViewState::new();
    state.startup(Some(KEY));
    state
  }

  fn search_token(effects: &[Effect]) -> u64 {
    effects
      .iter()
      .find_map(|e| match e {
        Effect::Search { token, .. } => Some(*token),
        _ => None,
      })
      .unwrap()
  }

  #[test]
  fn no_key_startup_requests_nothing_and_shows_prompt() {
    let mut state = ViewState::new();
    assert!(state.startup(None).is_empty());
    assert!(state.needs_key());
    assert!(state.results.is_empty());

    let mut blank = ViewState::new();
    assert!(blank.startup(Some("   ")).is_empty());
    assert!(blank.needs_key());
  }

  #[test]
  fn startup_with_key_seeds_demo_and_loads_trending() {
    let mut state = ViewState::new();
    let effects = state.startup(Some(KEY));
    assert_eq!(effects[0], Effect::RebuildBackend(Some(KEY.to_string())));
    assert!(matches!(effects[1], Effect::LoadTrending { .. }));
    assert_eq!(state.results.len(), 4);
    assert!(state.loading_trending);
  }

  #[test]
  fn blank_search_resets_to_trending_without_effects() {
    let mut state = with_key();
    state.tab = Tab::Search;
    assert!(!state.results.is_empty());

    assert!(state.submit_search("   ").is_empty());
    assert_eq!(state.tab, Tab::Trending);
    assert!(state.results.is_empty());
    assert!(!state.searching);
  }

  #[test]
  fn search_without_key_opens_settings() {
    let mut state = ViewState::new();
    assert!(state.submit_search("ocean").is_empty());
    assert!(matches!(state.dialog, Some(Dialog::Settings { .. })));
  }

  #[test]
  fn search_replaces_results_and_failure_alerts() {
    let mut state = with_key();
    let token = search_token(&state.submit_search("  ocean "));
    assert_eq!(state.tab, Tab::Search);
    assert!(state.loading());

    let video = demo_videos().remove(0);
    assert!(state.search_finished(token, Envelope::ok(vec![video.clone()])));
    assert_eq!(state.results, vec![video]);
    assert!(!state.loading());

    let token = search_token(&state.submit_search("desert"));
    state.search_finished(token, Envelope::failed("Search failed").with_data(Vec::new()));
    assert!(state.results.is_empty());
    assert!(matches!(&state.dialog, Some(Dialog::Alert(msg)) if msg.contains("Search failed")));
  }

  #[test]
  fn stale_search_response_is_dropped() {
    let mut state = with_key();
    let first = search_token(&state.submit_search("first"));
    let second = search_token(&state.submit_search("second"));

    assert!(!state.search_finished(first, Envelope::ok(Vec::new())));
    assert!(state.searching);
    assert!(state.search_finished(second, Envelope::ok(demo_videos())));
    assert_eq!(state.results.len(), 4);
  }

  #[test]
  fn show_trending_invalidates_in_flight_search() {
    let mut state = with_key();
    let token = search_token(&state.submit_search("ocean"));
    state.show_trending();
    assert!(!state.search_finished(token, Envelope::ok(demo_videos())));
    assert!(state.results.is_empty());
    assert!(state.query.is_empty());
    assert_eq!(state.tab, Tab::Trending);
  }

  #[test]
  fn search_tab_requires_results() {
    let mut state = with_key();
    state.show_trending();
    state.show_search_results();
    assert_eq!(state.tab, Tab::Trending);
  }

  #[test]
  fn save_key_persists_and_reloads() {
    let mut state = ViewState::new();
    state.open_settings();
    let effects = state.save_key("  fresh-key-value ");
    assert_eq!(state.api_key.as_deref(), Some("fresh-key-value"));
    assert_eq!(effects[0], Effect::PersistKey(Some("fresh-key-value".to_string())));
    assert!(effects.iter().any(|e| matches!(e, Effect::LoadTrending { .. })));
    assert!(state.dialog.is_none());
    assert_eq!(state.results.len(), 4);
  }

  #[test]
  fn clearing_key_drops_trending_and_late_responses() {
    let mut state = ViewState::new();
    let token = match state.startup(Some(KEY)).pop() {
      Some(Effect::LoadTrending { token }) => token,
      other => panic!("unexpected {:?}", other),
    };
    let effects = state.save_key("");
    assert_eq!(effects, vec![Effect::PersistKey(None), Effect::RebuildBackend(None)]);
    assert!(!state.trending_finished(token, Envelope::ok(demo_videos())));
    assert!(state.trending.is_empty());
    assert!(state.needs_key());
  }

  #[test]
  fn trending_failure_keeps_previous_list() {
    let mut state = ViewState::new();
    let Some(Effect::LoadTrending { token }) = state.startup(Some(KEY)).pop() else { panic!("no trending load") };
    state.trending_finished(token, Envelope::ok(demo_videos()));
    let Some(Effect::LoadTrending { token }) = state.save_key(KEY).pop() else { panic!("no trending load") };
    state.trending_finished(token, Envelope::failed("boom"));
    assert_eq!(state.trending.len(), 4);
    assert!(!state.loading_trending);
  }

  #[test]
  fn play_and_back() {
    let mut state = with_key();
    let video = state.results[0].clone();
    state.play(video.clone());
    assert_eq!(state.view, View::Player);
    assert_eq!(state.selected, Some(video));
    state.back();
    assert_eq!(state.view, View::Home);
    assert!(state.selected.is_none());
  }

  #[test]
  fn download_needs_key() {
    let mut state = ViewState::new();
    state.request_download(demo_videos().remove(0));
    assert!(matches!(state.dialog, Some(Dialog::Settings { .. })));
  }

  #[test]
  fn download_flow_reports_ticket() {
    let mut state = with_key();
    let video = state.results[0].clone();
    state.request_download(video.clone());
    assert!(matches!(state.dialog, Some(Dialog::Download { choice: 1, pending: None, .. })));

    let effects = state.confirm_download(Quality::P480);
    let token = match &effects[..] {
      [Effect::Download { video_id, quality: Quality::P480, token }] if *video_id == video.id => *token,
      other => panic!("unexpected {:?}", other),
    };
    assert!(state.confirm_download(Quality::P480).is_empty());

    let ticket = DownloadTicket { download_url: "https://cdn.test/a.mp4".into(), filename: "a.mp4".into() };
    assert!(state.download_finished(token, Quality::P480, Envelope::ok(ticket)));
    assert!(matches!(&state.dialog, Some(Dialog::Alert(msg)) if msg.contains("480p") && msg.contains(&video.title)));
  }

  #[test]
  fn download_failure_alerts_error() {
    let mut state = with_key();
    state.request_download(state.results[0].clone());
    let Some(Effect::Download { token, .. }) = state.confirm_download(Quality::P720).pop() else {
      panic!("no download effect")
    };
    state.download_finished(token, Quality::P720, Envelope::failed("No 720p download available"));
    assert!(matches!(&state.dialog, Some(Dialog::Alert(msg)) if msg.contains("No 720p")));
  }

  #[test]
  fn settings_draft_starts_from_current_key() {
    let mut state = with_key();
    state.open_settings();
    assert_eq!(state.dialog, Some(Dialog::Settings { draft: KEY.to_string(), cursor: KEY.len() }));
    state.close_dialog();
    assert!(state.dialog.is_none());
  }
}
