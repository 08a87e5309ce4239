//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

use crate::jitter::DelayWindow;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub app_name: String,
  pub settings_file: String,
  pub log_file: String,

  // Upstream catalog
  pub base_url: String,
  pub user_agent: String,
  pub accept: String,
  pub accept_language: String,

  // Jitter windows
  pub request_delay: DelayWindow,
  pub challenge_delay: DelayWindow,
  pub download_delay: DelayWindow,

  // Catalog policy
  pub min_key_len: usize,
  pub trending_limit: usize,
  pub placeholder_thumbnail: String,
  pub sample_streams: Vec<String>,

  // Mock backend latency
  pub mock_search_ms: u64,
  pub mock_trending_ms: u64,
  pub mock_details_ms: u64,
  pub mock_validate_ms: u64,
  pub mock_download_ms: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

/// Sample stream URL at `idx`, wrapping around the configured set.
pub fn sample_stream(idx: usize) -> &'static str {
  let streams = &constants().sample_streams;
  &streams[idx % streams.len()]
}
