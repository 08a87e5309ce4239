use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::Client;
use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::envelope::Envelope;
use crate::mock::{MockLatency, MockService};
use crate::model::{DownloadTicket, KeyStatus, Quality, Video, VideoDetail};
use crate::transport::{ReqwestBackend, Transport, TransportConfig};

/// Operation surface the shell drives. Every call resolves to an [`Envelope`];
/// implementations absorb their own failures.
#[async_trait]
pub trait VideoBackend: Send + Sync {
  /// Short label shown in the header (e.g. "catalog", "mock").
  fn name(&self) -> &'static str;

  async fn search_videos(&self, query: &str, page: u32) -> Envelope<Vec<Video>>;

  async fn trending_videos(&self, limit: usize) -> Envelope<Vec<Video>>;

  async fn video_details(&self, id: &str) -> Envelope<VideoDetail>;

  async fn validate_api_key(&self) -> Envelope<KeyStatus>;

  async fn download_video(&self, id: &str, quality: Quality) -> Envelope<DownloadTicket>;
}

/// Which backend implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendKind {
  /// Network-backed catalog with fallback data.
  #[default]
  Catalog,
  /// Fully synthetic data, no network.
  Mock,
}

impl BackendKind {
  pub fn label(self) -> &'static str {
    match self {
      BackendKind::Catalog => "catalog",
      BackendKind::Mock => "mock",
    }
  }
}

/// Shared key check: no key, or one shorter than `min_len` characters, is rejected
/// before anything else happens.
pub fn key_too_short(key: Option<&str>, min_len: usize) -> bool {
  key.is_none_or(|k| k.chars().count() < min_len)
}

pub const SHORT_KEY_ERROR: &str = "API key is invalid or too short";

/// Build the configured backend for `api_key`.
pub fn build_backend(kind: BackendKind, api_key: Option<String>, base_url: &str, client: &Client) -> Arc<dyn VideoBackend> {
  match kind {
    BackendKind::Catalog => {
      let transport = Transport::new(ReqwestBackend::new(client.clone()), TransportConfig::new(base_url, api_key));
      Arc::new(CatalogService::new(transport))
    }
    BackendKind::Mock => Arc::new(MockService::new(api_key, MockLatency::default())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_keys_are_rejected() {
    assert!(key_too_short(None, 10));
    assert!(key_too_short(Some("short"), 10));
    assert!(key_too_short(Some("123456789"), 10));
    assert!(!key_too_short(Some("1234567890"), 10));
  }

  #[test]
  fn key_length_counts_chars_not_bytes() {
    assert!(key_too_short(Some("ééééé"), 10));
  }

  #[test]
  fn build_backend_selects_implementation() {
    let client = Client::new();
    assert_eq!(build_backend(BackendKind::Catalog, None, "https://x.test", &client).name(), "catalog");
    assert_eq!(build_backend(BackendKind::Mock, None, "https://x.test", &client).name(), "mock");
  }

  #[test]
  fn backend_kind_parses_from_cli() {
    assert_eq!(BackendKind::from_str("mock", true), Ok(BackendKind::Mock));
    assert_eq!(BackendKind::default().label(), "catalog");
  }
}
