//! Fully synthetic backend: same surface as the catalog, no network at all.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

use crate::backend::{SHORT_KEY_ERROR, VideoBackend, key_too_short};
use crate::constants::{constants, sample_stream};
use crate::envelope::{Envelope, Pagination};
use crate::model::{DownloadTicket, KeyStatus, Quality, Video, VideoDetail, VideoFormat};
use crate::normalize::days_ago_label;
use crate::samples::mock_trending;

const SEARCH_PAGE_SIZE: usize = 20;

/// Fixed simulated latency per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLatency {
  pub search: Duration,
  pub trending: Duration,
  pub details: Duration,
  pub validate: Duration,
  pub download: Duration,
}

impl Default for MockLatency {
  fn default() -> Self {
    let c = constants();
    Self {
      search: Duration::from_millis(c.mock_search_ms),
      trending: Duration::from_millis(c.mock_trending_ms),
      details: Duration::from_millis(c.mock_details_ms),
      validate: Duration::from_millis(c.mock_validate_ms),
      download: Duration::from_millis(c.mock_download_ms),
    }
  }
}

impl MockLatency {
  #[cfg(test)]
  pub fn none() -> Self {
    Self {
      search: Duration::ZERO,
      trending: Duration::ZERO,
      details: Duration::ZERO,
      validate: Duration::ZERO,
      download: Duration::ZERO,
    }
  }
}

pub struct MockService {
  api_key: Option<String>,
  latency: MockLatency,
}

impl MockService {
  pub fn new(api_key: Option<String>, latency: MockLatency) -> Self {
    Self { api_key: api_key.filter(|k| !k.is_empty()), latency }
  }

  async fn simulate(&self, wait: Duration) {
    if !wait.is_zero() {
      debug!(ms = wait.as_millis() as u64, "mock: simulating latency");
      tokio::time::sleep(wait).await;
    }
  }

  fn search_results(query: &str) -> Vec<Video> {
    let mut rng = rand::rng();
    let stamp = chrono::Utc::now().timestamp_millis();
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let palette = ["6366f1", "8b5cf6", "ec4899"];
    let blurbs = [
      "This is demo content showing what API search results look like.",
      "Demo content with high streaming quality.",
      "Ad-free demo streaming.",
    ];

    (1..=3)
      .map(|n| Video {
        id: format!("search_{}_{}", stamp, n),
        title: format!("{} - Video Result {}", query, n),
        thumbnail: format!("https://via.placeholder.com/320x180/{}/ffffff?text={}+{}", palette[n - 1], encoded, n),
        duration: rng.random_range(300..7500),
        views: rng.random_range(0..10_000_000),
        upload_date: days_ago_label(rng.random_range(1..=30)),
        url: sample_stream(n - 1).to_string(),
        description: format!("Search result for \"{}\". {}", query, blurbs[n - 1]),
        slug: None,
        web_url: None,
        kind: "video".to_string(),
        quality: Quality::ALL.to_vec(),
        formats: VideoFormat::ALL.to_vec(),
      })
      .collect()
  }
}

#[async_trait]
impl VideoBackend for MockService {
  fn name(&self) -> &'static str {
    "mock"
  }

  async fn search_videos(&self, query: &str, page: u32) -> Envelope<Vec<Video>> {
    self.simulate(self.latency.search).await;
    let results = Self::search_results(query);
    let total = results.len();
    Envelope::ok(results).with_pagination(Pagination { page, limit: Some(SEARCH_PAGE_SIZE), total, has_more: false })
  }

  async fn trending_videos(&self, limit: usize) -> Envelope<Vec<Video>> {
    self.simulate(self.latency.trending).await;
    Envelope::ok(mock_trending().into_iter().take(limit).collect())
  }

  async fn video_details(&self, id: &str) -> Envelope<VideoDetail> {
    self.simulate(self.latency.details).await;
    Envelope::ok(VideoDetail::synthetic(id))
  }

  async fn validate_api_key(&self) -> Envelope<KeyStatus> {
    if key_too_short(self.api_key.as_deref(), constants().min_key_len) {
      return Envelope::failed(SHORT_KEY_ERROR);
    }
    self.simulate(self.latency.validate).await;
    let used_today = rand::rng().random_range(0..100);
    Envelope::ok(KeyStatus::premium(true, used_today))
  }

  async fn download_video(&self, id: &str, quality: Quality) -> Envelope<DownloadTicket> {
    self.simulate(self.latency.download).await;
    let Some(detail) = self.video_details(id).await.into_data() else {
      return Envelope::failed("Could not get a download URL");
    };
    match detail.download_urls.get(&quality) {
      Some(url) => Envelope::ok(DownloadTicket {
        download_url: url.clone(),
        filename: format!("video_{}_{}.mp4", id, quality.label()),
      }),
      None => Envelope::failed(format!("No {} download available", quality.label())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn service(key: Option<&str>) -> MockService {
    MockService::new(key.map(str::to_string), MockLatency::none())
  }

  #[tokio::test]
  async fn search_echoes_query_in_three_results() {
    let env = service(None).search_videos("lofi beats", 2).await;
    assert!(env.success);
    let videos = env.data.unwrap();
    assert_eq!(videos.len(), 3);
    assert_eq!(videos[0].title, "lofi beats - Video Result 1");
    assert!(videos[0].thumbnail.contains("lofi+beats+1"));
    assert!(videos.iter().all(|v| (300..7500).contains(&v.duration) && v.views < 10_000_000));
    assert!(videos.iter().all(|v| v.upload_date.ends_with("ago")));
    assert_eq!(env.pagination, Some(Pagination { page: 2, limit: Some(20), total: 3, has_more: false }));
  }

  #[tokio::test]
  async fn trending_truncates_fixed_set() {
    let svc = service(None);
    assert_eq!(svc.trending_videos(2).await.data.map(|v| v.len()), Some(2));
    assert_eq!(svc.trending_videos(20).await.data.map(|v| v.len()), Some(4));
  }

  #[tokio::test]
  async fn validate_rejects_short_key() {
    assert!(!service(Some("tiny")).validate_api_key().await.success);
    let env = service(Some("long-enough-key")).validate_api_key().await;
    assert!(env.success);
    assert!(env.data.unwrap().valid);
  }

  #[tokio::test]
  async fn download_uses_detail_url_for_quality() {
    let env = service(Some("long-enough-key")).download_video("v1", Quality::P720).await;
    let ticket = env.data.unwrap();
    assert_eq!(ticket.filename, "video_v1_720p.mp4");
    assert_eq!(ticket.download_url, sample_stream(1));
  }
}
