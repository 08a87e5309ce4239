//! Network-backed catalog: raw endpoint calls plus the composite search,
//! trending, validation and download operations built on them.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{SHORT_KEY_ERROR, VideoBackend, key_too_short};
use crate::constants::constants;
use crate::envelope::{Envelope, Pagination};
use crate::jitter::{DelayWindow, jitter};
use crate::model::{DownloadTicket, GenreListing, KeyStatus, Quality, RawItem, RecentFeed, Video, VideoDetail};
use crate::normalize::{pick_stream, to_videos};
use crate::samples::fallback_trending;
use crate::transport::{HttpBackend, Transport};

/// Everything but RFC 3986 unreserved characters, so `?`, `#` and `/` stay inside the segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

fn segment(raw: &str) -> String {
  utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

pub struct CatalogService<H: HttpBackend> {
  transport: Transport<H>,
  download_delay: DelayWindow,
}

impl<H: HttpBackend> CatalogService<H> {
  pub fn new(transport: Transport<H>) -> Self {
    Self { transport, download_delay: constants().download_delay }
  }

  #[cfg(test)]
  fn without_delays(mut self) -> Self {
    self.download_delay = DelayWindow::ZERO;
    self
  }

  #[cfg(test)]
  pub(crate) fn transport(&self) -> &Transport<H> {
    &self.transport
  }

  // --- Raw endpoints ---
  // Only /recent and /genre feed the composite operations; the rest are exposed as-is.

  pub async fn get_recent(&self) -> Envelope<Value> {
    self.transport.request("/recent", &[]).await
  }

  #[allow(dead_code)]
  pub async fn get_by_index(&self, page: u32) -> Envelope<Value> {
    self.transport.request(&format!("/index/{}", page), &[]).await
  }

  #[allow(dead_code)]
  pub async fn get_comments(&self, post_id: &str) -> Envelope<Value> {
    self.transport.request(&format!("/comments/{}", segment(post_id)), &[]).await
  }

  /// The upstream path really is spelled `comming-soon`.
  #[allow(dead_code)]
  pub async fn get_upcoming(&self) -> Envelope<Value> {
    self.transport.request("/comming-soon", &[]).await
  }

  #[allow(dead_code)]
  pub async fn get_detail(&self, slug: &str) -> Envelope<Value> {
    self.transport.request(&format!("/detail/{}", segment(slug)), &[]).await
  }

  #[allow(dead_code)]
  pub async fn get_series(&self, slug: &str) -> Envelope<Value> {
    self.transport.request(&format!("/series/{}", segment(slug)), &[]).await
  }

  pub async fn search_by_genre(&self, genre: &str) -> Envelope<Value> {
    self.transport.request(&format!("/genre/{}", segment(genre)), &[]).await
  }

  /// Carousel plus flattened posts from `/recent`, or `None` when the call failed.
  async fn recent_items(&self) -> Option<Vec<RawItem>> {
    let body = self.get_recent().await.into_data()?;
    Some(decode_or_default::<RecentFeed>(body).flatten())
  }
}

/// Shape the body leniently: anything that doesn't fit reads as empty.
fn decode_or_default<T: DeserializeOwned + Default>(body: Value) -> T {
  serde_json::from_value(body).unwrap_or_else(|e| {
    debug!(err = %e, "catalog: unexpected body shape, treating as empty");
    T::default()
  })
}

#[async_trait]
impl<H: HttpBackend + 'static> VideoBackend for CatalogService<H> {
  fn name(&self) -> &'static str {
    "catalog"
  }

  /// Genre lookup first; on failure, filter the recent feed by title/description.
  async fn search_videos(&self, query: &str, page: u32) -> Envelope<Vec<Video>> {
    let genre = self.search_by_genre(query).await;
    if let Some(body) = genre.into_data() {
      let listing: GenreListing = decode_or_default(body);
      if let Some(result) = listing.result {
        let total = listing.total.unwrap_or(result.len());
        info!(query, hits = result.len(), "catalog: genre search");
        return Envelope::ok(to_videos(&result)).with_pagination(Pagination {
          page,
          limit: None,
          total,
          has_more: false,
        });
      }
    }

    let Some(items) = self.recent_items().await else {
      warn!(query, "catalog: search failed on both genre and recent feeds");
      return Envelope::failed("Search failed").with_data(Vec::new());
    };

    let needle = query.to_lowercase();
    let matched: Vec<RawItem> = items.into_iter().filter(|item| item.matches(&needle)).collect();
    info!(query, hits = matched.len(), "catalog: search via recent feed");
    Envelope::ok(to_videos(&matched)).with_pagination(Pagination {
      page,
      limit: None,
      total: matched.len(),
      has_more: false,
    })
  }

  /// Never fails: a broken feed falls back to the fixed dataset.
  async fn trending_videos(&self, limit: usize) -> Envelope<Vec<Video>> {
    let items = match self.recent_items().await {
      Some(items) => items,
      None => {
        info!("catalog: using fallback trending data");
        fallback_trending()
      }
    };
    let items: Vec<RawItem> = items.into_iter().take(limit).collect();
    Envelope::ok(to_videos(&items))
  }

  async fn video_details(&self, id: &str) -> Envelope<VideoDetail> {
    Envelope::ok(VideoDetail::synthetic(id))
  }

  async fn validate_api_key(&self) -> Envelope<KeyStatus> {
    if key_too_short(self.transport.api_key(), constants().min_key_len) {
      return Envelope::failed(SHORT_KEY_ERROR);
    }

    let probe = self.get_recent().await;
    let used_today = rand::rng().random_range(0..100);
    let mut env = Envelope::ok(KeyStatus::premium(probe.success, used_today));
    if !probe.success {
      env.success = false;
      env.error = Some("API key is invalid or the server is unreachable".to_string());
    }
    env
  }

  /// Synthesized ticket; the per-video detail endpoint is never consulted.
  async fn download_video(&self, id: &str, quality: Quality) -> Envelope<DownloadTicket> {
    jitter(self.download_delay).await;
    let download_url = pick_stream(&mut rand::rng()).to_string();
    Envelope::ok(DownloadTicket { download_url, filename: format!("streamfree_{}_{}.mp4", id, quality.label()) })
  }
}
