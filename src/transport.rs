use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::envelope::Envelope;
use crate::jitter::{DelayWindow, jitter};

/// Failure inside a single transport call. Never escapes [`Transport::request`].
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("network error: {0}")]
  Network(String),
  #[error("HTTP error! status: {0}")]
  Status(u16),
  #[error("invalid JSON body: {0}")]
  Decode(#[from] serde_json::Error),
}

/// Status line and body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
  pub status: u16,
  pub body: String,
}

impl RawResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// 403/503 are read as an anti-bot challenge rather than a hard failure.
  pub fn is_challenge(&self) -> bool {
    matches!(self.status, 403 | 503)
  }
}

/// HTTP seam under the transport: one GET with an explicit header list.
#[async_trait]
pub trait HttpBackend: Send + Sync {
  async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<RawResponse, TransportError>;
}

/// Production backend over a shared `reqwest::Client`.
#[derive(Clone, Default)]
pub struct ReqwestBackend {
  client: Client,
}

impl ReqwestBackend {
  pub fn new(client: Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
  async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<RawResponse, TransportError> {
    let mut req = self.client.get(url);
    for (name, value) in headers {
      req = req.header(name.as_str(), value.as_str());
    }
    let response = req.send().await.map_err(|e| TransportError::Network(e.to_string()))?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| TransportError::Network(e.to_string()))?;
    Ok(RawResponse { status, body })
  }
}

/// Where and how the transport talks to the catalog.
#[derive(Debug, Clone)]
pub struct TransportConfig {
  pub base_url: String,
  pub api_key: Option<String>,
  /// Throttle awaited before every call.
  pub request_delay: DelayWindow,
  /// Backoff before the single retry after a challenge response.
  pub challenge_delay: DelayWindow,
}

impl TransportConfig {
  pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
    let c = constants();
    Self {
      base_url: base_url.into(),
      api_key: api_key.filter(|k| !k.is_empty()),
      request_delay: c.request_delay,
      challenge_delay: c.challenge_delay,
    }
  }

  /// Same endpoints, no artificial waits.
  #[cfg(test)]
  pub fn without_delays(mut self) -> Self {
    self.request_delay = DelayWindow::ZERO;
    self.challenge_delay = DelayWindow::ZERO;
    self
  }
}

/// Thin GET wrapper: throttles, retries once on a challenge, and folds every
/// failure into an [`Envelope`].
pub struct Transport<H: HttpBackend> {
  http: H,
  config: TransportConfig,
}

impl<H: HttpBackend> Transport<H> {
  pub fn new(http: H, config: TransportConfig) -> Self {
    Self { http, config }
  }

  pub fn api_key(&self) -> Option<&str> {
    self.config.api_key.as_deref()
  }

  #[cfg(test)]
  pub fn http(&self) -> &H {
    &self.http
  }

  /// Static headers plus the key-derived auth pair when a key is configured.
  /// Caller headers replace same-named entries (case-insensitive).
  pub fn headers(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
    let c = constants();
    let mut headers: Vec<(String, String)> = [
      ("User-Agent", c.user_agent.as_str()),
      ("Accept", c.accept.as_str()),
      ("Accept-Language", c.accept_language.as_str()),
      ("Cache-Control", "no-cache"),
      ("Pragma", "no-cache"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    if let Some(key) = &self.config.api_key {
      headers.push(("Authorization".to_string(), format!("Bearer {}", key)));
      headers.push(("X-API-Key".to_string(), key.clone()));
    }

    for (name, value) in extra {
      headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
      headers.push((name.to_string(), value.to_string()));
    }
    headers
  }

  /// GET `base_url + endpoint`. Resolves to a success envelope carrying the JSON
  /// body, or a failure envelope carrying the error and the endpoint's fallback.
  pub async fn request(&self, endpoint: &str, extra: &[(&str, &str)]) -> Envelope<Value> {
    match self.fetch(endpoint, extra).await {
      Ok(data) => Envelope::ok(data),
      Err(e) => {
        warn!(endpoint, err = %e, "transport: request failed");
        Envelope::failed(e.to_string()).with_fallback(fallback_for(endpoint))
      }
    }
  }

  async fn fetch(&self, endpoint: &str, extra: &[(&str, &str)]) -> Result<Value, TransportError> {
    let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
    let headers = self.headers(extra);

    jitter(self.config.request_delay).await;
    debug!(url = %url, "transport: GET");
    let mut response = self.http.get(&url, &headers).await?;

    if response.is_challenge() {
      warn!(url = %url, status = response.status, "transport: challenge detected, retrying once");
      jitter(self.config.challenge_delay).await;
      // The retry goes through the same status/decode checks below.
      response = self.http.get(&url, &headers).await?;
    }

    if !response.is_success() {
      return Err(TransportError::Status(response.status));
    }
    Ok(serde_json::from_str(&response.body)?)
  }
}

/// Static substitute payload for an endpoint, when one exists.
pub fn fallback_for(endpoint: &str) -> Option<Value> {
  match endpoint {
    "/recent" => {
      info!(endpoint, "transport: attaching fallback payload");
      Some(json!({
        "carousel": [{
          "id": 1,
          "title": "Sample Feature 1 - Demo Content",
          "image": "https://via.placeholder.com/320x180/6366f1/ffffff?text=Feature+1",
          "slug": "sample-feature-1",
          "type": "video",
          "date": "2025-06-19",
          "description": "Sample content for demo purposes",
          "web_url": format!("{}/sample-feature-1", constants().base_url),
        }],
        "posts": [{
          "category": "Latest",
          "data": [{
            "id": 2,
            "title": "Sample Feature 2 - Another Demo",
            "image": "https://via.placeholder.com/320x180/8b5cf6/ffffff?text=Feature+2",
            "slug": "sample-feature-2",
            "type": "video",
            "date": "2025-06-19",
            "description": "Another sample content",
            "web_url": format!("{}/sample-feature-2", constants().base_url),
          }],
        }],
      }))
    }
    _ => None,
  }
}


#[cfg(test)]
mod tests {
  use super::testing::{Reply, ScriptedHttp, transport};
  use super::*;

  fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
  }

  #[tokio::test]
  async fn success_returns_json_body() {
    let t = transport(ScriptedHttp::new(vec![Reply::Json(200, json!({ "ok": 1 }))]), None);
    let env = t.request("/index/2", &[]).await;
    assert!(env.success);
    assert_eq!(env.data, Some(json!({ "ok": 1 })));
    assert_eq!(t.http().urls(), vec!["https://catalog.test/index/2"]);
  }

  #[tokio::test]
  async fn key_adds_bearer_and_custom_header() {
    let t = transport(ScriptedHttp::new(vec![Reply::Json(200, json!({}))]), Some("abcdefghijkl"));
    t.request("/recent", &[]).await;
    let headers = t.http().last_headers();
    assert_eq!(header(&headers, "authorization"), Some("Bearer abcdefghijkl"));
    assert_eq!(header(&headers, "x-api-key"), Some("abcdefghijkl"));
    assert_eq!(header(&headers, "cache-control"), Some("no-cache"));
  }

  #[tokio::test]
  async fn no_key_means_no_auth_headers() {
    let t = transport(ScriptedHttp::new(vec![Reply::Json(200, json!({}))]), None);
    t.request("/recent", &[]).await;
    let headers = t.http().last_headers();
    assert_eq!(header(&headers, "authorization"), None);
    assert_eq!(header(&headers, "x-api-key"), None);
  }

  #[test]
  fn caller_headers_replace_static_ones() {
    let t = transport(ScriptedHttp::offline(), None);
    let headers = t.headers(&[("accept", "text/html"), ("X-Trace", "1")]);
    assert_eq!(header(&headers, "Accept"), Some("text/html"));
    assert_eq!(headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("accept")).count(), 1);
    assert_eq!(header(&headers, "X-Trace"), Some("1"));
  }

  #[tokio::test]
  async fn challenge_is_retried_once() {
    let http = ScriptedHttp::new(vec![Reply::Raw(403, "blocked"), Reply::Json(200, json!({ "carousel": [] }))]);
    let t = transport(http, None);
    let env = t.request("/recent", &[]).await;
    assert!(env.success);
    assert_eq!(t.http().calls(), 2);
  }

  #[tokio::test]
  async fn failed_retry_routes_to_fallback() {
    let http = ScriptedHttp::new(vec![Reply::Raw(503, ""), Reply::Raw(503, ""), Reply::Json(200, json!({}))]);
    let t = transport(http, None);
    let env = t.request("/recent", &[]).await;
    assert!(!env.success);
    assert_eq!(env.error.as_deref(), Some("HTTP error! status: 503"));
    assert!(env.fallback.is_some());
    assert_eq!(t.http().calls(), 2);
  }

  #[tokio::test]
  async fn other_statuses_are_not_retried() {
    let t = transport(ScriptedHttp::new(vec![Reply::Raw(500, "boom")]), None);
    let env = t.request("/detail/x", &[]).await;
    assert!(!env.success);
    assert_eq!(env.fallback, None);
    assert_eq!(t.http().calls(), 1);
  }

  #[tokio::test]
  async fn bad_json_is_a_failure() {
    let t = transport(ScriptedHttp::new(vec![Reply::Raw(200, "<html>")]), None);
    let env = t.request("/recent", &[]).await;
    assert!(!env.success);
    assert!(env.error_message().starts_with("invalid JSON body"));
  }

  #[tokio::test]
  async fn network_error_is_a_failure() {
    let t = transport(ScriptedHttp::offline(), None);
    let env = t.request("/genre/drama", &[]).await;
    assert!(!env.success);
    assert!(env.error_message().contains("connection refused"));
    assert_eq!(env.fallback, None);
  }

  #[test]
  fn only_recent_has_a_fallback() {
    let recent = fallback_for("/recent").unwrap();
    assert_eq!(recent["carousel"].as_array().map(Vec::len), Some(1));
    assert_eq!(recent["posts"][0]["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(fallback_for("/comming-soon"), None);
    assert_eq!(fallback_for("/index/1"), None);
  }
}
