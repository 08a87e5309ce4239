use serde::Serialize;

/// Pagination descriptor attached to search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit: Option<usize>,
  pub total: usize,
  pub has_more: bool,
}

/// Tagged result every service operation resolves to.
///
/// Services never return `Err` to the shell: failures are absorbed into
/// `success: false` with an `error` message and, where one exists, a
/// `fallback` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fallback: Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
  pub fn ok(data: T) -> Self {
    Self { success: true, data: Some(data), error: None, fallback: None, pagination: None }
  }

  pub fn failed(error: impl Into<String>) -> Self {
    Self { success: false, data: None, error: Some(error.into()), fallback: None, pagination: None }
  }

  pub fn with_data(mut self, data: T) -> Self {
    self.data = Some(data);
    self
  }

  pub fn with_fallback(mut self, fallback: Option<T>) -> Self {
    self.fallback = fallback;
    self
  }

  pub fn with_pagination(mut self, pagination: Pagination) -> Self {
    self.pagination = Some(pagination);
    self
  }

  /// Successful payload, if any.
  pub fn into_data(self) -> Option<T> {
    if self.success { self.data } else { None }
  }

  /// Human-readable failure reason.
  pub fn error_message(&self) -> &str {
    self.error.as_deref().unwrap_or("unknown error")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ok_serializes_without_failure_fields() {
    let env = Envelope::ok(vec![1, 2, 3]);
    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json, serde_json::json!({ "success": true, "data": [1, 2, 3] }));
  }

  #[test]
  fn failure_carries_fallback_and_empty_data() {
    let env: Envelope<Vec<u8>> = Envelope::failed("Search failed").with_data(Vec::new()).with_fallback(None);
    assert!(!env.success);
    assert_eq!(env.error_message(), "Search failed");
    assert_eq!(env.data, Some(Vec::new()));
    assert_eq!(env.clone().into_data(), None);
  }

  #[test]
  fn pagination_uses_camel_case() {
    let env = Envelope::ok(0u8).with_pagination(Pagination { page: 2, limit: None, total: 5, has_more: false });
    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json["pagination"], serde_json::json!({ "page": 2, "total": 5, "hasMore": false }));
  }
}
