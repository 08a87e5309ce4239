use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::sample_stream;

// --- Upstream shapes ---
// The catalog has no stable schema, so a wrong type on one field only blanks
// that field, and a malformed element only drops that element.

/// Strings pass through, numbers are stringified, anything else is absent.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
  Ok(match Value::deserialize(deserializer)? {
    Value::String(s) => Some(s),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  })
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RawId>, D::Error> {
  Ok(match Value::deserialize(deserializer)? {
    Value::Number(n) => Some(n.as_i64().map_or_else(|| RawId::Text(n.to_string()), RawId::Num)),
    Value::String(s) => Some(RawId::Text(s)),
    _ => None,
  })
}

/// Counts may arrive as numbers or numeric strings.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
  Ok(match Value::deserialize(deserializer)? {
    Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  })
}

/// Decode each array element on its own, skipping the ones that don't fit.
/// Anything other than an array yields `None`.
fn each_element<T: DeserializeOwned>(value: Value) -> Option<Vec<T>> {
  let Value::Array(elements) = value else { return None };
  Some(elements.into_iter().filter_map(|element| serde_json::from_value(element).ok()).collect())
}

/// Missing, `null` or non-array collections read as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  Ok(each_element(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  Ok(each_element(Value::deserialize(deserializer)?))
}

/// Upstream identifier: the catalog mixes numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawId {
  Num(i64),
  Text(String),
}

impl RawId {
  pub fn as_string(&self) -> Option<String> {
    match self {
      RawId::Num(n) => Some(n.to_string()),
      RawId::Text(s) if !s.is_empty() => Some(s.clone()),
      RawId::Text(_) => None,
    }
  }
}

/// One item as the upstream catalog sends it. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawItem {
  #[serde(default, deserialize_with = "lenient_id")]
  pub id: Option<RawId>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub title: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub image: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub slug: Option<String>,
  #[serde(default, rename = "type", deserialize_with = "lenient_string")]
  pub kind: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub date: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub description: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub web_url: Option<String>,
}

impl RawItem {
  /// Case-insensitive substring match against title or description.
  pub fn matches(&self, needle_lower: &str) -> bool {
    let hit = |field: &Option<String>| field.as_deref().is_some_and(|s| s.to_lowercase().contains(needle_lower));
    hit(&self.title) || hit(&self.description)
  }
}

/// A category bucket inside the `/recent` feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostGroup {
  #[serde(default, deserialize_with = "lenient_string")]
  pub category: Option<String>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub data: Vec<RawItem>,
}

/// Body of `/recent`: a flat carousel plus category-grouped posts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecentFeed {
  #[serde(default, deserialize_with = "lenient_list")]
  pub carousel: Vec<RawItem>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub posts: Vec<PostGroup>,
}

impl RecentFeed {
  /// Carousel entries followed by every post group's items, in order.
  pub fn flatten(self) -> Vec<RawItem> {
    let mut items = self.carousel;
    items.extend(self.posts.into_iter().flat_map(|group| group.data));
    items
  }
}

/// Body of `/genre/{genre}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenreListing {
  #[serde(default, deserialize_with = "lenient_optional_list")]
  pub result: Option<Vec<RawItem>>,
  #[serde(default, deserialize_with = "lenient_count")]
  pub total: Option<usize>,
}

// --- Canonical shapes ---

/// Nominal quality label. Advertised on every record, not verified playable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Quality {
  #[serde(rename = "1080p")]
  P1080,
  #[default]
  #[serde(rename = "720p")]
  P720,
  #[serde(rename = "480p")]
  P480,
  #[serde(rename = "360p")]
  P360,
}

impl Quality {
  pub const ALL: [Quality; 4] = [Quality::P1080, Quality::P720, Quality::P480, Quality::P360];

  pub fn label(self) -> &'static str {
    match self {
      Quality::P1080 => "1080p",
      Quality::P720 => "720p",
      Quality::P480 => "480p",
      Quality::P360 => "360p",
    }
  }

  /// Approximate file size shown in the download dialog.
  pub fn nominal_size(self) -> &'static str {
    match self {
      Quality::P1080 => "~500MB",
      Quality::P720 => "~300MB",
      Quality::P480 => "~150MB",
      Quality::P360 => "~80MB",
    }
  }

  pub fn nominal_bitrate(self) -> &'static str {
    match self {
      Quality::P1080 => "5000 kbps",
      Quality::P720 => "3000 kbps",
      Quality::P480 => "1500 kbps",
      Quality::P360 => "800 kbps",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VideoFormat {
  #[serde(rename = "MP4")]
  Mp4,
  #[serde(rename = "WEBM")]
  Webm,
}

impl VideoFormat {
  pub const ALL: [VideoFormat; 2] = [VideoFormat::Mp4, VideoFormat::Webm];

  pub fn label(self) -> &'static str {
    match self {
      VideoFormat::Mp4 => "MP4",
      VideoFormat::Webm => "WEBM",
    }
  }
}

/// Canonical video record consumed by the shell, whatever the upstream shape.
///
/// `duration`, `views` and `url` are synthesized by the normalizer and carry no
/// relation to the real media.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
  pub id: String,
  pub title: String,
  pub thumbnail: String,
  pub duration: u32,
  pub views: u64,
  pub upload_date: String,
  pub url: String,
  pub description: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slug: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub web_url: Option<String>,
  #[serde(rename = "type")]
  pub kind: String,
  pub quality: Vec<Quality>,
  pub formats: Vec<VideoFormat>,
}

/// Fabricated plan/quota payload returned by key validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
  pub valid: bool,
  pub plan: String,
  pub daily_limit: u32,
  pub used_today: u32,
}

impl KeyStatus {
  pub fn premium(valid: bool, used_today: u32) -> Self {
    Self { valid, plan: "Premium".to_string(), daily_limit: 1000, used_today }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTicket {
  pub download_url: String,
  pub filename: String,
}

/// Per-quality stream and download URLs for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
  pub id: String,
  pub streaming_urls: BTreeMap<Quality, String>,
  pub download_urls: BTreeMap<Quality, String>,
}

impl VideoDetail {
  /// Synthetic detail: each quality maps to one of the sample streams, in order.
  pub fn synthetic(id: &str) -> Self {
    let urls: BTreeMap<Quality, String> =
      Quality::ALL.iter().enumerate().map(|(i, q)| (*q, sample_stream(i).to_string())).collect();
    Self { id: id.to_string(), streaming_urls: urls.clone(), download_urls: urls }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn raw_item_accepts_numeric_and_string_ids() {
    let a: RawItem = serde_json::from_str(r#"{"id": 12, "title": "A"}"#).unwrap();
    let b: RawItem = serde_json::from_str(r#"{"id": "neko_1"}"#).unwrap();
    assert_eq!(a.id.and_then(|id| id.as_string()).as_deref(), Some("12"));
    assert_eq!(b.id.and_then(|id| id.as_string()).as_deref(), Some("neko_1"));
  }

  #[test]
  fn raw_item_tolerates_nulls_and_missing_fields() {
    let item: RawItem = serde_json::from_str(r#"{"title": null, "type": "3d"}"#).unwrap();
    assert_eq!(item.title, None);
    assert_eq!(item.kind.as_deref(), Some("3d"));
  }

  #[test]
  fn recent_feed_flattens_carousel_then_posts() {
    let feed: RecentFeed = serde_json::from_str(
      r#"{
        "carousel": [{"id": 1}],
        "posts": [{"category": "New", "data": [{"id": 2}, {"id": 3}]}, {"category": "Empty"}]
      }"#,
    )
    .unwrap();
    let ids: Vec<_> = feed.flatten().into_iter().filter_map(|i| i.id.and_then(|id| id.as_string())).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
  }

  #[test]
  fn recent_feed_defaults_when_collections_missing() {
    let feed: RecentFeed = serde_json::from_str("{}").unwrap();
    assert!(feed.flatten().is_empty());
    let feed: RecentFeed = serde_json::from_str(r#"{"carousel": null, "posts": [{"data": null}]}"#).unwrap();
    assert!(feed.flatten().is_empty());
  }

  #[test]
  fn mistyped_fields_only_blank_themselves() {
    let item: RawItem =
      serde_json::from_str(r#"{"id": 1.0, "title": 404, "slug": ["x"], "date": {"y": 1}, "description": "kept"}"#).unwrap();
    assert_eq!(item.id.and_then(|id| id.as_string()).as_deref(), Some("1.0"));
    assert_eq!(item.title.as_deref(), Some("404"));
    assert_eq!(item.slug, None);
    assert_eq!(item.date, None);
    assert_eq!(item.description.as_deref(), Some("kept"));
  }

  #[test]
  fn malformed_elements_are_skipped_not_fatal() {
    let feed: RecentFeed = serde_json::from_str(
      r#"{
        "carousel": [{"id": 1, "title": "Good"}, "junk", {"id": 2, "title": false}],
        "posts": [7, {"category": 3, "data": [{"id": 3}, null]}, {"data": "oops"}]
      }"#,
    )
    .unwrap();
    let items = feed.flatten();
    let ids: Vec<_> = items.iter().filter_map(|i| i.id.as_ref().and_then(|id| id.as_string())).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(items[1].title, None);
  }

  #[test]
  fn genre_listing_reads_total_leniently() {
    let listing: GenreListing = serde_json::from_str(r#"{"result": [{"id": 9}, 5], "total": "40"}"#).unwrap();
    assert_eq!(listing.result.map(|r| r.len()), Some(1));
    assert_eq!(listing.total, Some(40));

    let listing: GenreListing = serde_json::from_str(r#"{"result": "none", "total": -1}"#).unwrap();
    assert_eq!(listing.result, None);
    assert_eq!(listing.total, None);
  }

  #[test]
  fn raw_item_matches_title_or_description() {
    let item = RawItem {
      title: Some("Ocean Documentary".to_string()),
      description: Some("Whales and reefs".to_string()),
      ..Default::default()
    };
    assert!(item.matches("ocean"));
    assert!(item.matches("reef"));
    assert!(!item.matches("desert"));
    assert!(!RawItem::default().matches("x"));
  }

  #[test]
  fn quality_serializes_as_label() {
    for q in Quality::ALL {
      assert_eq!(serde_json::to_value(q).unwrap(), serde_json::json!(q.label()));
    }
    assert_eq!(Quality::default(), Quality::P720);
  }

  #[test]
  fn synthetic_detail_covers_every_quality() {
    let detail = VideoDetail::synthetic("abc");
    assert_eq!(detail.download_urls.len(), 4);
    assert_eq!(detail.download_urls[&Quality::P1080], sample_stream(0));
    assert_eq!(detail.download_urls[&Quality::P360], sample_stream(3));
    let json = serde_json::to_value(&detail).unwrap();
    assert!(json["downloadUrls"]["720p"].is_string());
  }
}
