//! Hard-coded datasets: the trending fallback, the demo list shown after a key
//! is first saved, and the mock backend's trending set.

use crate::constants::sample_stream;
use crate::model::{Quality, RawId, RawItem, Video, VideoFormat};

fn placeholder(color: &str, text: &str) -> String {
  format!("https://via.placeholder.com/320x180/{}/ffffff?text={}", color, text)
}

fn raw(id: &str, title: &str, color: &str, label: &str, kind: &str, date: &str, description: &str) -> RawItem {
  let slug = id.replace('_', "-");
  RawItem {
    id: Some(RawId::Text(id.to_string())),
    title: Some(title.to_string()),
    image: Some(placeholder(color, label)),
    slug: Some(slug.clone()),
    kind: Some(kind.to_string()),
    date: Some(date.to_string()),
    description: Some(description.to_string()),
    web_url: Some(format!("{}/{}", crate::constants::constants().base_url, slug)),
  }
}

/// Fixed 8-item dataset served when the trending feed cannot be fetched.
pub fn fallback_trending() -> Vec<RawItem> {
  vec![
    raw(
      "feature_1",
      "Northern Lights - Newest Episode",
      "6366f1",
      "Northern+Lights",
      "series",
      "2025-06-19",
      "The newest episode of the Northern Lights series in HD",
    ),
    raw(
      "feature_2",
      "Harbor Stories - HD Quality",
      "8b5cf6",
      "Harbor+Stories",
      "series",
      "2025-06-19",
      "High quality content with subtitles",
    ),
    raw(
      "feature_3",
      "The Hero's Journey Has Ended!",
      "ec4899",
      "Heros+Journey",
      "series",
      "2025-06-18",
      "An entertaining adventure from start to finish",
    ),
    raw(
      "feature_4",
      "Family Matters: Secrets of the Town",
      "f59e0b",
      "Family+Matters",
      "series",
      "2025-06-18",
      "A warm story about everyday life",
    ),
    raw(
      "feature_5",
      "Connect! - Premium Content",
      "10b981",
      "Connect",
      "series",
      "2025-06-17",
      "Premium content in the best available quality",
    ),
    raw(
      "feature_6",
      "City Nights The Animation",
      "ef4444",
      "City+Nights",
      "animation",
      "2025-06-17",
      "Quality animation with a compelling story",
    ),
    raw(
      "feature_7",
      "[3D] Spider Sisters",
      "8b5cf6",
      "3D+Spider+Sisters",
      "3d",
      "2025-06-19",
      "High quality 3D content with smooth animation",
    ),
    raw(
      "feature_8",
      "[DIRECTOR'S CUT] Midnight Visitor",
      "6366f1",
      "Directors+Cut",
      "uncut",
      "2025-06-19",
      "Extended edition in premium quality",
    ),
  ]
}

#[allow(clippy::too_many_arguments)]
fn canned(
  id: &str,
  title: &str,
  thumbnail: String,
  duration: u32,
  views: u64,
  upload_date: &str,
  stream: usize,
  description: &str,
) -> Video {
  Video {
    id: id.to_string(),
    title: title.to_string(),
    thumbnail,
    duration,
    views,
    upload_date: upload_date.to_string(),
    url: sample_stream(stream).to_string(),
    description: description.to_string(),
    slug: None,
    web_url: None,
    kind: "video".to_string(),
    quality: Quality::ALL.to_vec(),
    formats: VideoFormat::ALL.to_vec(),
  }
}

/// Demo list seeded into the results when a key is configured and nothing has
/// been searched yet.
pub fn demo_videos() -> Vec<Video> {
  vec![
    canned(
      "1",
      "Sample Video 1 - Demo Content",
      placeholder("6366f1", "Video+1"),
      3600,
      1_250_000,
      "2 days ago",
      0,
      "A demo video showing off the player. It uses a sample stream for testing.",
    ),
    canned(
      "2",
      "Sample Video 2 - Another Demo",
      placeholder("8b5cf6", "Video+2"),
      2400,
      850_000,
      "1 week ago",
      1,
      "A second demo video with different content for testing streaming.",
    ),
    canned(
      "3",
      "Sample Video 3 - Test Content",
      placeholder("ec4899", "Video+3"),
      1800,
      420_000,
      "3 days ago",
      2,
      "A third demo video for exercising the player and download features.",
    ),
    canned(
      "4",
      "Sample Video 4 - Demo Streaming",
      placeholder("f59e0b", "Video+4"),
      4200,
      2_100_000,
      "5 days ago",
      3,
      "A demo video showing streaming quality and player controls.",
    ),
  ]
}

/// Trending set served by the mock backend.
pub fn mock_trending() -> Vec<Video> {
  vec![
    canned(
      "trending_1",
      "Trending Video 1 - Viral Content",
      placeholder("f59e0b", "Trending+1"),
      4200,
      5_000_000,
      "1 day ago",
      0,
      "Today's most popular trending video with millions of views.",
    ),
    canned(
      "trending_2",
      "Trending Video 2 - Popular Now",
      placeholder("10b981", "Trending+2"),
      3600,
      3_200_000,
      "2 days ago",
      1,
      "Viral content trending on the platform.",
    ),
    canned(
      "trending_3",
      "Trending Video 3 - Must Watch",
      placeholder("ef4444", "Trending+3"),
      2800,
      2_800_000,
      "3 days ago",
      2,
      "A must-watch video that is going viral.",
    ),
    canned(
      "trending_4",
      "Trending Video 4 - Hot Topic",
      placeholder("8b5cf6", "Trending+4"),
      5400,
      4_100_000,
      "4 days ago",
      3,
      "A hot topic everyone is talking about.",
    ),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fallback_trending_has_eight_unique_items() {
    let items = fallback_trending();
    assert_eq!(items.len(), 8);
    let mut ids: Vec<_> = items.iter().filter_map(|i| i.id.as_ref().and_then(|id| id.as_string())).collect();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert!(items.iter().all(|i| i.slug.as_deref().is_some_and(|s| !s.contains('_'))));
  }

  #[test]
  fn canned_sets_use_distinct_streams() {
    let demo = demo_videos();
    assert_eq!(demo.len(), 4);
    assert_ne!(demo[0].url, demo[1].url);
    assert_eq!(mock_trending().len(), 4);
  }
}
