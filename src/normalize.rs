//! Maps upstream catalog items onto the canonical [`Video`] record.
//!
//! The upstream never reports duration, view counts or a playable stream, so
//! those fields are synthesized here: duration and views are uniform random
//! integers and the stream URL is one of the configured sample streams. None of
//! them describe the real media.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use rand::Rng;

use crate::constants::{constants, sample_stream};
use crate::model::{Quality, RawItem, Video, VideoFormat};

/// Synthesized duration range in seconds (10 to 60 minutes).
pub const DURATION_SECS: std::ops::Range<u32> = 600..3600;

/// Synthesized view-count range.
pub const VIEWS: std::ops::Range<u64> = 10_000..1_010_000;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Normalize a batch of upstream items using the thread RNG and today's local date.
pub fn to_videos(items: &[RawItem]) -> Vec<Video> {
  let mut rng = rand::rng();
  let today = Local::now().date_naive();
  items.iter().map(|item| to_video_with(item, &mut rng, today)).collect()
}

/// Deterministic core of [`to_videos`]. Never fails: every field has a default.
pub fn to_video_with<R: Rng>(item: &RawItem, rng: &mut R, today: NaiveDate) -> Video {
  let id = item
    .id
    .as_ref()
    .and_then(|id| id.as_string())
    .or_else(|| item.slug.clone().filter(|s| !s.is_empty()))
    .unwrap_or_else(|| random_id(rng));

  Video {
    id,
    title: non_empty(&item.title).unwrap_or_else(|| "Untitled".to_string()),
    thumbnail: non_empty(&item.image).unwrap_or_else(|| constants().placeholder_thumbnail.clone()),
    duration: rng.random_range(DURATION_SECS),
    views: rng.random_range(VIEWS),
    upload_date: relative_date(item.date.as_deref(), today),
    url: pick_stream(rng).to_string(),
    description: non_empty(&item.description).unwrap_or_else(|| "No description available".to_string()),
    slug: item.slug.clone(),
    web_url: item.web_url.clone(),
    kind: non_empty(&item.kind).unwrap_or_else(|| "video".to_string()),
    quality: Quality::ALL.to_vec(),
    formats: VideoFormat::ALL.to_vec(),
  }
}

fn non_empty(field: &Option<String>) -> Option<String> {
  field.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Random base-36 token used when the upstream supplies neither id nor slug.
/// Not guaranteed unique across calls.
pub fn random_id<R: Rng>(rng: &mut R) -> String {
  (0..ID_LEN).map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char).collect()
}

/// Pick one of the sample streams uniformly at random.
pub fn pick_stream<R: Rng>(rng: &mut R) -> &'static str {
  sample_stream(rng.random_range(0..constants().sample_streams.len()))
}

/// Parse the date formats the catalog is known to emit.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
    .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok().map(|d| d.date()))
}

/// Bucket the calendar-day distance between `date` and `today` into a label.
/// Missing or unparseable dates yield `"Unknown"`.
pub fn relative_date(date: Option<&str>, today: NaiveDate) -> String {
  match date.and_then(parse_date) {
    Some(d) => days_ago_label((today - d).num_days().abs()),
    None => "Unknown".to_string(),
  }
}

/// Human-readable label for a non-negative day count.
pub fn days_ago_label(days: i64) -> String {
  let plural = |n: i64, unit: &str| if n == 1 { format!("1 {} ago", unit) } else { format!("{} {}s ago", n, unit) };
  match days {
    i64::MIN..=0 => "today".to_string(),
    1..=6 => plural(days, "day"),
    7..=29 => plural(days / 7, "week"),
    _ => plural(days / 30, "month"),
  }
}
