use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Inclusive millisecond window for a randomized wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayWindow {
  pub min_ms: u64,
  pub max_ms: u64,
}

impl DelayWindow {
  /// A window that never waits.
  pub const ZERO: DelayWindow = DelayWindow { min_ms: 0, max_ms: 0 };

  #[cfg(test)]
  pub const fn new(min_ms: u64, max_ms: u64) -> Self {
    Self { min_ms, max_ms }
  }

  /// Draw a duration uniformly from `[min_ms, max_ms]`.
  /// A window with `max_ms < min_ms` collapses to `min_ms`.
  pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
    let max = self.max_ms.max(self.min_ms);
    Duration::from_millis(rng.random_range(self.min_ms..=max))
  }
}

/// Sleep for a random duration inside `window`.
///
/// There is no cancellation token: dropping the future abandons the wait.
pub async fn jitter(window: DelayWindow) {
  let wait = window.sample(&mut rand::rng());
  if wait.is_zero() {
    return;
  }
  debug!(ms = wait.as_millis() as u64, "jitter: waiting");
  tokio::time::sleep(wait).await;
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  #[test]
  fn sample_stays_inside_window() {
    let mut rng = StdRng::seed_from_u64(7);
    let window = DelayWindow::new(500, 1500);
    for _ in 0..1000 {
      let d = window.sample(&mut rng).as_millis();
      assert!((500..=1500).contains(&d), "{} outside window", d);
    }
  }

  #[test]
  fn degenerate_window_is_fixed() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(DelayWindow::new(250, 250).sample(&mut rng), Duration::from_millis(250));
    assert_eq!(DelayWindow::ZERO.sample(&mut rng), Duration::ZERO);
  }

  #[test]
  fn inverted_window_collapses_to_min() {
    let mut rng = StdRng::seed_from_u64(3);
    assert_eq!(DelayWindow::new(900, 100).sample(&mut rng), Duration::from_millis(900));
  }

  #[tokio::test]
  async fn zero_window_returns_immediately() {
    let started = std::time::Instant::now();
    jitter(DelayWindow::ZERO).await;
    assert!(started.elapsed() < Duration::from_millis(50));
  }
}
