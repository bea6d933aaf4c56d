//! Analysis performance cache collaborator.

use parking_lot::Mutex;

/// Records how long loudness analyses took relative to media duration.
///
/// Fire-and-forget: the analyzer records after a successful pass and never
/// reads back. Implementations must tolerate concurrent records from
/// independent analyses.
pub trait LoudnessCache: Send + Sync {
    /// Record one completed analysis: media duration and wall-clock cost,
    /// both in seconds.
    fn record_analysis(&self, media_seconds: f64, wall_seconds: f64);
}

/// In-memory cache that averages observed analysis speed.
#[derive(Debug, Default)]
pub struct InMemoryLoudnessCache {
    samples: Mutex<Vec<(f64, f64)>>,
}

impl InMemoryLoudnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Estimate the wall-clock cost of analyzing `media_seconds` of audio
    /// from the mean observed ratio, or None with no samples yet.
    pub fn estimated_wall_seconds(&self, media_seconds: f64) -> Option<f64> {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return None;
        }
        let ratio_sum: f64 = samples.iter().map(|(media, wall)| wall / media).sum();
        Some(media_seconds * ratio_sum / samples.len() as f64)
    }
}

impl LoudnessCache for InMemoryLoudnessCache {
    fn record_analysis(&self, media_seconds: f64, wall_seconds: f64) {
        if media_seconds <= 0.0 || wall_seconds < 0.0 {
            return;
        }
        self.samples.lock().push((media_seconds, wall_seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_from_samples() {
        let cache = InMemoryLoudnessCache::new();
        assert_eq!(cache.estimated_wall_seconds(100.0), None);

        cache.record_analysis(100.0, 2.0);
        cache.record_analysis(200.0, 8.0);
        assert_eq!(cache.len(), 2);

        // Mean ratio of 0.02 and 0.04 is 0.03.
        let estimate = cache.estimated_wall_seconds(100.0).unwrap();
        assert!((estimate - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_degenerate_samples() {
        let cache = InMemoryLoudnessCache::new();
        cache.record_analysis(0.0, 1.0);
        cache.record_analysis(-5.0, 1.0);
        assert!(cache.is_empty());
    }
}
