use crate::domain::{elapsed_since, ConnectionQuality, QualityLevel, QualityThresholds};
use instant::{Duration, Instant};

/// Tracks the peer's heartbeats and derives link quality from the gap
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    thresholds: QualityThresholds,
    stall_threshold: Duration,
    quality: ConnectionQuality,
}

impl HeartbeatMonitor {
    pub fn new(thresholds: QualityThresholds, stall_threshold: Duration) -> Self {
        Self {
            thresholds,
            stall_threshold,
            quality: ConnectionQuality::default(),
        }
    }

    /// Start measuring from `now`, as if a heartbeat had just arrived
    pub fn start(&mut self, now: Instant) {
        self.quality.last_heartbeat = Some(now);
    }

    pub fn record_heartbeat(&mut self, now: Instant) {
        self.quality.last_heartbeat = Some(now);
    }

    /// Reclassify the link. Returns the new quality when the level changed.
    pub fn tick(&mut self, now: Instant, playing: bool) -> Option<ConnectionQuality> {
        let (level, sync_buffer) = match (playing, self.quality.last_heartbeat) {
            (true, Some(last)) => {
                let gap = elapsed_since(last, now);
                if self.is_stalled(now) {
                    tracing::warn!(
                        "⚠️ No heartbeat for {:.1}s, peer may have stalled",
                        gap.as_secs_f64()
                    );
                }
                self.thresholds.classify(gap)
            }
            _ => (QualityLevel::Unknown, Duration::ZERO),
        };

        let changed = level != self.quality.level;
        self.quality.level = level;
        self.quality.sync_buffer = sync_buffer;

        if changed {
            tracing::debug!("Connection quality now {} (+{:?})", level, sync_buffer);
            Some(self.quality)
        } else {
            None
        }
    }

    /// Heartbeat gap beyond the stall threshold
    pub fn is_stalled(&self, now: Instant) -> bool {
        self.quality
            .last_heartbeat
            .is_some_and(|last| elapsed_since(last, now) > self.stall_threshold)
    }

    pub fn quality(&self) -> &ConnectionQuality {
        &self.quality
    }

    pub fn sync_buffer(&self) -> Duration {
        self.quality.sync_buffer
    }

    pub fn reset(&mut self) {
        self.quality = ConnectionQuality::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> HeartbeatMonitor {
        HeartbeatMonitor::new(QualityThresholds::default(), Duration::from_secs(15))
    }

    #[test]
    fn test_unknown_when_not_playing() {
        let mut monitor = monitor();
        let now = Instant::now();
        monitor.start(now);

        assert!(monitor.tick(now, false).is_none());
        assert_eq!(monitor.quality().level, QualityLevel::Unknown);
    }

    #[test]
    fn test_degrades_with_gap() {
        let mut monitor = monitor();
        let t0 = Instant::now();
        monitor.start(t0);

        let q = monitor.tick(t0 + Duration::from_secs(4), true).unwrap();
        assert_eq!(q.level, QualityLevel::Good);

        let q = monitor.tick(t0 + Duration::from_secs(7), true).unwrap();
        assert_eq!(q.level, QualityLevel::Fair);
        assert_eq!(monitor.sync_buffer(), Duration::from_secs(1));

        let q = monitor.tick(t0 + Duration::from_secs(12), true).unwrap();
        assert_eq!(q.level, QualityLevel::Poor);
        assert_eq!(monitor.sync_buffer(), Duration::from_secs(2));

        // still poor past the stall threshold, no new change reported
        assert!(monitor.tick(t0 + Duration::from_secs(20), true).is_none());
    }

    #[test]
    fn test_stall_after_threshold() {
        let mut monitor = monitor();
        let t0 = Instant::now();
        assert!(!monitor.is_stalled(t0 + Duration::from_secs(60)));

        monitor.start(t0);
        assert!(!monitor.is_stalled(t0 + Duration::from_secs(15)));
        assert!(monitor.is_stalled(t0 + Duration::from_secs(16)));

        monitor.record_heartbeat(t0 + Duration::from_secs(16));
        assert!(!monitor.is_stalled(t0 + Duration::from_secs(17)));
    }

    #[test]
    fn test_heartbeat_restores_quality() {
        let mut monitor = monitor();
        let t0 = Instant::now();
        monitor.start(t0);
        monitor.tick(t0 + Duration::from_secs(11), true);

        monitor.record_heartbeat(t0 + Duration::from_secs(11));
        let q = monitor.tick(t0 + Duration::from_secs(12), true).unwrap();

        assert_eq!(q.level, QualityLevel::Good);
        assert_eq!(q.sync_buffer, Duration::ZERO);
    }

    #[test]
    fn test_reset() {
        let mut monitor = monitor();
        let t0 = Instant::now();
        monitor.start(t0);
        monitor.tick(t0, true);

        monitor.reset();
        assert_eq!(monitor.quality(), &ConnectionQuality::default());
    }
}
