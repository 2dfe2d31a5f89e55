use instant::{Duration, Instant};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Good,
    Fair,
    Poor,
    #[default]
    Unknown,
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QualityLevel::Good => "good",
            QualityLevel::Fair => "fair",
            QualityLevel::Poor => "poor",
            QualityLevel::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Heartbeat gap limits and the progression buffer each level adds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityThresholds {
    pub good_below: Duration,
    pub fair_below: Duration,
    pub fair_buffer: Duration,
    pub poor_buffer: Duration,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            good_below: Duration::from_secs(5),
            fair_below: Duration::from_secs(10),
            fair_buffer: Duration::from_secs(1),
            poor_buffer: Duration::from_secs(2),
        }
    }
}

impl QualityThresholds {
    pub fn classify(&self, gap: Duration) -> (QualityLevel, Duration) {
        if gap < self.good_below {
            (QualityLevel::Good, Duration::ZERO)
        } else if gap < self.fair_below {
            (QualityLevel::Fair, self.fair_buffer)
        } else {
            (QualityLevel::Poor, self.poor_buffer)
        }
    }
}

/// Link quality derived from the heartbeat gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionQuality {
    pub level: QualityLevel,
    /// Last heartbeat received from the peer
    pub last_heartbeat: Option<Instant>,
    /// Extra wait before the host moves on
    pub sync_buffer: Duration,
}

/// `now - earlier`, or zero if the clock went backwards
pub fn elapsed_since(earlier: Instant, now: Instant) -> Duration {
    if now > earlier {
        now - earlier
    } else {
        Duration::ZERO
    }
}
