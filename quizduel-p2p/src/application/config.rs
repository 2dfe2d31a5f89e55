use crate::domain::{IceServer, QualityThresholds};
use instant::Duration;
use quizduel_core::ScoringRules;

/// Timing and transport settings for one peer's game loop
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Matchbox signalling server URL
    pub signalling_server: String,
    pub ice_servers: Vec<IceServer>,

    /// Heartbeat send period while playing
    pub heartbeat_interval: Duration,
    /// How often unacknowledged messages are checked
    pub retry_sweep_interval: Duration,
    /// Age after which an unacknowledged message is resent
    pub retry_after: Duration,
    pub max_retries: u32,

    /// Base wait between both answers arriving and the host moving on
    pub progression_delay: Duration,
    /// Heartbeat gap that triggers a stall warning
    pub stall_threshold: Duration,
    /// Local answer deadline per question; an empty answer is submitted after it
    pub answer_window: Duration,

    pub quality: QualityThresholds,
    pub scoring: ScoringRules,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            signalling_server: "wss://match.quizduel.dev".to_string(),
            ice_servers: IceServer::default_stun_servers(),
            heartbeat_interval: Duration::from_secs(3),
            retry_sweep_interval: Duration::from_secs(2),
            retry_after: Duration::from_secs(5),
            max_retries: 3,
            progression_delay: Duration::from_millis(3000),
            stall_threshold: Duration::from_secs(15),
            answer_window: Duration::from_secs(30),
            quality: QualityThresholds::default(),
            scoring: ScoringRules::default(),
        }
    }
}

impl SyncConfig {
    pub fn new(signalling_server: impl Into<String>) -> Self {
        Self {
            signalling_server: signalling_server.into(),
            ..Default::default()
        }
    }

    pub fn with_signalling_server(mut self, url: impl Into<String>) -> Self {
        self.signalling_server = url.into();
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServer>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_retry_policy(mut self, sweep: Duration, retry_after: Duration, max_retries: u32) -> Self {
        self.retry_sweep_interval = sweep;
        self.retry_after = retry_after;
        self.max_retries = max_retries;
        self
    }

    pub fn with_progression_delay(mut self, delay: Duration) -> Self {
        self.progression_delay = delay;
        self
    }

    pub fn with_answer_window(mut self, window: Duration) -> Self {
        self.answer_window = window;
        self
    }
}
