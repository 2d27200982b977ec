//! Configuration types for the Mneme client

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{MnemeError, Result};

/// Main configuration for a Mneme-backed assistant client
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MnemeConfig {
    /// Conversation memory configuration
    pub memory: MemoryConfig,

    /// Voice client configuration
    pub voice: VoiceConfig,
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Context character budget per session
    pub max_context_length: usize,

    /// Turns returned by recent-context queries
    pub recent_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_context_length: 512,
            recent_turns: crate::conversation::DEFAULT_RECENT_TURNS,
        }
    }
}

/// Voice client configuration: transport timing, reconnect policy, and VAD
/// thresholds. Declarative data for the connection layer; this crate does
/// not open sockets or process audio.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VoiceConfig {
    /// Known speech servers, tried in priority order
    pub servers: Vec<ServerConfig>,

    /// WebSocket timing parameters
    pub websocket: WebSocketConfig,

    /// Reconnect policy
    pub retry: RetryConfig,

    /// Voice-activity-detection thresholds
    pub vad: VadConfig,
}

impl VoiceConfig {
    /// Enabled servers, sorted by ascending priority
    pub fn available_servers(&self) -> Vec<&ServerConfig> {
        let mut servers: Vec<&ServerConfig> =
            self.servers.iter().filter(|s| s.enabled).collect();
        servers.sort_by_key(|s| s.priority);
        servers
    }

    /// URL of the highest-priority enabled server, if any
    pub fn primary_server_url(&self) -> Option<&str> {
        self.available_servers().first().map(|s| s.url.as_str())
    }
}

/// One speech-server endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket URL (`ws://` or `wss://`)
    pub url: String,

    /// Human-readable name
    pub name: String,

    /// Selection priority; lower is tried first
    pub priority: u32,

    /// Whether this server participates in selection
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// WebSocket timing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Connection timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Heartbeat interval
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,

    /// Heartbeat response timeout
    #[serde(with = "humantime_serde")]
    pub ping_timeout: Duration,

    /// Maximum message size in bytes (audio payloads are large)
    pub max_message_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(60),
            ping_interval: Duration::from_secs(20),
            ping_timeout: Duration::from_secs(10),
            max_message_size: 10 * 1024 * 1024,
        }
    }
}

/// Reconnect policy for the speech-server connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum reconnect attempts before giving up
    pub max_retries: u32,

    /// Base delay between attempts
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,

    /// Upper bound on the delay between attempts
    #[serde(with = "humantime_serde")]
    pub max_retry_interval: Duration,

    /// Double the delay on each attempt
    pub exponential_backoff: bool,

    /// Whether the connection layer should jitter the computed delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            retry_interval: Duration::from_secs(3),
            max_retry_interval: Duration::from_secs(60),
            exponential_backoff: true,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before reconnect attempt `attempt` (0-indexed), capped at
    /// `max_retry_interval`. Jitter, when enabled, is applied by the
    /// connection layer on top of this value.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.retry_interval.min(self.max_retry_interval);
        }
        let base = self.retry_interval.as_millis() as u64;
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(base.saturating_mul(factor)).min(self.max_retry_interval)
    }
}

/// Voice-activity-detection thresholds.
///
/// These are tuning values consumed by the audio front end; no signal
/// processing happens in this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Audio sample rate in Hz
    pub sample_rate: u32,

    /// Samples per analysis frame (320 = 20ms at 16kHz)
    pub frame_size: u32,

    /// Detector aggressiveness, 0 (least) to 3 (most sensitive)
    pub mode: u8,

    /// Silence duration that ends an utterance
    #[serde(with = "humantime_serde")]
    pub silence_threshold: Duration,

    /// How often the detector is polled
    #[serde(with = "humantime_serde")]
    pub detection_interval: Duration,

    /// Fraction of voiced frames required to count as speech (0.0-1.0)
    pub voice_detection_rate: f64,

    /// Shortest audio span accepted as speech
    #[serde(with = "humantime_serde")]
    pub minimum_speech_duration: Duration,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frame_size: 320,
            mode: 3,
            silence_threshold: Duration::from_millis(1000),
            detection_interval: Duration::from_millis(100),
            voice_detection_rate: 0.5,
            minimum_speech_duration: Duration::from_millis(300),
        }
    }
}

impl VadConfig {
    /// Preset for quiet environments
    pub fn high_sensitivity() -> Self {
        Self {
            mode: 3,
            voice_detection_rate: 0.3,
            minimum_speech_duration: Duration::from_millis(200),
            silence_threshold: Duration::from_millis(800),
            ..Self::default()
        }
    }

    /// Preset for typical environments
    pub fn medium_sensitivity() -> Self {
        Self {
            mode: 2,
            voice_detection_rate: 0.5,
            minimum_speech_duration: Duration::from_millis(300),
            silence_threshold: Duration::from_millis(1000),
            ..Self::default()
        }
    }

    /// Preset for noisy environments
    pub fn low_sensitivity() -> Self {
        Self {
            mode: 1,
            voice_detection_rate: 0.7,
            minimum_speech_duration: Duration::from_millis(500),
            silence_threshold: Duration::from_millis(1500),
            ..Self::default()
        }
    }
}

impl MnemeConfig {
    /// Load configuration from `mneme.toml` and `MNEME_*` environment
    /// variables. `MNEME_CONFIG_PATH` points at an additional file that
    /// takes precedence.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Toml},
        };

        let mut figment = Figment::new()
            .merge(Toml::file("mneme.toml"))
            .merge(Env::prefixed("MNEME_").split("__"));

        if let Ok(path) = std::env::var("MNEME_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: MnemeConfig = figment
            .extract()
            .map_err(|e| MnemeError::Configuration(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        debug!(
            servers = config.voice.servers.len(),
            max_context_length = config.memory.max_context_length,
            "loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Toml},
        };

        let config: MnemeConfig = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                MnemeError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check configuration invariants
    pub fn validate(&self) -> Result<()> {
        if self.memory.max_context_length == 0 {
            return Err(MnemeError::Configuration(
                "memory.max_context_length must be positive".to_string(),
            ));
        }
        if self.memory.recent_turns == 0 {
            return Err(MnemeError::Configuration(
                "memory.recent_turns must be positive".to_string(),
            ));
        }
        if self.voice.vad.mode > 3 {
            return Err(MnemeError::Configuration(
                "voice.vad.mode must be between 0 and 3".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.voice.vad.voice_detection_rate) {
            return Err(MnemeError::Configuration(
                "voice.vad.voice_detection_rate must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.voice.retry.max_retry_interval < self.voice.retry.retry_interval {
            return Err(MnemeError::Configuration(
                "voice.retry.max_retry_interval must be >= retry_interval".to_string(),
            ));
        }
        for server in &self.voice.servers {
            if !server.url.starts_with("ws://") && !server.url.starts_with("wss://") {
                return Err(MnemeError::Configuration(format!(
                    "server '{}' has a non-websocket url: {}",
                    server.name, server.url
                )));
            }
        }
        Ok(())
    }
}
