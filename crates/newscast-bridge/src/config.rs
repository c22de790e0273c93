use serde::{Deserialize, Serialize};

use crate::StyleId;

/// Location and limits of the remote commentary service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Full URL of the generation endpoint.
    pub endpoint: String,
    /// Upper bound for a whole generation request, in seconds. Scraping,
    /// summarization and synthesis all happen behind this one call.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/api/data".to_string(),
            request_timeout_secs: 180,
        }
    }
}

/// Sizing and timeouts of the message bus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// How long the panel waits for an executor to answer a command, in
    /// milliseconds.
    pub command_timeout_ms: u64,
    /// Capacity of each executor's command queue.
    pub command_buffer: usize,
    /// Capacity of the panel to page host queue.
    pub host_buffer: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 2000,
            command_buffer: 16,
            host_buffer: 64,
        }
    }
}

/// Whether the media platform lets audio start without a user gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoplayPolicy {
    #[default]
    Allowed,
    /// Starting playback fails until the user has interacted with the page.
    RequiresGesture,
}

/// Where commentary audio is played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioOutput {
    /// The default output device of the system.
    #[default]
    Speaker,
    /// No device: playback only advances a clock.
    Headless,
}

/// Settings of the local media platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub output: AudioOutput,
    pub autoplay: AutoplayPolicy,
    /// Bitrate used by the headless output to estimate the duration of
    /// generated audio, in kbit/s.
    pub assumed_bitrate_kbps: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            output: AudioOutput::default(),
            autoplay: AutoplayPolicy::default(),
            assumed_bitrate_kbps: 128,
        }
    }
}

/// Settings of the control panel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Style used until the user picks one.
    pub default_style: StyleId,
    /// URL prefixes on which commentary can never be triggered, on top of
    /// every non-http(s) page.
    pub restricted_prefixes: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            default_style: StyleId::default(),
            restricted_prefixes: vec![
                "https://chrome.google.com/webstore".to_string(),
                "https://chromewebstore.google.com".to_string(),
                "https://addons.mozilla.org".to_string(),
            ],
        }
    }
}

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub bus: BusConfig,
    pub playback: PlaybackConfig,
    pub panel: PanelConfig,
}
