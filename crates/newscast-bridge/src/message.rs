//! Wire messages exchanged between the panel, the page host and executors.

use serde::{Deserialize, Serialize};

use crate::{StyleId, TabId};

/// Commands issued by the panel to the executor of one specific tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Play/pause flip, or the deferred start of autoplay-blocked audio.
    ToggleAudio,
    /// Halt and rewind playback, keeping the generated audio.
    StopAudio,
    /// Replay the retained audio from the beginning.
    RestartAudio,
}

/// Responses to [`Command`]s, one shape per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum CommandResponse {
    Toggled { is_playing: bool },
    Stopped { stopped: bool },
    Restarted { restarted: bool },
}

/// Lifecycle events pushed by an executor to any listening panel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum Broadcast {
    #[serde(rename = "audioStarted")]
    Started,
    #[serde(rename = "audioPaused")]
    Paused,
    #[serde(rename = "audioCompleted")]
    Completed,
    #[serde(rename = "audioNeedsUserInteraction")]
    NeedsUserInteraction { message: String },
    #[serde(rename = "audioError")]
    Error { error: String },
}

impl Broadcast {
    /// The `action` tag of this broadcast on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            Broadcast::Started => "audioStarted",
            Broadcast::Paused => "audioPaused",
            Broadcast::Completed => "audioCompleted",
            Broadcast::NeedsUserInteraction { .. } => "audioNeedsUserInteraction",
            Broadcast::Error { .. } => "audioError",
        }
    }

    /// Whether audio is audible once this broadcast has been emitted.
    pub fn is_playing(&self) -> bool {
        matches!(self, Broadcast::Started)
    }
}

/// A broadcast together with the tab whose executor produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastEnvelope {
    pub tab: TabId,
    pub broadcast: Broadcast,
}

/// Body of the commentary generation request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationRequest {
    /// Canonical URL of the article page.
    pub url: String,
    pub style: StyleId,
}

/// Requests from the panel to the runtime hosting page executors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// Make sure an executor lives in `tab` and start a new generation there.
    Inject {
        tab: TabId,
        request: GenerationRequest,
    },
    /// The page in `tab` went away: tear its executor down.
    Unload { tab: TabId },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn commands_carry_action_tag() {
        assert_eq!(
            serde_json::to_value(Command::ToggleAudio).unwrap(),
            json!({"action": "toggleAudio"})
        );
        assert_eq!(
            serde_json::from_value::<Command>(json!({"action": "restartAudio"})).unwrap(),
            Command::RestartAudio
        );
    }

    #[test]
    fn responses_are_distinguished_by_their_fields() {
        assert_eq!(
            serde_json::to_value(CommandResponse::Toggled { is_playing: true }).unwrap(),
            json!({"isPlaying": true})
        );
        assert_eq!(
            serde_json::from_value::<CommandResponse>(json!({"stopped": true})).unwrap(),
            CommandResponse::Stopped { stopped: true }
        );
        assert_eq!(
            serde_json::from_value::<CommandResponse>(json!({"restarted": true})).unwrap(),
            CommandResponse::Restarted { restarted: true }
        );
    }

    #[test]
    fn broadcasts_keep_their_payload_names() {
        assert_eq!(
            serde_json::to_value(Broadcast::Error {
                error: "server error".into()
            })
            .unwrap(),
            json!({"action": "audioError", "error": "server error"})
        );
        assert_eq!(
            serde_json::to_value(Broadcast::NeedsUserInteraction {
                message: "click to play".into()
            })
            .unwrap(),
            json!({"action": "audioNeedsUserInteraction", "message": "click to play"})
        );
        assert_eq!(Broadcast::Completed.action(), "audioCompleted");
    }

    #[test]
    fn generation_body_matches_service_contract() {
        let request = GenerationRequest {
            url: "https://news.example/article".into(),
            style: StyleId::Rap,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"url": "https://news.example/article", "style": "RAP"})
        );
    }
}
