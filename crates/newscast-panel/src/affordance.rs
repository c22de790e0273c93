use std::fmt;

/// What the panel currently offers to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Affordance {
    /// Nothing known to be going on in the focused tab: offer to generate.
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    /// Audio is ready but needs a click to start.
    NeedsInteraction { message: String },
    /// Playback was stopped or ran to its end; it can be restarted.
    Stopped,
    Failed { error: String },
}

impl Affordance {
    /// Caption of the primary control.
    pub fn label(&self) -> &'static str {
        match self {
            Affordance::Idle | Affordance::Failed { .. } => "Generate commentary",
            Affordance::Loading => "Generating…",
            Affordance::Playing => "Pause",
            Affordance::Paused => "Resume",
            Affordance::NeedsInteraction { .. } => "Play",
            Affordance::Stopped => "Restart",
        }
    }

    /// Whether stop and restart controls are shown.
    pub fn has_transport(&self) -> bool {
        matches!(
            self,
            Affordance::Playing
                | Affordance::Paused
                | Affordance::NeedsInteraction { .. }
                | Affordance::Stopped
        )
    }

    /// What the play/pause toggle does from here, if anything.
    pub fn toggle_label(&self) -> Option<&'static str> {
        match self {
            Affordance::Playing => Some("pause"),
            Affordance::Paused => Some("resume"),
            Affordance::NeedsInteraction { .. } => Some("play"),
            _ => None,
        }
    }
}

impl fmt::Display for Affordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Affordance::NeedsInteraction { message } => write!(f, "[{}] {message}", self.label()),
            Affordance::Failed { error } => write!(f, "[{}] error: {error}", self.label()),
            _ => write!(f, "[{}]", self.label()),
        }
    }
}
