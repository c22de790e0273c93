//! Media platform abstraction used by the executor.
//!
//! A [`MediaPlatform`] turns retained audio bytes into a live
//! [`MediaResource`]. Resources report asynchronous happenings (natural end,
//! playback failure) as [`MediaEvent`]s tagged with the id the executor gave
//! them, so events of an already released resource can be told apart.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use newscast_bridge::config::AutoplayPolicy;
use tokio::sync::mpsc::UnboundedSender;

/// Generated commentary audio, shared cheaply between successive resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    bytes: Arc<[u8]>,
}

impl AudioAsset {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Another owner of the same bytes, for decoders needing `'static` data.
    pub fn shared(&self) -> Arc<[u8]> {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Identifier the executor assigns to each resource it creates.
pub type ResourceId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEventKind {
    Ended,
    Failed(String),
}

/// Something that happened to a live resource outside of a method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEvent {
    pub resource: ResourceId,
    pub kind: MediaEventKind,
}

/// Why a resource could not be created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("the generated audio is empty")]
    EmptyAsset,
    #[error("failed to load audio: {0}")]
    Load(String),
    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// Why starting a resource failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    /// The platform requires a user gesture before audio may start.
    #[error("{0}")]
    NotAllowed(String),
    #[error("{0}")]
    Failed(String),
}

/// A single playable audio resource.
#[async_trait::async_trait]
pub trait MediaResource: Send {
    /// Start or resume playback from the current position. Resolves once the
    /// platform accepted or refused.
    async fn play(&mut self) -> Result<(), PlayError>;

    fn pause(&mut self);

    /// Pause, rewind to the start and clear the source. The resource is
    /// dropped right after.
    fn release(&mut self);
}

/// Creates resources and tracks user activation for autoplay decisions.
pub trait MediaPlatform: Send + Sync {
    fn create(
        &self,
        id: ResourceId,
        asset: AudioAsset,
        events: UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaResource>, MediaError>;

    /// Called when a user command reaches the executor.
    fn user_activation(&self) {}
}

const AUTOPLAY_BLOCKED: &str =
    "play() failed because the user didn't interact with the document first";

/// Autoplay policy plus the sticky "user interacted" flag of a platform.
#[derive(Debug, Clone)]
pub struct ActivationGate {
    policy: AutoplayPolicy,
    activated: Arc<AtomicBool>,
}

impl ActivationGate {
    pub fn new(policy: AutoplayPolicy) -> Self {
        Self {
            policy,
            activated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn activate(&self) {
        if !self.activated.swap(true, Ordering::SeqCst) {
            log::debug!("User activation recorded, autoplay is now permitted");
        }
    }

    /// Refuses to start while a gesture is required and none happened yet.
    pub fn check(&self) -> Result<(), PlayError> {
        if self.policy == AutoplayPolicy::RequiresGesture && !self.activated.load(Ordering::SeqCst)
        {
            return Err(PlayError::NotAllowed(AUTOPLAY_BLOCKED.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_gate_is_sticky_and_shared() {
        let gate = ActivationGate::new(AutoplayPolicy::RequiresGesture);
        let copy = gate.clone();
        assert!(matches!(copy.check(), Err(PlayError::NotAllowed(_))));

        gate.activate();
        assert_eq!(copy.check(), Ok(()));
        assert_eq!(copy.check(), Ok(()));
    }

    #[test]
    fn allowed_policy_never_blocks() {
        assert_eq!(ActivationGate::new(AutoplayPolicy::Allowed).check(), Ok(()));
    }
}
