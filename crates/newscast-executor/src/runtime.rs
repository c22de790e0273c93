//! Page host runtime setup.
//!
//! Wires the generation client and media platform described by the
//! configuration into a [`PageHost`] and starts its dispatch loop.

use std::sync::Arc;

use newscast_bridge::{
    HostRequest, MessageBus,
    config::{AudioOutput, Config},
};
use tokio::{sync::mpsc::Receiver, task::JoinHandle};

use crate::{
    generation::{GenerationError, HttpCommentaryService},
    headless::HeadlessPlatform,
    host::PageHost,
    media::{MediaError, MediaPlatform},
    speaker::SpeakerPlatform,
};

/// Errors preventing the page host from starting.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to set up the commentary client: {0}")]
    Generation(#[from] GenerationError),
    #[error("failed to set up audio playback: {0}")]
    Media(#[from] MediaError),
}

/// Spawn the page host on the current runtime and begin processing panel
/// requests.
pub fn spawn(
    rx: Receiver<HostRequest>,
    bus: MessageBus,
    config: &Config,
) -> Result<JoinHandle<()>, RuntimeError> {
    let service = Arc::new(HttpCommentaryService::new(&config.service)?);
    let platform: Arc<dyn MediaPlatform> = match config.playback.output {
        AudioOutput::Speaker => Arc::new(SpeakerPlatform::new(&config.playback)?),
        AudioOutput::Headless => Arc::new(HeadlessPlatform::new(&config.playback)),
    };
    log::info!(
        "Starting page host, commentary from {}, {:?} output, autoplay {:?}",
        config.service.endpoint,
        config.playback.output,
        config.playback.autoplay
    );

    let host = PageHost::new(bus, platform, service);
    Ok(tokio::spawn(host.serve(rx)))
}
