//! Media platform without an audio device.
//!
//! Resources keep a virtual play position and report their natural end once
//! the duration implied by the asset size and the configured bitrate has
//! elapsed in the playing state.

use std::time::Duration;

use newscast_bridge::config::PlaybackConfig;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time::Instant};

use crate::media::{
    ActivationGate, AudioAsset, MediaError, MediaEvent, MediaEventKind, MediaPlatform,
    MediaResource, PlayError, ResourceId,
};

#[derive(Debug)]
pub struct HeadlessPlatform {
    gate: ActivationGate,
    bitrate_kbps: u32,
}

impl HeadlessPlatform {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            gate: ActivationGate::new(config.autoplay),
            bitrate_kbps: config.assumed_bitrate_kbps.max(1),
        }
    }

    /// Playing time of `asset` at the configured bitrate.
    pub fn duration_of(&self, asset: &AudioAsset) -> Duration {
        let bits = asset.len() as f64 * 8.0;
        Duration::from_secs_f64(bits / (self.bitrate_kbps as f64 * 1000.0))
    }
}

impl MediaPlatform for HeadlessPlatform {
    fn create(
        &self,
        id: ResourceId,
        asset: AudioAsset,
        events: UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaResource>, MediaError> {
        if asset.is_empty() {
            return Err(MediaError::EmptyAsset);
        }

        let duration = self.duration_of(&asset);
        log::debug!("Created headless resource #{id} lasting {duration:?}");
        Ok(Box::new(HeadlessResource {
            id,
            duration,
            position: Duration::ZERO,
            started_at: None,
            timer: None,
            cleared: false,
            events,
            gate: self.gate.clone(),
        }))
    }

    fn user_activation(&self) {
        self.gate.activate();
    }
}

struct HeadlessResource {
    id: ResourceId,
    duration: Duration,
    position: Duration,
    started_at: Option<Instant>,
    timer: Option<JoinHandle<()>>,
    cleared: bool,
    events: UnboundedSender<MediaEvent>,
    gate: ActivationGate,
}

#[async_trait::async_trait]
impl MediaResource for HeadlessResource {
    async fn play(&mut self) -> Result<(), PlayError> {
        if self.cleared {
            return Err(PlayError::Failed("the audio source was cleared".to_string()));
        }
        if self.started_at.is_some() {
            return Ok(());
        }
        self.gate.check()?;

        let remaining = self.duration.saturating_sub(self.position);
        let events = self.events.clone();
        let id = self.id;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let _ = events.send(MediaEvent {
                resource: id,
                kind: MediaEventKind::Ended,
            });
        }));
        self.started_at = Some(Instant::now());

        log::debug!("Resource #{id} playing, {remaining:?} left");
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.position = (self.position + started_at.elapsed()).min(self.duration);
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn release(&mut self) {
        self.pause();
        self.position = Duration::ZERO;
        self.cleared = true;
    }
}

impl Drop for HeadlessResource {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
