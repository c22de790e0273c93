//! Media platform playing commentary on the default output device via `rodio`.
//!
//! The output stream lives on its own thread for as long as the platform
//! exists; resources are `rodio` sinks fed with the decoded mp3 asset.

use std::{
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
};

use newscast_bridge::config::PlaybackConfig;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::mpsc::UnboundedSender;

use crate::media::{
    ActivationGate, AudioAsset, MediaError, MediaEvent, MediaEventKind, MediaPlatform,
    MediaResource, PlayError, ResourceId,
};

type AssetDecoder = Decoder<Cursor<Arc<[u8]>>>;

pub struct SpeakerPlatform {
    output: OutputStreamHandle,
    output_alive: Arc<AtomicBool>,
    gate: ActivationGate,
    /// Dropping it closes the output stream.
    _shutdown: mpsc::Sender<()>,
}

impl SpeakerPlatform {
    /// Open the default output device.
    pub fn new(config: &PlaybackConfig) -> Result<Self, MediaError> {
        let output_alive = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown, shutdown_rx) = mpsc::channel::<()>();

        let alive = output_alive.clone();
        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(output) => output,
                    Err(error) => {
                        let _ = ready_tx.send(Err(error.to_string()));
                        return;
                    }
                };
                alive.store(true, Ordering::SeqCst);
                let _ = ready_tx.send(Ok(handle));

                // returns once the platform is dropped
                let _ = shutdown_rx.recv();
                alive.store(false, Ordering::SeqCst);
                drop(stream);
                log::debug!("Audio output stream closed");
            })
            .map_err(|error| MediaError::Output(error.to_string()))?;

        let output = ready_rx
            .recv()
            .map_err(|_| MediaError::Output("the audio output thread exited".to_string()))?
            .map_err(MediaError::Output)?;
        log::info!("Audio playback initialized on default output device");

        Ok(Self {
            output,
            output_alive,
            gate: ActivationGate::new(config.autoplay),
            _shutdown: shutdown,
        })
    }
}

impl MediaPlatform for SpeakerPlatform {
    fn create(
        &self,
        id: ResourceId,
        asset: AudioAsset,
        events: UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaResource>, MediaError> {
        let source = decode(&asset)?;
        let sink = Sink::try_new(&self.output).map_err(|error| MediaError::Output(error.to_string()))?;
        sink.pause();
        sink.append(source);
        log::debug!("Created speaker resource #{id} from {} bytes", asset.len());

        Ok(Box::new(SpeakerResource {
            id,
            sink: Arc::new(sink),
            watching: false,
            cleared: Arc::new(AtomicBool::new(false)),
            output_alive: self.output_alive.clone(),
            events,
            gate: self.gate.clone(),
        }))
    }

    fn user_activation(&self) {
        self.gate.activate();
    }
}

/// Decode the asset header so unreadable audio is refused before playing.
fn decode(asset: &AudioAsset) -> Result<AssetDecoder, MediaError> {
    if asset.is_empty() {
        return Err(MediaError::EmptyAsset);
    }
    Decoder::new(Cursor::new(asset.shared())).map_err(|error| MediaError::Load(error.to_string()))
}

struct SpeakerResource {
    id: ResourceId,
    sink: Arc<Sink>,
    watching: bool,
    cleared: Arc<AtomicBool>,
    output_alive: Arc<AtomicBool>,
    events: UnboundedSender<MediaEvent>,
    gate: ActivationGate,
}

impl SpeakerResource {
    /// Report the end of the queued audio once the sink drains.
    fn watch(&self) -> std::io::Result<()> {
        let sink = self.sink.clone();
        let cleared = self.cleared.clone();
        let output_alive = self.output_alive.clone();
        let events = self.events.clone();
        let id = self.id;

        std::thread::Builder::new()
            .name(format!("audio-resource-{id}"))
            .spawn(move || {
                sink.sleep_until_end();
                if cleared.load(Ordering::SeqCst) {
                    return;
                }

                let kind = if output_alive.load(Ordering::SeqCst) {
                    MediaEventKind::Ended
                } else {
                    MediaEventKind::Failed("the audio output closed during playback".to_string())
                };
                let _ = events.send(MediaEvent { resource: id, kind });
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MediaResource for SpeakerResource {
    async fn play(&mut self) -> Result<(), PlayError> {
        if self.cleared.load(Ordering::SeqCst) {
            return Err(PlayError::Failed("the audio source was cleared".to_string()));
        }
        self.gate.check()?;
        if !self.output_alive.load(Ordering::SeqCst) {
            return Err(PlayError::Failed("the audio output is closed".to_string()));
        }

        self.sink.play();
        if !self.watching {
            self.watch()
                .map_err(|error| PlayError::Failed(error.to_string()))?;
            self.watching = true;
        }
        log::debug!("Speaker resource #{} playing", self.id);
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn release(&mut self) {
        self.cleared.store(true, Ordering::SeqCst);
        self.sink.stop();
    }
}

impl Drop for SpeakerResource {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_audio_is_refused() {
        assert!(matches!(
            decode(&AudioAsset::new(Vec::new())),
            Err(MediaError::EmptyAsset)
        ));
    }

    #[test]
    fn bytes_that_are_not_mp3_fail_to_load() {
        let asset = AudioAsset::new(b"{\"detail\":\"not audio\"}".to_vec());
        assert!(matches!(decode(&asset), Err(MediaError::Load(_))));
    }
}
