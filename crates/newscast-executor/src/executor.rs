//! The per-tab media executor.
//!
//! One executor lives in each page that ever triggered a commentary. It is a
//! single task consuming, one at a time, commands from the bus, triggers
//! from the page host, generation results and media events. Every input is
//! turned into [`Event`]s for the state machine; the resulting effects are
//! applied before the next input is looked at.

use std::{collections::VecDeque, sync::Arc};

use newscast_bridge::{
    Command, CommandEnvelope, CommandResponse, GenerationRequest, MessageBus, PlaybackState, TabId,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    generation::{CommentaryService, GenerationError},
    machine::{self, Effect, Event},
    media::{
        AudioAsset, MediaEvent, MediaEventKind, MediaPlatform, MediaResource, PlayError, ResourceId,
    },
};

/// Inputs delivered to the executor outside of the bus.
#[derive(Debug)]
enum ExecutorInput {
    Trigger(GenerationRequest),
    Generation {
        epoch: u64,
        result: Result<AudioAsset, GenerationError>,
    },
}

struct LiveResource {
    id: ResourceId,
    inner: Box<dyn MediaResource>,
}

struct MediaExecutor {
    tab: TabId,
    state: PlaybackState,
    state_tx: watch::Sender<PlaybackState>,
    asset: Option<AudioAsset>,
    resource: Option<LiveResource>,
    next_resource_id: ResourceId,
    /// Incremented whenever an in-flight generation is abandoned; results
    /// carrying an older epoch are ignored.
    epoch: u64,
    pending_request: Option<GenerationRequest>,
    in_flight: Option<JoinHandle<()>>,
    bus: MessageBus,
    platform: Arc<dyn MediaPlatform>,
    service: Arc<dyn CommentaryService>,
    inputs_tx: mpsc::UnboundedSender<ExecutorInput>,
    media_tx: mpsc::UnboundedSender<MediaEvent>,
}

/// Handle kept by whoever spawned an executor.
pub struct ExecutorHandle {
    tab: TabId,
    inputs: mpsc::UnboundedSender<ExecutorInput>,
    state: watch::Receiver<PlaybackState>,
    task: JoinHandle<()>,
}

impl ExecutorHandle {
    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Start a new generation in this executor. Returns `false` if the
    /// executor already shut down.
    pub fn trigger(&self, request: GenerationRequest) -> bool {
        self.inputs.send(ExecutorInput::Trigger(request)).is_ok()
    }

    /// Current state of the executor's machine.
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    /// Watch channel following every state change.
    pub fn watch_state(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    pub fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    /// Unload the page: detach from the bus and wait until the executor has
    /// released its resource and audio.
    pub async fn unload(self, bus: &MessageBus) {
        bus.detach_executor(self.tab);
        drop(self.inputs);
        if let Err(error) = self.task.await {
            log::error!("Executor of {} ended abnormally: {error}", self.tab);
        }
    }
}

/// Inject an executor into `tab`: register it on the bus and spawn its task.
pub fn spawn_executor(
    tab: TabId,
    bus: MessageBus,
    platform: Arc<dyn MediaPlatform>,
    service: Arc<dyn CommentaryService>,
) -> ExecutorHandle {
    let commands = bus.attach_executor(tab);
    let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
    let (media_tx, media_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(PlaybackState::Idle);

    let executor = MediaExecutor {
        tab,
        state: PlaybackState::Idle,
        state_tx,
        asset: None,
        resource: None,
        next_resource_id: 0,
        epoch: 0,
        pending_request: None,
        in_flight: None,
        bus,
        platform,
        service,
        inputs_tx: inputs_tx.clone(),
        media_tx,
    };

    log::info!("Media executor injected into {tab}");
    let task = tokio::spawn(executor.run(commands, inputs_rx, media_rx));

    ExecutorHandle {
        tab,
        inputs: inputs_tx,
        state: state_rx,
        task,
    }
}

impl MediaExecutor {
    /// Process inputs until the page is unloaded, i.e. the command queue is
    /// detached from the bus.
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<CommandEnvelope>,
        mut inputs: mpsc::UnboundedReceiver<ExecutorInput>,
        mut media: mpsc::UnboundedReceiver<MediaEvent>,
    ) {
        loop {
            tokio::select! {
                envelope = commands.recv() => match envelope {
                    Some(envelope) => self.handle_command(envelope).await,
                    None => break,
                },
                Some(input) = inputs.recv() => self.handle_input(input).await,
                Some(event) = media.recv() => self.handle_media_event(event).await,
            }
        }

        self.teardown();
        log::info!("Media executor of {} unloaded", self.tab);
    }

    async fn handle_command(&mut self, envelope: CommandEnvelope) {
        log::debug!("{} received {:?}", self.tab, envelope.command);
        // commands originate from a click in the panel
        self.platform.user_activation();

        let response = match envelope.command {
            Command::ToggleAudio => {
                self.apply(Event::Toggle).await;
                CommandResponse::Toggled {
                    is_playing: self.state.is_playing(),
                }
            }
            Command::StopAudio => {
                self.apply(Event::Stop).await;
                CommandResponse::Stopped { stopped: true }
            }
            Command::RestartAudio => {
                let restarted = self.asset.is_some() && self.state != PlaybackState::Loading;
                if restarted {
                    self.apply(Event::Restart).await;
                } else {
                    log::debug!("{} has no audio to restart", self.tab);
                }
                CommandResponse::Restarted { restarted }
            }
        };

        envelope.respond(response);
    }

    async fn handle_input(&mut self, input: ExecutorInput) {
        match input {
            ExecutorInput::Trigger(request) => {
                log::info!(
                    "{} triggered with style {} for {}",
                    self.tab,
                    request.style,
                    request.url
                );
                self.pending_request = Some(request);
                self.apply(Event::Trigger).await;
            }
            ExecutorInput::Generation { epoch, result } => {
                if epoch != self.epoch || self.state != PlaybackState::Loading {
                    log::debug!(
                        "{} discarding generation result of epoch {epoch} in {:?}",
                        self.tab,
                        self.state
                    );
                    return;
                }

                self.in_flight = None;
                match result {
                    Ok(asset) => {
                        self.asset = Some(asset);
                        self.apply(Event::Generated).await;
                    }
                    Err(error) => {
                        log::error!("{} failed to generate commentary: {error}", self.tab);
                        self.apply(Event::GenerationFailed(error.to_string())).await;
                    }
                }
            }
        }
    }

    async fn handle_media_event(&mut self, event: MediaEvent) {
        let live = self.resource.as_ref().map(|resource| resource.id);
        if live != Some(event.resource) {
            log::debug!(
                "{} ignoring {:?} of released resource #{}",
                self.tab,
                event.kind,
                event.resource
            );
            return;
        }

        match event.kind {
            MediaEventKind::Ended => self.apply(Event::Ended).await,
            MediaEventKind::Failed(error) => {
                log::error!("{} playback failed: {error}", self.tab);
                self.apply(Event::ResourceFailed(error)).await;
            }
        }
    }

    /// Run `event` and every follow-up event it causes through the machine.
    async fn apply(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let from = self.state;
            log::debug!("{} handling {event:?} in {from:?}", self.tab);

            let transition = machine::transition(from, event);
            if transition.state != from {
                log::info!("{} {from:?} -> {:?}", self.tab, transition.state);
                self.state = transition.state;
                self.state_tx.send_replace(transition.state);
            }

            for effect in transition.effects {
                // a follow-up outcome supersedes the rest of this transition
                if let Some(follow_up) = self.perform(effect).await {
                    queue.push_back(follow_up);
                    break;
                }
            }
        }
    }

    async fn perform(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::CancelGeneration => {
                self.epoch += 1;
                if let Some(task) = self.in_flight.take() {
                    log::debug!("{} abandoning in-flight generation", self.tab);
                    task.abort();
                }
                None
            }
            Effect::ReleaseResource => {
                if let Some(mut live) = self.resource.take() {
                    log::debug!("{} releasing resource #{}", self.tab, live.id);
                    live.inner.release();
                }
                None
            }
            Effect::DiscardAsset => {
                self.asset = None;
                None
            }
            Effect::RequestGeneration => {
                self.request_generation();
                None
            }
            Effect::CreateResource => self.create_resource().err(),
            Effect::StartResource => self.start_resource().await,
            Effect::PauseResource => {
                if let Some(live) = self.resource.as_mut() {
                    live.inner.pause();
                }
                None
            }
            Effect::Broadcast(broadcast) => {
                self.bus.broadcast(self.tab, broadcast);
                None
            }
        }
    }

    fn request_generation(&mut self) {
        let Some(request) = self.pending_request.take() else {
            log::warn!("{} asked to generate without a request", self.tab);
            return;
        };

        let epoch = self.epoch;
        let service = self.service.clone();
        let inputs = self.inputs_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = service.generate(&request).await;
            let _ = inputs.send(ExecutorInput::Generation { epoch, result });
        }));
    }

    fn create_resource(&mut self) -> Result<(), Event> {
        let Some(asset) = self.asset.clone() else {
            return Err(Event::StartFailed("no commentary audio is available".to_string()));
        };

        let id = self.next_resource_id;
        self.next_resource_id += 1;
        match self.platform.create(id, asset, self.media_tx.clone()) {
            Ok(inner) => {
                log::debug!("{} created resource #{id}", self.tab);
                self.resource = Some(LiveResource { id, inner });
                Ok(())
            }
            Err(error) => Err(Event::StartFailed(error.to_string())),
        }
    }

    async fn start_resource(&mut self) -> Option<Event> {
        let Some(live) = self.resource.as_mut() else {
            return Some(Event::StartFailed("no audio resource to start".to_string()));
        };

        Some(match live.inner.play().await {
            Ok(()) => Event::StartSucceeded,
            Err(PlayError::NotAllowed(message)) => {
                log::info!("{} autoplay blocked: {message}", self.tab);
                Event::StartBlocked(message)
            }
            Err(PlayError::Failed(error)) => Event::StartFailed(error),
        })
    }

    fn teardown(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        if let Some(mut live) = self.resource.take() {
            live.inner.release();
        }
        self.asset = None;
    }
}
