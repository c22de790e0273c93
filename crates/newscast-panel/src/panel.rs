use newscast_bridge::{
    Broadcast, BroadcastEnvelope, BroadcastSubscription, Command, CommandResponse, Delivery,
    GenerationRequest, HostRequest, MessageBus, StyleId, TabId,
    config::PanelConfig,
    notification::{NotificationMessage, NotificationType},
};
use newscast_store::{PersistedSnapshot, SharedStore, SnapshotKey, StoreError};
use tokio::sync::mpsc::Sender;

use crate::{
    affordance::Affordance,
    reconcile::{affordance_for, reconcile, snapshot_for},
    restricted::is_restricted,
};

/// The tab in focus when the panel was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTab {
    pub id: TabId,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("failed to access the state store: {0}")]
    Store(#[from] StoreError),
    /// The runtime that injects executors into pages is gone.
    #[error("the page host is not running")]
    HostUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A generation was requested for the focused tab.
    Accepted,
    /// The page does not allow generation; a notice explains why.
    Rejected,
}

/// A panel instance, alive from open to close.
///
/// Nothing is remembered between two instances except what went through
/// the store.
pub struct ControlPanel {
    tab: ActiveTab,
    bus: MessageBus,
    store: SharedStore,
    host: Sender<HostRequest>,
    config: PanelConfig,
    subscription: BroadcastSubscription,
    view: Affordance,
    style: StyleId,
    notices: Vec<NotificationMessage>,
}

impl ControlPanel {
    /// Open the panel on `tab`, rebuilding its view from the store.
    pub async fn open(
        tab: ActiveTab,
        bus: MessageBus,
        store: SharedStore,
        host: Sender<HostRequest>,
        config: PanelConfig,
    ) -> Result<Self, PanelError> {
        // listen before reading, so nothing falls between the read and the
        // first broadcast
        let subscription = bus.subscribe();
        let snapshot = store.get(&SnapshotKey::ALL).await?;

        if let Some(active) = snapshot.active_tab_id.filter(|active| *active != tab.id) {
            log::debug!("Stored playback state belongs to {active}, ignoring it in {}", tab.id);
        }
        let view = reconcile(&snapshot, tab.id);
        let style = snapshot.selected_style.unwrap_or(config.default_style);
        log::info!("Panel opened on {} showing {view}", tab.id);

        Ok(Self {
            tab,
            bus,
            store,
            host,
            config,
            subscription,
            view,
            style,
            notices: Vec::new(),
        })
    }

    pub fn tab(&self) -> &ActiveTab {
        &self.tab
    }

    pub fn view(&self) -> &Affordance {
        &self.view
    }

    pub fn style(&self) -> StyleId {
        self.style
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<NotificationMessage> {
        std::mem::take(&mut self.notices)
    }

    pub async fn select_style(&mut self, style: StyleId) -> Result<(), PanelError> {
        self.store.set(PersistedSnapshot::style(style)).await?;
        self.style = style;
        Ok(())
    }

    /// Ask for a new commentary of the focused page.
    pub async fn trigger(&mut self) -> Result<TriggerOutcome, PanelError> {
        if is_restricted(&self.tab.url, &self.config.restricted_prefixes) {
            log::warn!("Refusing to generate commentary on {}", self.tab.url);
            self.notify(
                NotificationType::Warning,
                "Commentary cannot be generated on this page. Open a news article first.",
            );
            return Ok(TriggerOutcome::Rejected);
        }

        self.store
            .set(PersistedSnapshot {
                is_loading: Some(true),
                active_tab_id: Some(self.tab.id),
                ..PersistedSnapshot::default()
            })
            .await?;
        self.view = Affordance::Loading;

        let request = HostRequest::Inject {
            tab: self.tab.id,
            request: GenerationRequest {
                url: self.tab.url.clone(),
                style: self.style,
            },
        };
        if self.host.send(request).await.is_err() {
            log::error!("Page host is gone, cannot trigger {}", self.tab.id);
            self.store
                .set(PersistedSnapshot::playback(self.tab.id, false, false))
                .await?;
            self.view = Affordance::Idle;
            return Err(PanelError::HostUnavailable);
        }

        Ok(TriggerOutcome::Accepted)
    }

    /// Play/pause flip. Returns whether audio plays afterwards.
    pub async fn toggle(&mut self) -> Result<bool, PanelError> {
        let is_playing = match self.bus.request(self.tab.id, Command::ToggleAudio).await {
            Delivery::Delivered(CommandResponse::Toggled { is_playing }) => is_playing,
            other => {
                self.nothing_to_control(Command::ToggleAudio, other);
                return Ok(false);
            }
        };

        self.store
            .set(PersistedSnapshot {
                is_playing: Some(is_playing),
                active_tab_id: Some(self.tab.id),
                ..PersistedSnapshot::default()
            })
            .await?;
        if is_playing {
            self.view = Affordance::Playing;
        } else if self.view == Affordance::Playing {
            self.view = Affordance::Paused;
        }

        self.drain_broadcasts().await?;
        Ok(is_playing)
    }

    /// Halt playback. Returns whether an executor handled the request.
    pub async fn stop(&mut self) -> Result<bool, PanelError> {
        match self.bus.request(self.tab.id, Command::StopAudio).await {
            Delivery::Delivered(CommandResponse::Stopped { .. }) => {
                // stopping is not broadcast, the store is updated from here
                self.store
                    .set(PersistedSnapshot::playback(self.tab.id, false, false))
                    .await?;
                self.view = Affordance::Stopped;
                self.drain_broadcasts().await?;
                Ok(true)
            }
            other => {
                self.nothing_to_control(Command::StopAudio, other);
                Ok(false)
            }
        }
    }

    /// Replay the retained commentary from the start. Returns whether a
    /// replay was started.
    pub async fn restart(&mut self) -> Result<bool, PanelError> {
        match self.bus.request(self.tab.id, Command::RestartAudio).await {
            Delivery::Delivered(CommandResponse::Restarted { restarted: true }) => {
                self.drain_broadcasts().await?;
                Ok(true)
            }
            Delivery::Delivered(_) => {
                self.notify(NotificationType::Info, "There is no commentary to restart yet.");
                Ok(false)
            }
            other => {
                self.nothing_to_control(Command::RestartAudio, other);
                Ok(false)
            }
        }
    }

    /// Wait for the next broadcast and apply it. Returns the resulting view,
    /// or `None` once another panel took over the bus.
    pub async fn next_broadcast(&mut self) -> Result<Option<Affordance>, PanelError> {
        match self.recv_broadcast().await {
            Some(envelope) => self.apply_broadcast(envelope).await.map(Some),
            None => Ok(None),
        }
    }

    /// Wait for the next broadcast without applying it. Cancel safe: a
    /// broadcast is never lost when the returned future is dropped.
    pub async fn recv_broadcast(&mut self) -> Option<BroadcastEnvelope> {
        self.subscription.recv().await
    }

    /// Persist a received broadcast and, if it concerns the focused tab,
    /// render it. Returns the resulting view.
    pub async fn apply_broadcast(
        &mut self,
        envelope: BroadcastEnvelope,
    ) -> Result<Affordance, PanelError> {
        self.handle_broadcast(envelope).await?;
        Ok(self.view.clone())
    }

    pub fn close(self) {
        log::info!("Panel on {} closed", self.tab.id);
    }

    async fn drain_broadcasts(&mut self) -> Result<(), PanelError> {
        while let Some(envelope) = self.subscription.try_recv() {
            self.handle_broadcast(envelope).await?;
        }
        Ok(())
    }

    async fn handle_broadcast(&mut self, envelope: BroadcastEnvelope) -> Result<(), PanelError> {
        let BroadcastEnvelope { tab, broadcast } = envelope;
        log::debug!("Panel received {} from {tab}", broadcast.action());

        self.store.set(snapshot_for(tab, &broadcast)).await?;
        if tab != self.tab.id {
            return Ok(());
        }

        match &broadcast {
            Broadcast::NeedsUserInteraction { message } => {
                log::info!("Autoplay blocked in {tab}: {message}");
                self.notify(NotificationType::Info, "Click play to start the commentary.");
            }
            Broadcast::Error { error } => {
                self.notify(NotificationType::Error, error.clone());
            }
            _ => {}
        }
        self.view = affordance_for(&broadcast);
        Ok(())
    }

    /// No executor answered: there is no playback in this tab.
    fn nothing_to_control(&mut self, command: Command, delivery: Delivery<CommandResponse>) {
        log::debug!("{command:?} in {} got {delivery:?}, nothing is playing", self.tab.id);
        self.view = Affordance::Idle;
    }

    fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        self.notices
            .push(NotificationMessage::new(notification_type, message));
    }
}
