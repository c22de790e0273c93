//! Communication bridge between the control panel and page media executors.
//!
//! This crate defines the types and protocols shared by every execution
//! context of the application:
//! - The panel sends commands (toggle, stop, restart) to the executor living
//!   in one specific tab and waits for a response.
//! - Executors push lifecycle broadcasts (started, paused, completed, ...) to
//!   whichever panel is currently listening, if any.
//! - The panel asks the page host to inject an executor into a tab and start
//!   a commentary generation there.
//!
//! Commands and host requests travel over bounded [`tokio::sync::mpsc`]
//! channels; broadcasts are fire-and-forget and never block the sender. See
//! [`bus::MessageBus`] and [`BridgeChannels`].

pub mod bus;
pub mod config;
pub mod message;
pub mod notification;
pub mod playback;
pub mod style;
pub mod tab;

use tokio::sync::mpsc::{self, Receiver, Sender};

pub use crate::bus::{BroadcastSubscription, CommandEnvelope, Delivery, MessageBus};
pub use crate::message::{
    Broadcast, BroadcastEnvelope, Command, CommandResponse, GenerationRequest, HostRequest,
};
pub use crate::playback::PlaybackState;
pub use crate::style::StyleId;
pub use crate::tab::TabId;

/// The message bus together with the paired channel used by the panel to
/// reach the page host.
pub struct BridgeChannels {
    /// Bus shared by the panel and every executor.
    pub bus: MessageBus,
    /// Sender used by the panel to ask the page host for injections.
    pub panel_tx: Sender<HostRequest>,
    /// Receiver consumed by the page host dispatch loop.
    pub host_rx: Receiver<HostRequest>,
}

impl BridgeChannels {
    /// Creates the bus and host channel using the given bus settings.
    pub fn new(config: &config::BusConfig) -> Self {
        let (panel_tx, host_rx) = mpsc::channel(config.host_buffer.max(1));
        Self {
            bus: MessageBus::new(config),
            panel_tx,
            host_rx,
        }
    }
}

impl Default for BridgeChannels {
    fn default() -> Self {
        Self::new(&config::BusConfig::default())
    }
}
