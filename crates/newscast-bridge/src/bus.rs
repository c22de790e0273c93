//! Best-effort message bus between the panel and per-tab executors.
//!
//! Commands are addressed to exactly one tab and answered through a oneshot
//! reply; the caller gets a [`Delivery`] telling apart a real answer, a tab
//! without executor and an executor that never answered. Broadcasts go to
//! at most one listener and are dropped silently when nobody listens.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::Duration,
};

use tokio::sync::{mpsc, oneshot};

use crate::{
    Broadcast, BroadcastEnvelope, Command, CommandResponse, TabId, config::BusConfig,
};

/// A command waiting in an executor's queue, with the way back to the caller.
#[derive(Debug)]
pub struct CommandEnvelope {
    pub command: Command,
    reply: oneshot::Sender<CommandResponse>,
}

impl CommandEnvelope {
    /// Answer the caller. A caller that already gave up is not an error.
    pub fn respond(self, response: CommandResponse) {
        let command = self.command;
        if self.reply.send(response).is_err() {
            log::debug!("Caller of {command:?} went away before the response was ready");
        }
    }
}

/// Outcome of a request sent over the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery<T> {
    /// The executor answered.
    Delivered(T),
    /// No executor lives in the addressed tab, or it went away mid-request.
    NoReceiver,
    /// The executor accepted the request but did not answer in time.
    TimedOut,
}

impl<T> Delivery<T> {
    /// The response if one was delivered.
    pub fn into_response(self) -> Option<T> {
        match self {
            Delivery::Delivered(response) => Some(response),
            Delivery::NoReceiver | Delivery::TimedOut => None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }
}

/// Receiving end of the broadcast channel held by the current listener.
#[derive(Debug)]
pub struct BroadcastSubscription {
    rx: mpsc::UnboundedReceiver<BroadcastEnvelope>,
}

impl BroadcastSubscription {
    /// Wait for the next broadcast. Returns `None` once another listener
    /// took over.
    pub async fn recv(&mut self) -> Option<BroadcastEnvelope> {
        self.rx.recv().await
    }

    /// Take an already queued broadcast without waiting.
    pub fn try_recv(&mut self) -> Option<BroadcastEnvelope> {
        self.rx.try_recv().ok()
    }
}

struct BusInner {
    command_timeout: Duration,
    command_buffer: usize,
    executors: RwLock<HashMap<TabId, mpsc::Sender<CommandEnvelope>>>,
    listener: Mutex<Option<mpsc::UnboundedSender<BroadcastEnvelope>>>,
}

/// Cheaply cloneable handle to the bus shared by all contexts.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

impl MessageBus {
    pub fn new(config: &BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                command_timeout: Duration::from_millis(config.command_timeout_ms),
                command_buffer: config.command_buffer.max(1),
                executors: RwLock::new(HashMap::new()),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Register the executor of `tab` and return its command queue. A
    /// previously registered executor of the same tab stops receiving
    /// commands.
    pub fn attach_executor(&self, tab: TabId) -> mpsc::Receiver<CommandEnvelope> {
        let (tx, rx) = mpsc::channel(self.inner.command_buffer);
        let previous = self
            .inner
            .executors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tab, tx);
        if previous.is_some() {
            log::debug!("Replaced the command queue of {tab}");
        }
        rx
    }

    /// Forget the executor of `tab`; its command queue closes.
    pub fn detach_executor(&self, tab: TabId) {
        self.inner
            .executors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tab);
    }

    /// Whether `tab` currently has an executor accepting commands.
    pub fn has_executor(&self, tab: TabId) -> bool {
        self.executor_sender(tab).is_some()
    }

    fn executor_sender(&self, tab: TabId) -> Option<mpsc::Sender<CommandEnvelope>> {
        self.inner
            .executors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tab)
            .filter(|sender| !sender.is_closed())
            .cloned()
    }

    /// Send `command` to the executor of `tab` and wait for its answer.
    pub async fn request(&self, tab: TabId, command: Command) -> Delivery<CommandResponse> {
        let Some(sender) = self.executor_sender(tab) else {
            log::debug!("No executor in {tab} to receive {command:?}");
            return Delivery::NoReceiver;
        };

        let (reply, response) = oneshot::channel();
        let exchange = async move {
            sender.send(CommandEnvelope { command, reply }).await.ok()?;
            response.await.ok()
        };

        match tokio::time::timeout(self.inner.command_timeout, exchange).await {
            Ok(Some(response)) => {
                log::debug!("{tab} answered {command:?} with {response:?}");
                Delivery::Delivered(response)
            }
            Ok(None) => {
                log::debug!("Executor of {tab} went away while handling {command:?}");
                Delivery::NoReceiver
            }
            Err(_) => {
                log::warn!(
                    "Executor of {tab} did not answer {command:?} within {:?}",
                    self.inner.command_timeout
                );
                Delivery::TimedOut
            }
        }
    }

    /// Become the single broadcast listener, replacing any previous one.
    pub fn subscribe(&self) -> BroadcastSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let previous = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(tx);
        if previous.is_some() {
            log::debug!("A new listener replaced the previous broadcast listener");
        }
        BroadcastSubscription { rx }
    }

    /// Fire-and-forget delivery of `broadcast` on behalf of `tab`. Never
    /// blocks and never fails; without a listener the message is dropped.
    pub fn broadcast(&self, tab: TabId, broadcast: Broadcast) {
        let mut listener = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = listener.as_ref() else {
            log::debug!("No listener for {} from {tab}", broadcast.action());
            return;
        };

        let action = broadcast.action();
        if tx.send(BroadcastEnvelope { tab, broadcast }).is_err() {
            log::debug!("Listener closed, dropping {action} from {tab}");
            *listener = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_with_timeout(command_timeout_ms: u64) -> MessageBus {
        MessageBus::new(&BusConfig {
            command_timeout_ms,
            ..BusConfig::default()
        })
    }

    #[tokio::test]
    async fn request_to_tab_without_executor_has_no_receiver() {
        let bus = MessageBus::new(&BusConfig::default());
        let delivery = bus.request(TabId(1), Command::ToggleAudio).await;
        assert_eq!(delivery, Delivery::NoReceiver);
    }

    #[tokio::test]
    async fn request_is_answered_by_the_addressed_executor() {
        let bus = MessageBus::new(&BusConfig::default());
        let mut commands = bus.attach_executor(TabId(7));
        tokio::spawn(async move {
            while let Some(envelope) = commands.recv().await {
                assert_eq!(envelope.command, Command::StopAudio);
                envelope.respond(CommandResponse::Stopped { stopped: true });
            }
        });

        let delivery = bus.request(TabId(7), Command::StopAudio).await;
        assert_eq!(
            delivery,
            Delivery::Delivered(CommandResponse::Stopped { stopped: true })
        );
        assert_eq!(
            bus.request(TabId(8), Command::StopAudio).await,
            Delivery::NoReceiver
        );
    }

    #[tokio::test]
    async fn silent_executor_times_out() {
        let bus = bus_with_timeout(20);
        let _commands = bus.attach_executor(TabId(1));
        let delivery = bus.request(TabId(1), Command::ToggleAudio).await;
        assert_eq!(delivery, Delivery::TimedOut);
    }

    #[tokio::test]
    async fn executor_dropping_the_request_is_no_receiver() {
        let bus = MessageBus::new(&BusConfig::default());
        let mut commands = bus.attach_executor(TabId(1));
        tokio::spawn(async move {
            let envelope = commands.recv().await;
            drop(envelope);
        });
        let delivery = bus.request(TabId(1), Command::ToggleAudio).await;
        assert_eq!(delivery, Delivery::NoReceiver);
    }

    #[tokio::test]
    async fn detached_executor_no_longer_receives() {
        let bus = MessageBus::new(&BusConfig::default());
        let _commands = bus.attach_executor(TabId(3));
        assert!(bus.has_executor(TabId(3)));
        bus.detach_executor(TabId(3));
        assert!(!bus.has_executor(TabId(3)));
    }

    #[test]
    fn broadcast_without_listener_is_dropped() {
        let bus = MessageBus::new(&BusConfig::default());
        bus.broadcast(TabId(1), Broadcast::Started);

        let mut subscription = bus.subscribe();
        assert!(subscription.try_recv().is_none());
    }

    #[test]
    fn broadcasts_arrive_in_order() {
        let bus = MessageBus::new(&BusConfig::default());
        let mut subscription = bus.subscribe();
        bus.broadcast(TabId(1), Broadcast::Started);
        bus.broadcast(TabId(1), Broadcast::Paused);
        bus.broadcast(TabId(1), Broadcast::Completed);

        let received: Vec<_> = std::iter::from_fn(|| subscription.try_recv())
            .map(|envelope| envelope.broadcast)
            .collect();
        assert_eq!(
            received,
            vec![Broadcast::Started, Broadcast::Paused, Broadcast::Completed]
        );
    }

    #[tokio::test]
    async fn new_listener_replaces_the_previous_one() {
        let bus = MessageBus::new(&BusConfig::default());
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        bus.broadcast(TabId(2), Broadcast::Paused);

        assert!(first.recv().await.is_none());
        assert_eq!(
            second.try_recv(),
            Some(BroadcastEnvelope {
                tab: TabId(2),
                broadcast: Broadcast::Paused
            })
        );
    }

    #[test]
    fn closed_listener_does_not_break_broadcasting() {
        let bus = MessageBus::new(&BusConfig::default());
        drop(bus.subscribe());
        bus.broadcast(TabId(1), Broadcast::Started);
        bus.broadcast(TabId(1), Broadcast::Paused);
    }
}
