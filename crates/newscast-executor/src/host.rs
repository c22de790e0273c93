//! Page host: injects executors into tabs and routes panel requests to them.

use std::{collections::HashMap, sync::Arc};

use newscast_bridge::{GenerationRequest, HostRequest, MessageBus, TabId};
use tokio::sync::mpsc::Receiver;

use crate::{
    executor::{ExecutorHandle, spawn_executor},
    generation::CommentaryService,
    media::MediaPlatform,
};

/// Owns the executors of every tab and the services they share.
pub struct PageHost {
    bus: MessageBus,
    platform: Arc<dyn MediaPlatform>,
    service: Arc<dyn CommentaryService>,
    executors: HashMap<TabId, ExecutorHandle>,
}

impl PageHost {
    pub fn new(
        bus: MessageBus,
        platform: Arc<dyn MediaPlatform>,
        service: Arc<dyn CommentaryService>,
    ) -> Self {
        Self {
            bus,
            platform,
            service,
            executors: HashMap::new(),
        }
    }

    /// Read and dispatch panel requests until the panel side closes, then
    /// unload every page.
    pub async fn serve(mut self, mut rx: Receiver<HostRequest>) {
        while let Some(request) = rx.recv().await {
            log::debug!("Got a panel request: {request:?}");
            self.dispatch(request).await;
        }

        log::info!("Panel channel closed, unloading {} page(s)", self.executors.len());
        for (_, handle) in self.executors.drain() {
            handle.unload(&self.bus).await;
        }
    }

    async fn dispatch(&mut self, request: HostRequest) {
        match request {
            HostRequest::Inject { tab, request } => self.inject(tab, request),
            HostRequest::Unload { tab } => match self.executors.remove(&tab) {
                Some(handle) => handle.unload(&self.bus).await,
                None => log::debug!("{tab} has no executor to unload"),
            },
        }
    }

    /// Trigger a generation in `tab`, injecting an executor first unless a
    /// live one is already there.
    fn inject(&mut self, tab: TabId, request: GenerationRequest) {
        let reusable = self
            .executors
            .get(&tab)
            .is_some_and(|handle| handle.is_alive() && self.bus.has_executor(tab));
        if !reusable {
            let handle = spawn_executor(
                tab,
                self.bus.clone(),
                self.platform.clone(),
                self.service.clone(),
            );
            self.executors.insert(tab, handle);
        }

        let triggered = self
            .executors
            .get(&tab)
            .is_some_and(|handle| handle.trigger(request));
        if !triggered {
            log::error!("Could not deliver the trigger to the executor of {tab}");
        }
    }
}
