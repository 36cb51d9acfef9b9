// Archivo: sink.rs
// Propósito: difusión de eventos por un canal `broadcast` de tokio.
use log::debug;
use outreach_domain::{EventSink, WorkspaceEvent};
use tokio::sync::broadcast;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Publica cada evento a todos los suscriptores vivos. Sin suscriptores el
/// evento se descarta; un suscriptor lento pierde los más antiguos
/// (`RecvError::Lagged`) sin bloquear al emisor.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: broadcast::Sender<WorkspaceEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: WorkspaceEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            debug!("evento '{}' descartado: sin suscriptores", name);
        }
    }
}
