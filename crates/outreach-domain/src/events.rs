// events.rs
// Contrato de difusión hacia observadores (websocket, CLI, pruebas).
use crate::{ChatMessage, SequenceView};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Evento emitido hacia los observadores del espacio de trabajo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WorkspaceEvent {
  /// Nuevo mensaje de chat (usuario o asistente).
  Message(ChatMessage),
  /// Estado completo de una secuencia tras una mutación.
  SequenceUpdate(SequenceView),
}

impl WorkspaceEvent {
  pub fn name(&self) -> &'static str {
    match self {
      WorkspaceEvent::Message(_) => "message",
      WorkspaceEvent::SequenceUpdate(_) => "sequence_update",
    }
  }
}

/// Destino de los eventos. La emisión es "fire and forget": un observador
/// ausente o lento nunca hace fallar la operación que emite.
pub trait EventSink: Send + Sync {
  fn emit(&self, event: WorkspaceEvent);
}

/// Sink que descarta todos los eventos.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
  fn emit(&self, _event: WorkspaceEvent) {}
}

/// Sink que acumula los eventos en memoria. Pensado para pruebas.
#[derive(Debug, Default)]
pub struct RecordingSink {
  events: Mutex<Vec<WorkspaceEvent>>,
}

impl RecordingSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<WorkspaceEvent> {
    self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }

  /// Sólo las vistas de secuencia emitidas, en orden.
  pub fn sequence_updates(&self) -> Vec<SequenceView> {
    self.events()
        .into_iter()
        .filter_map(|e| match e {
          WorkspaceEvent::SequenceUpdate(view) => Some(view),
          WorkspaceEvent::Message(_) => None,
        })
        .collect()
  }

  pub fn messages(&self) -> Vec<ChatMessage> {
    self.events()
        .into_iter()
        .filter_map(|e| match e {
          WorkspaceEvent::Message(m) => Some(m),
          WorkspaceEvent::SequenceUpdate(_) => None,
        })
        .collect()
  }

  pub fn clear(&self) {
    self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
  }
}

impl EventSink for RecordingSink {
  fn emit(&self, event: WorkspaceEvent) {
    self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
  }
}
