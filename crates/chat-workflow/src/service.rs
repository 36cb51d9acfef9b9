// Archivo: service.rs
// Propósito: flujo de un mensaje de chat. Guarda el mensaje del usuario,
// pide respuesta al generador, aplica el bloque de acción que traiga y
// guarda la respuesta visible.
use crate::config::ChatConfig;
use crate::errors::{ChatError, Result};
use crate::prompts::system_prompt;
use crate::provider::{GenerationRequest, HistoryEntry, TextGenerator};
use action_protocol::{ActionContext, ActionService, MutationOutcome};
use log::{error, info};
use outreach_domain::{ChatMessage, EventSink, MessageRepository, Role, SequenceRepository, WorkspaceEvent};
use std::sync::Arc;
use uuid::Uuid;

/// Resultado de `ChatService::send_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
    pub action_performed: bool,
    pub outcome: Option<MutationOutcome>,
    /// La respuesta guardada es el mensaje de disculpa.
    pub apologized: bool,
}

pub struct ChatService<R, G>
    where R: SequenceRepository + MessageRepository + ?Sized,
          G: TextGenerator + ?Sized
{
    repo: Arc<R>,
    generator: Arc<G>,
    actions: ActionService<R>,
    sink: Arc<dyn EventSink>,
    config: ChatConfig,
}

impl<R, G> ChatService<R, G>
    where R: SequenceRepository + MessageRepository + ?Sized,
          G: TextGenerator + ?Sized
{
    pub fn new(repo: Arc<R>, generator: Arc<G>, sink: Arc<dyn EventSink>, config: ChatConfig) -> Self {
        let actions = ActionService::new(repo.clone(), sink.clone());
        Self { repo,
               generator,
               actions,
               sink,
               config }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Envía un mensaje actuando sobre la secuencia más reciente del owner.
    pub fn send_message(&self, owner_id: Uuid, content: &str) -> Result<ChatExchange> {
        self.send_message_in(&ActionContext::for_owner(owner_id), content)
    }

    /// Envía un mensaje con destino explícito para los bloques de acción.
    pub fn send_message_in(&self, ctx: &ActionContext, content: &str) -> Result<ChatExchange> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation("Message content is required".into()));
        }
        let user_message = ChatMessage::new(ctx.owner_id, Role::User, content);
        self.repo.save_message(&user_message)?;
        self.sink.emit(WorkspaceEvent::Message(user_message.clone()));

        let request = GenerationRequest { system: system_prompt(),
                                          history: self.history_for(&user_message)?,
                                          prompt: content.to_string() };
        info!("mensaje de {} enviado al generador con {} de contexto", ctx.owner_id, request.history.len());

        let (text, action_performed, outcome, apologized) = match self.generator.generate(&request) {
            Err(e) => {
                error!("fallo del generador: {}", e);
                (self.config.apology_message.clone(), false, None, true)
            }
            Ok(raw) => match self.actions.process(&raw, ctx) {
                Ok(processed) => (processed.text, processed.action_performed, processed.outcome, false),
                Err(e) => {
                    error!("fallo al aplicar la acción: {}", e);
                    (self.config.apology_message.clone(), false, None, true)
                }
            },
        };

        let assistant_message = ChatMessage::new(ctx.owner_id, Role::Assistant, text);
        self.repo.save_message(&assistant_message)?;
        self.sink.emit(WorkspaceEvent::Message(assistant_message.clone()));
        Ok(ChatExchange { user_message,
                          assistant_message,
                          action_performed,
                          outcome,
                          apologized })
    }

    /// Historial completo del owner en orden cronológico.
    pub fn history(&self, owner_id: &Uuid) -> Result<Vec<ChatMessage>> {
        Ok(self.repo.list_messages(owner_id)?)
    }

    /// Borra el historial y devuelve cuántos mensajes se eliminaron.
    pub fn clear(&self, owner_id: &Uuid) -> Result<usize> {
        let removed = self.repo.clear_messages(owner_id)?;
        info!("historial de {} borrado ({} mensajes)", owner_id, removed);
        Ok(removed)
    }

    // Últimos `history_limit` mensajes previos al actual, sin los de sistema.
    fn history_for(&self, current: &ChatMessage) -> Result<Vec<HistoryEntry>> {
        let limit = self.config.history_limit;
        let recent = self.repo.recent_messages(&current.owner_id, limit.saturating_add(1))?;
        let mut entries: Vec<HistoryEntry> = recent.into_iter()
                                                   .filter(|m| m.id != current.id && m.role != Role::System)
                                                   .map(|m| HistoryEntry { role: m.role, content: m.content })
                                                   .collect();
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        Ok(entries)
    }
}
