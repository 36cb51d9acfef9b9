// Archivo: provider.rs
// Propósito: contrato con el generador de texto y un generador guionizado
// para pruebas y para la CLI.
use outreach_domain::Role;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Mensaje previo enviado como contexto al generador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Petición completa a un generador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system: String,
    /// Historial cronológico, sin el mensaje actual y sin mensajes de sistema.
    pub history: Vec<HistoryEntry>,
    pub prompt: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("proveedor no disponible: {0}")]
    Unavailable(String),
    #[error("respuesta vacía del proveedor")]
    EmptyResponse,
}

/// Generador de texto (modelo de lenguaje u operador humano).
///
/// La respuesta puede contener bloques de acción; el llamador se encarga de
/// procesarlos.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Devuelve respuestas preparadas en orden y registra las peticiones
/// recibidas. Sin respuestas pendientes falla con `Unavailable`.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let generator = Self::new();
        for r in replies {
            generator.push_reply(r);
        }
        generator
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(Ok(reply.into()));
    }

    pub fn push_failure(&self, error: GenerationError) {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(Err(error));
    }

    /// Peticiones recibidas hasta ahora, en orden.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(request.clone());
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unavailable("sin respuestas preparadas".into())))
    }
}
