//! Flujo de chat alrededor del protocolo de acciones: historial, llamada al
//! generador, respuesta de disculpa y difusión de eventos.
//!
//! - `service`: `ChatService` (enviar, historial, borrar).
//! - `generation`: secuencia completa a partir de puesto y empresa.
//! - `provider`: contrato `TextGenerator` y `ScriptedGenerator`.
//! - `sink`: `ChannelSink` sobre `tokio::sync::broadcast`.
//! - `config`: `ChatConfig` desde el entorno.
pub mod config;
pub mod errors;
pub mod generation;
pub mod prompts;
pub mod provider;
pub mod service;
pub mod sink;

pub use config::{ChatConfig, DEFAULT_APOLOGY_MESSAGE, DEFAULT_HISTORY_LIMIT};
pub use errors::{ChatError, Result};
pub use generation::SequenceGenerationService;
pub use provider::{GenerationError, GenerationRequest, HistoryEntry, ScriptedGenerator, TextGenerator};
pub use service::{ChatExchange, ChatService};
pub use sink::{ChannelSink, DEFAULT_CHANNEL_CAPACITY};
