use action_protocol::{ActionError, DecodeError};
use outreach_domain::DomainError;
use thiserror::Error;

use crate::provider::GenerationError;

// Errores del flujo de chat y de generación de secuencias.
//
// El envío de mensajes sólo devuelve error cuando no se puede guardar el
// historial; los fallos del generador o del almacén durante la acción se
// convierten en el mensaje de disculpa.
#[derive(Error, Debug)]
pub enum ChatError {
  /// Entrada rechazada antes de tocar el almacén.
  #[error("Error de validacion: {0}")]
  Validation(String),

  #[error("Error de dominio: {0}")]
  Domain(#[from] DomainError),

  #[error("Error de accion: {0}")]
  Action(#[from] ActionError),

  #[error("Error del generador: {0}")]
  Generation(#[from] GenerationError),

  /// La respuesta de generación no contenía una lista de pasos válida.
  #[error("Respuesta de generacion invalida: {0}")]
  Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, ChatError>;
