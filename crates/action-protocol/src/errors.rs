// Archivo: errors.rs
// Propósito: errores del protocolo de acciones y alias Result<T>.
use outreach_domain::DomainError;
use thiserror::Error;

/// Errores que `ActionService::process` puede devolver al llamador.
///
/// Sólo los fallos del almacén escapan: un bloque mal formado o un destino
/// inexistente se resuelven localmente.
#[derive(Error, Debug)]
pub enum ActionError {
  /// Fallo del almacén durante una mutación. No se reintenta.
  #[error("Error de almacenamiento: {0}")]
  Store(#[from] DomainError),
}

/// Fallo al decodificar el cuerpo de un bloque.
#[derive(Error, Debug)]
pub enum DecodeError {
  /// El cuerpo no es JSON bien formado.
  #[error("JSON mal formado: {0}")]
  Syntax(#[source] serde_json::Error),
  /// JSON válido pero con una forma distinta de la esperada.
  #[error("Forma inesperada: {0}")]
  Shape(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, ActionError>;
