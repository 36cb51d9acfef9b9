// Archivo: config.rs
// Propósito: parámetros del flujo de chat leídos del entorno.
use crate::errors::{ChatError, Result};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_APOLOGY_MESSAGE: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Mensajes previos enviados como contexto.
    pub history_limit: usize,
    /// Respuesta guardada cuando el generador o el almacén fallan.
    pub apology_message: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_limit: DEFAULT_HISTORY_LIMIT,
               apology_message: DEFAULT_APOLOGY_MESSAGE.to_string() }
    }
}

impl ChatConfig {
    /// Lee `HELIX_HISTORY_LIMIT` y `HELIX_APOLOGY_MESSAGE` (cargando `.env`
    /// si existe). Las variables ausentes o vacías toman el valor por defecto.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
        where F: Fn(&str) -> Option<String>
    {
        let mut config = Self::default();
        if let Some(raw) = lookup("HELIX_HISTORY_LIMIT").filter(|v| !v.trim().is_empty()) {
            config.history_limit = raw.trim().parse().map_err(|_| {
                                                          ChatError::Validation(format!("HELIX_HISTORY_LIMIT \
                                                                                         inválido: '{}'",
                                                                                        raw))
                                                      })?;
        }
        if let Some(msg) = lookup("HELIX_APOLOGY_MESSAGE").filter(|v| !v.trim().is_empty()) {
            config.apology_message = msg;
        }
        Ok(config)
    }
}
