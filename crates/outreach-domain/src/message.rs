// message.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
  System,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Assistant => "assistant",
      Role::System => "system",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Role {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Role::User),
      "assistant" => Ok(Role::Assistant),
      "system" => Ok(Role::System),
      other => Err(DomainError::ValidationError(format!("Rol de mensaje desconocido: {}", other))),
    }
  }
}

/// Mensaje del historial de chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub id: Uuid,
  #[serde(rename = "user_id")]
  pub owner_id: Uuid,
  pub content: String,
  pub role: Role,
  pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
  pub fn new(owner_id: Uuid, role: Role, content: impl Into<String>) -> Self {
    Self { id: Uuid::new_v4(), owner_id, content: content.into(), role, timestamp: Utc::now() }
  }
}
