// step.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tipo de acción de un paso.
///
/// El conjunto es abierto: cualquier etiqueta distinta de las conocidas se
/// conserva tal cual en `Custom` para no perder lo que envía el generador.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
  #[default]
  Email,
  Message,
  Call,
  Other,
  Custom(String),
}

impl StepKind {
  pub fn as_str(&self) -> &str {
    match self {
      StepKind::Email => "email",
      StepKind::Message => "message",
      StepKind::Call => "call",
      StepKind::Other => "other",
      StepKind::Custom(label) => label,
    }
  }
}

impl fmt::Display for StepKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl From<&str> for StepKind {
  fn from(s: &str) -> Self {
    match s {
      "email" => StepKind::Email,
      "message" => StepKind::Message,
      "call" => StepKind::Call,
      "other" => StepKind::Other,
      label => StepKind::Custom(label.to_string()),
    }
  }
}

impl From<String> for StepKind {
  fn from(s: String) -> Self {
    StepKind::from(s.as_str())
  }
}

impl From<StepKind> for String {
  fn from(kind: StepKind) -> Self {
    kind.as_str().to_string()
  }
}

impl FromStr for StepKind {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(StepKind::from(s))
  }
}

/// Paso de una secuencia. `step_number` es la posición 1-based dentro de la
/// secuencia y lo reasigna la renumeración tras inserciones y borrados.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
  pub id: Uuid,
  pub sequence_id: Uuid,
  pub step_number: i64,
  pub content: String,
  #[serde(rename = "type")]
  pub kind: StepKind,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_labels_are_kept_verbatim() {
    assert_eq!(StepKind::from("call"), StepKind::Call);
    let custom = StepKind::from("LinkedIn InMail");
    assert_eq!(custom.as_str(), "LinkedIn InMail");
    assert_eq!(serde_json::to_value(&custom).unwrap(), serde_json::json!("LinkedIn InMail"));
  }

  #[test]
  fn default_kind_is_email() {
    assert_eq!(StepKind::default(), StepKind::Email);
    let k: StepKind = serde_json::from_value(serde_json::json!("message")).unwrap();
    assert_eq!(k, StepKind::Message);
  }
}
