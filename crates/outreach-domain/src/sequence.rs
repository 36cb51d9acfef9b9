// sequence.rs
use crate::Step;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Título usado cuando el generador no envía uno o cuando una secuencia se
/// crea implícitamente al añadir un paso.
pub const DEFAULT_SEQUENCE_TITLE: &str = "New Sequence";

/// Secuencia de contacto perteneciente a un usuario (owner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
  pub id: Uuid,
  #[serde(rename = "user_id")]
  pub owner_id: Uuid,
  pub title: String,
  pub created_at: DateTime<Utc>,
}

/// Representación completa de una secuencia con sus pasos ordenados. Es lo
/// que se difunde a los observadores tras cada mutación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceView {
  #[serde(flatten)]
  pub sequence: Sequence,
  pub steps: Vec<Step>,
}

impl SequenceView {
  /// Construye la vista ordenando los pasos por `step_number` (orden estable).
  pub fn new(sequence: Sequence, mut steps: Vec<Step>) -> Self {
    steps.sort_by_key(|s| s.step_number);
    Self { sequence, steps }
  }

  pub fn id(&self) -> Uuid {
    self.sequence.id
  }

  pub fn step_numbers(&self) -> Vec<i64> {
    self.steps.iter().map(|s| s.step_number).collect()
  }

  /// true si los números de paso forman exactamente 1..N.
  pub fn is_contiguous(&self) -> bool {
    self.steps.iter().enumerate().all(|(i, s)| s.step_number == i as i64 + 1)
  }
}
