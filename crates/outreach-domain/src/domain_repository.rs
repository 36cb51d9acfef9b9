use crate::{ChatMessage, DomainError, Sequence, SequenceView, Step, StepKind};
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Contrato mínimo de almacenamiento de secuencias y pasos.
///
/// Cada operación es una unidad independiente: el llamador no asume una
/// transacción que abarque varias llamadas. `list_steps` devuelve los pasos
/// ordenados por `step_number` ascendente; ante números repetidos se respeta
/// el orden de inserción del almacén.
pub trait SequenceRepository: Send + Sync {
    /// Crea una secuencia para `owner_id` con la fecha actual.
    fn create_sequence(&self, owner_id: &Uuid, title: &str) -> Result<Sequence, DomainError>;

    /// Recupera una secuencia por id.
    fn get_sequence(&self, id: &Uuid) -> Result<Option<Sequence>, DomainError>;

    /// Secuencia creada más recientemente por el owner, si existe.
    fn most_recent_sequence(&self, owner_id: &Uuid) -> Result<Option<Sequence>, DomainError>;

    /// Secuencias del owner, la más reciente primero.
    fn list_sequences(&self, owner_id: &Uuid) -> Result<Vec<Sequence>, DomainError>;

    /// Cambia el título. `NotFound` si la secuencia no existe.
    fn rename_sequence(&self, id: &Uuid, title: &str) -> Result<Sequence, DomainError>;

    /// Elimina la secuencia y todos sus pasos.
    fn delete_sequence(&self, id: &Uuid) -> Result<(), DomainError>;

    fn list_steps(&self, sequence_id: &Uuid) -> Result<Vec<Step>, DomainError>;

    fn get_step(&self, step_id: &Uuid) -> Result<Option<Step>, DomainError>;

    /// Inserta un paso con el número indicado, sin renumerar.
    fn insert_step(&self,
                   sequence_id: &Uuid,
                   step_number: i64,
                   content: &str,
                   kind: &StepKind)
                   -> Result<Step, DomainError>;

    /// Aplica sólo los campos presentes. Nunca toca `step_number`.
    fn update_step(&self, step_id: &Uuid, content: Option<&str>, kind: Option<&StepKind>) -> Result<Step, DomainError>;

    fn set_step_number(&self, step_id: &Uuid, step_number: i64) -> Result<(), DomainError>;

    fn delete_step(&self, step_id: &Uuid) -> Result<(), DomainError>;

    /// Reasigna los números 1..N siguiendo el orden de `list_steps` y devuelve
    /// los pasos resultantes. Sólo escribe los pasos cuyo número cambia.
    fn renumber_steps(&self, sequence_id: &Uuid) -> Result<Vec<Step>, DomainError> {
        let steps = self.list_steps(sequence_id)?;
        let mut out = Vec::with_capacity(steps.len());
        for (idx, mut step) in steps.into_iter().enumerate() {
            let expected = idx as i64 + 1;
            if step.step_number != expected {
                self.set_step_number(&step.id, expected)?;
                step.step_number = expected;
            }
            out.push(step);
        }
        Ok(out)
    }

    /// Carga la secuencia junto con sus pasos ordenados.
    fn load_view(&self, sequence_id: &Uuid) -> Result<Option<SequenceView>, DomainError> {
        match self.get_sequence(sequence_id)? {
            Some(sequence) => {
                let steps = self.list_steps(sequence_id)?;
                Ok(Some(SequenceView::new(sequence, steps)))
            }
            None => Ok(None),
        }
    }
}

/// Historial de chat por owner, en orden cronológico.
pub trait MessageRepository: Send + Sync {
    fn save_message(&self, message: &ChatMessage) -> Result<(), DomainError>;

    fn list_messages(&self, owner_id: &Uuid) -> Result<Vec<ChatMessage>, DomainError>;

    /// Los `limit` mensajes más recientes, en orden cronológico.
    fn recent_messages(&self, owner_id: &Uuid, limit: usize) -> Result<Vec<ChatMessage>, DomainError> {
        let all = self.list_messages(owner_id)?;
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }

    /// Borra el historial del owner y devuelve cuántos mensajes se eliminaron.
    fn clear_messages(&self, owner_id: &Uuid) -> Result<usize, DomainError>;
}

/// Implementación en memoria para tests y desarrollo.
///
/// Los mapas conservan el orden de inserción (`IndexMap`), que es el criterio
/// de desempate cuando dos pasos comparten número.
pub struct InMemoryOutreachRepository {
    sequences: Arc<Mutex<IndexMap<Uuid, Sequence>>>,
    steps: Arc<Mutex<IndexMap<Uuid, Step>>>,
    messages: Arc<Mutex<Vec<ChatMessage>>>,
}

impl InMemoryOutreachRepository {
    pub fn new() -> Self {
        Self { sequences: Arc::new(Mutex::new(IndexMap::new())),
               steps: Arc::new(Mutex::new(IndexMap::new())),
               messages: Arc::new(Mutex::new(Vec::new())) }
    }

    // Helper to map poisoned mutex errors into DomainError
    fn lock_map<'a, T>(&'a self, m: &'a Mutex<T>, name: &str) -> Result<std::sync::MutexGuard<'a, T>, DomainError> {
        m.lock()
         .map_err(|e| DomainError::StorageError(format!("Mutex '{}' poisoned: {}", name, e)))
    }

    /// Número total de pasos almacenados (todas las secuencias).
    pub fn step_count(&self) -> Result<usize, DomainError> {
        Ok(self.lock_map(&self.steps, "steps")?.len())
    }
}

impl Default for InMemoryOutreachRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceRepository for InMemoryOutreachRepository {
    fn create_sequence(&self, owner_id: &Uuid, title: &str) -> Result<Sequence, DomainError> {
        let sequence = Sequence { id: Uuid::new_v4(),
                                  owner_id: *owner_id,
                                  title: title.to_string(),
                                  created_at: Utc::now() };
        self.lock_map(&self.sequences, "sequences")?.insert(sequence.id, sequence.clone());
        Ok(sequence)
    }

    fn get_sequence(&self, id: &Uuid) -> Result<Option<Sequence>, DomainError> {
        Ok(self.lock_map(&self.sequences, "sequences")?.get(id).cloned())
    }

    fn most_recent_sequence(&self, owner_id: &Uuid) -> Result<Option<Sequence>, DomainError> {
        // max_by_key devuelve el último máximo: a igual fecha gana la última insertada.
        let sequences = self.lock_map(&self.sequences, "sequences")?;
        Ok(sequences.values()
                    .filter(|s| &s.owner_id == owner_id)
                    .max_by_key(|s| s.created_at)
                    .cloned())
    }

    fn list_sequences(&self, owner_id: &Uuid) -> Result<Vec<Sequence>, DomainError> {
        let sequences = self.lock_map(&self.sequences, "sequences")?;
        let mut out: Vec<Sequence> = sequences.values().rev().filter(|s| &s.owner_id == owner_id).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    fn rename_sequence(&self, id: &Uuid, title: &str) -> Result<Sequence, DomainError> {
        let mut sequences = self.lock_map(&self.sequences, "sequences")?;
        let sequence = sequences.get_mut(id)
                                .ok_or_else(|| DomainError::NotFound(format!("secuencia {}", id)))?;
        sequence.title = title.to_string();
        Ok(sequence.clone())
    }

    fn delete_sequence(&self, id: &Uuid) -> Result<(), DomainError> {
        let mut sequences = self.lock_map(&self.sequences, "sequences")?;
        if sequences.shift_remove(id).is_none() {
            return Err(DomainError::NotFound(format!("secuencia {}", id)));
        }
        let mut steps = self.lock_map(&self.steps, "steps")?;
        steps.retain(|_, s| &s.sequence_id != id);
        Ok(())
    }

    fn list_steps(&self, sequence_id: &Uuid) -> Result<Vec<Step>, DomainError> {
        let steps = self.lock_map(&self.steps, "steps")?;
        let mut out: Vec<Step> = steps.values().filter(|s| &s.sequence_id == sequence_id).cloned().collect();
        out.sort_by_key(|s| s.step_number);
        Ok(out)
    }

    fn get_step(&self, step_id: &Uuid) -> Result<Option<Step>, DomainError> {
        Ok(self.lock_map(&self.steps, "steps")?.get(step_id).cloned())
    }

    fn insert_step(&self,
                   sequence_id: &Uuid,
                   step_number: i64,
                   content: &str,
                   kind: &StepKind)
                   -> Result<Step, DomainError> {
        if !self.lock_map(&self.sequences, "sequences")?.contains_key(sequence_id) {
            return Err(DomainError::NotFound(format!("secuencia {}", sequence_id)));
        }
        let step = Step { id: Uuid::new_v4(),
                          sequence_id: *sequence_id,
                          step_number,
                          content: content.to_string(),
                          kind: kind.clone() };
        self.lock_map(&self.steps, "steps")?.insert(step.id, step.clone());
        Ok(step)
    }

    fn update_step(&self, step_id: &Uuid, content: Option<&str>, kind: Option<&StepKind>) -> Result<Step, DomainError> {
        let mut steps = self.lock_map(&self.steps, "steps")?;
        let step = steps.get_mut(step_id)
                        .ok_or_else(|| DomainError::NotFound(format!("paso {}", step_id)))?;
        if let Some(c) = content {
            step.content = c.to_string();
        }
        if let Some(k) = kind {
            step.kind = k.clone();
        }
        Ok(step.clone())
    }

    fn set_step_number(&self, step_id: &Uuid, step_number: i64) -> Result<(), DomainError> {
        let mut steps = self.lock_map(&self.steps, "steps")?;
        let step = steps.get_mut(step_id)
                        .ok_or_else(|| DomainError::NotFound(format!("paso {}", step_id)))?;
        step.step_number = step_number;
        Ok(())
    }

    fn delete_step(&self, step_id: &Uuid) -> Result<(), DomainError> {
        let mut steps = self.lock_map(&self.steps, "steps")?;
        steps.shift_remove(step_id)
             .map(|_| ())
             .ok_or_else(|| DomainError::NotFound(format!("paso {}", step_id)))
    }
}

impl MessageRepository for InMemoryOutreachRepository {
    fn save_message(&self, message: &ChatMessage) -> Result<(), DomainError> {
        self.lock_map(&self.messages, "messages")?.push(message.clone());
        Ok(())
    }

    fn list_messages(&self, owner_id: &Uuid) -> Result<Vec<ChatMessage>, DomainError> {
        let messages = self.lock_map(&self.messages, "messages")?;
        let mut out: Vec<ChatMessage> = messages.iter().filter(|m| &m.owner_id == owner_id).cloned().collect();
        out.sort_by_key(|m| m.timestamp);
        Ok(out)
    }

    fn clear_messages(&self, owner_id: &Uuid) -> Result<usize, DomainError> {
        let mut messages = self.lock_map(&self.messages, "messages")?;
        let before = messages.len();
        messages.retain(|m| &m.owner_id != owner_id);
        Ok(before - messages.len())
    }
}
