// Utilidades compartidas por las pruebas de integración.
#![allow(dead_code)]

use outreach_domain::{DomainError, InMemoryOutreachRepository, Sequence, SequenceRepository, Step, StepKind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

/// Repositorio en memoria que cuenta escrituras y puede fallar a demanda.
#[derive(Default)]
pub struct SpyRepository {
    pub inner: InMemoryOutreachRepository,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_renumber: AtomicBool,
}

impl SpyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Todas las escrituras posteriores fallan.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Sólo falla `set_step_number` (la inserción previa sí se aplica).
    pub fn fail_renumber(&self) {
        self.fail_renumber.store(true, Ordering::SeqCst);
    }

    fn write(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::StorageError("escritura rechazada".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn numbers(&self, sequence_id: &Uuid) -> Vec<i64> {
        self.inner.list_steps(sequence_id).unwrap().iter().map(|s| s.step_number).collect()
    }

    pub fn contents(&self, sequence_id: &Uuid) -> Vec<String> {
        self.inner.list_steps(sequence_id).unwrap().into_iter().map(|s| s.content).collect()
    }
}

impl SequenceRepository for SpyRepository {
    fn create_sequence(&self, owner_id: &Uuid, title: &str) -> Result<Sequence, DomainError> {
        self.write()?;
        self.inner.create_sequence(owner_id, title)
    }

    fn get_sequence(&self, id: &Uuid) -> Result<Option<Sequence>, DomainError> {
        self.inner.get_sequence(id)
    }

    fn most_recent_sequence(&self, owner_id: &Uuid) -> Result<Option<Sequence>, DomainError> {
        self.inner.most_recent_sequence(owner_id)
    }

    fn list_sequences(&self, owner_id: &Uuid) -> Result<Vec<Sequence>, DomainError> {
        self.inner.list_sequences(owner_id)
    }

    fn rename_sequence(&self, id: &Uuid, title: &str) -> Result<Sequence, DomainError> {
        self.write()?;
        self.inner.rename_sequence(id, title)
    }

    fn delete_sequence(&self, id: &Uuid) -> Result<(), DomainError> {
        self.write()?;
        self.inner.delete_sequence(id)
    }

    fn list_steps(&self, sequence_id: &Uuid) -> Result<Vec<Step>, DomainError> {
        self.inner.list_steps(sequence_id)
    }

    fn get_step(&self, step_id: &Uuid) -> Result<Option<Step>, DomainError> {
        self.inner.get_step(step_id)
    }

    fn insert_step(&self,
                   sequence_id: &Uuid,
                   step_number: i64,
                   content: &str,
                   kind: &StepKind)
                   -> Result<Step, DomainError> {
        self.write()?;
        self.inner.insert_step(sequence_id, step_number, content, kind)
    }

    fn update_step(&self, step_id: &Uuid, content: Option<&str>, kind: Option<&StepKind>) -> Result<Step, DomainError> {
        self.write()?;
        self.inner.update_step(step_id, content, kind)
    }

    fn set_step_number(&self, step_id: &Uuid, step_number: i64) -> Result<(), DomainError> {
        if self.fail_renumber.load(Ordering::SeqCst) {
            return Err(DomainError::StorageError("renumeración rechazada".into()));
        }
        self.write()?;
        self.inner.set_step_number(step_id, step_number)
    }

    fn delete_step(&self, step_id: &Uuid) -> Result<(), DomainError> {
        self.write()?;
        self.inner.delete_step(step_id)
    }
}
