// Archivo: sequences.rs
// Propósito: operaciones directas sobre secuencias y pasos (las que un
// editor invoca sin pasar por el generador). Todas comprueban el owner y
// dejan los pasos numerados 1..N.
use crate::payload::StepRecord;
use log::{error, info};
use outreach_domain::{DomainError, EventSink, Sequence, SequenceRepository, SequenceView, Step, StepKind,
                      WorkspaceEvent};
use std::sync::Arc;
use uuid::Uuid;

/// Paso nuevo creado desde el editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStep {
    pub content: String,
    /// `None` => `email`.
    pub kind: Option<StepKind>,
    /// Posición deseada; `None` => al final.
    pub step_number: Option<i64>,
}

impl NewStep {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(),
               kind: None,
               step_number: None }
    }

    pub fn with_kind(mut self, kind: StepKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn at(mut self, step_number: i64) -> Self {
        self.step_number = Some(step_number);
        self
    }
}

/// Cambios parciales sobre un paso existente.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepPatch {
    pub content: Option<String>,
    pub kind: Option<StepKind>,
    /// Nueva posición dentro de la secuencia.
    pub step_number: Option<i64>,
}

impl StepPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.kind.is_none() && self.step_number.is_none()
    }
}

pub struct SequenceService<R>
    where R: SequenceRepository + ?Sized
{
    repo: Arc<R>,
    sink: Arc<dyn EventSink>,
}

impl<R> SequenceService<R> where R: SequenceRepository + ?Sized
{
    pub fn new(repo: Arc<R>, sink: Arc<dyn EventSink>) -> Self {
        Self { repo, sink }
    }

    /// Secuencias del owner, la más reciente primero.
    pub fn list_sequences(&self, owner_id: &Uuid) -> Result<Vec<Sequence>, DomainError> {
        self.repo.list_sequences(owner_id)
    }

    pub fn get_sequence(&self, owner_id: &Uuid, sequence_id: &Uuid) -> Result<SequenceView, DomainError> {
        let sequence = self.owned(owner_id, sequence_id)?;
        let steps = self.repo.list_steps(&sequence.id)?;
        Ok(SequenceView::new(sequence, steps))
    }

    pub fn create_sequence(&self, owner_id: &Uuid, title: &str) -> Result<SequenceView, DomainError> {
        let title = required_title(title)?;
        let sequence = self.repo.create_sequence(owner_id, title)?;
        info!("secuencia {} creada para {}", sequence.id, owner_id);
        self.publish(SequenceView::new(sequence, Vec::new()))
    }

    pub fn rename_sequence(&self, owner_id: &Uuid, sequence_id: &Uuid, title: &str) -> Result<SequenceView, DomainError> {
        let title = required_title(title)?;
        self.owned(owner_id, sequence_id)?;
        let sequence = self.repo.rename_sequence(sequence_id, title)?;
        let steps = self.repo.list_steps(sequence_id)?;
        self.publish(SequenceView::new(sequence, steps))
    }

    /// Borra la secuencia con todos sus pasos. No emite evento.
    pub fn delete_sequence(&self, owner_id: &Uuid, sequence_id: &Uuid) -> Result<(), DomainError> {
        self.owned(owner_id, sequence_id)?;
        self.repo.delete_sequence(sequence_id)?;
        info!("secuencia {} eliminada", sequence_id);
        Ok(())
    }

    pub fn list_steps(&self, owner_id: &Uuid, sequence_id: &Uuid) -> Result<Vec<Step>, DomainError> {
        self.owned(owner_id, sequence_id)?;
        self.repo.list_steps(sequence_id)
    }

    /// Añade un paso al final o, con `step_number`, en esa posición.
    pub fn add_step(&self, owner_id: &Uuid, sequence_id: &Uuid, new_step: NewStep) -> Result<Step, DomainError> {
        let sequence = self.owned(owner_id, sequence_id)?;
        // `place` renumera 1..N, basta con la posición tras el último.
        let next = self.repo.list_steps(sequence_id)?.len() as i64 + 1;
        let kind = new_step.kind.unwrap_or_default();
        let inserted = self.repo.insert_step(sequence_id, next, &new_step.content, &kind)?;
        let position = new_step.step_number.unwrap_or(next);
        let steps = self.place(sequence_id, &inserted.id, position)?;
        let step = find(&steps, &inserted.id)?;
        self.publish(SequenceView::new(sequence, steps))?;
        Ok(step)
    }

    /// Aplica el parche. Un cambio de `step_number` mueve el paso a esa
    /// posición y desplaza los demás.
    pub fn update_step(&self, owner_id: &Uuid, step_id: &Uuid, patch: StepPatch) -> Result<Step, DomainError> {
        let (sequence, current) = self.owned_step(owner_id, step_id)?;
        if patch.content.is_some() || patch.kind.is_some() {
            self.repo.update_step(step_id, patch.content.as_deref(), patch.kind.as_ref())?;
        }
        let position = patch.step_number.unwrap_or(current.step_number);
        let steps = self.place(&sequence.id, step_id, position)?;
        let step = find(&steps, step_id)?;
        self.publish(SequenceView::new(sequence, steps))?;
        Ok(step)
    }

    pub fn delete_step(&self, owner_id: &Uuid, step_id: &Uuid) -> Result<SequenceView, DomainError> {
        let (sequence, _) = self.owned_step(owner_id, step_id)?;
        self.repo.delete_step(step_id)?;
        let steps = self.repo.renumber_steps(&sequence.id)?;
        self.publish(SequenceView::new(sequence, steps))
    }

    /// Crea una secuencia "<puesto> at <empresa>" con los pasos generados,
    /// numerados 1..N en el orden recibido.
    pub fn generate_sequence(&self,
                             owner_id: &Uuid,
                             job_title: &str,
                             company_name: &str,
                             records: &[StepRecord])
                             -> Result<SequenceView, DomainError> {
        if job_title.trim().is_empty() || company_name.trim().is_empty() {
            return Err(DomainError::ValidationError("Job title and company name are required".into()));
        }
        if records.is_empty() {
            error!("generación sin pasos para '{}' en '{}'", job_title, company_name);
            return Err(DomainError::ValidationError("Failed to generate sequence".into()));
        }
        let title = format!("{} at {}", job_title, company_name);
        let sequence = self.repo.create_sequence(owner_id, &title)?;
        for (idx, record) in records.iter().enumerate() {
            self.repo.insert_step(&sequence.id, idx as i64 + 1, &record.content, &record.kind)?;
        }
        info!("secuencia generada '{}' con {} pasos", title, records.len());
        let steps = self.repo.list_steps(&sequence.id)?;
        self.publish(SequenceView::new(sequence, steps))
    }

    fn publish(&self, view: SequenceView) -> Result<SequenceView, DomainError> {
        self.sink.emit(WorkspaceEvent::SequenceUpdate(view.clone()));
        Ok(view)
    }

    fn owned(&self, owner_id: &Uuid, sequence_id: &Uuid) -> Result<Sequence, DomainError> {
        self.repo
            .get_sequence(sequence_id)?
            .filter(|s| &s.owner_id == owner_id)
            .ok_or_else(|| DomainError::NotFound(format!("Sequence {} not found", sequence_id)))
    }

    fn owned_step(&self, owner_id: &Uuid, step_id: &Uuid) -> Result<(Sequence, Step), DomainError> {
        let step = self.repo
                       .get_step(step_id)?
                       .ok_or_else(|| DomainError::NotFound(format!("Step {} not found", step_id)))?;
        let sequence = self.owned(owner_id, &step.sequence_id)?;
        Ok((sequence, step))
    }

    /// Coloca `step_id` en `position` (acotada a 1..=N) y numera el resto
    /// 1..N conservando su orden relativo.
    fn place(&self, sequence_id: &Uuid, step_id: &Uuid, position: i64) -> Result<Vec<Step>, DomainError> {
        let mut steps = self.repo.list_steps(sequence_id)?;
        let Some(idx) = steps.iter().position(|s| &s.id == step_id) else {
            return self.repo.renumber_steps(sequence_id);
        };
        let moved = steps.remove(idx);
        let slot = (position.max(1) as usize - 1).min(steps.len());
        steps.insert(slot, moved);
        for (i, step) in steps.iter_mut().enumerate() {
            let expected = i as i64 + 1;
            if step.step_number != expected {
                self.repo.set_step_number(&step.id, expected)?;
                step.step_number = expected;
            }
        }
        Ok(steps)
    }
}

fn required_title(title: &str) -> Result<&str, DomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::ValidationError("Sequence title is required".into()));
    }
    Ok(trimmed)
}

fn find(steps: &[Step], step_id: &Uuid) -> Result<Step, DomainError> {
    steps.iter()
         .find(|s| &s.id == step_id)
         .cloned()
         .ok_or_else(|| DomainError::NotFound(format!("Step {} not found", step_id)))
}
