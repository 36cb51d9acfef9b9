// Archivo: engine.rs
// Propósito: aplicar una `Directive` decodificada sobre el almacén de
// secuencias manteniendo la numeración contigua de pasos.
use crate::errors::Result;
use crate::payload::{CreateSequencePayload, DeleteStepPayload, Directive, StepRecord, UpdateStepPayload};
use log::{info, warn};
use outreach_domain::{EventSink, Sequence, SequenceRepository, SequenceView, Step, WorkspaceEvent,
                      DEFAULT_SEQUENCE_TITLE};
use std::sync::Arc;
use uuid::Uuid;

/// Contexto de una petición: a quién pertenece y, opcionalmente, sobre qué
/// secuencia actúa.
///
/// Con `sequence_id` el destino es explícito. Sin él se usa la secuencia más
/// reciente del owner, que es ambiguo si llegan peticiones concurrentes del
/// mismo owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContext {
    pub owner_id: Uuid,
    pub sequence_id: Option<Uuid>,
}

impl ActionContext {
    pub fn for_owner(owner_id: Uuid) -> Self {
        Self { owner_id, sequence_id: None }
    }

    pub fn with_sequence(mut self, sequence_id: Uuid) -> Self {
        self.sequence_id = Some(sequence_id);
        self
    }
}

/// Resultado de aplicar una directiva.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    SequenceCreated(SequenceView),
    StepAdded { step: Step, sequence: SequenceView },
    StepUpdated { step: Step, sequence: SequenceView },
    StepDeleted { step: Step, sequence: SequenceView },
    /// UPDATE/DELETE sin secuencia sobre la que actuar.
    NoCurrentSequence,
    /// Ningún paso tiene el número pedido (o no se envió número).
    StepNotFound { step_number: Option<i64> },
    /// El paso existe pero el bloque no traía campos que aplicar.
    NothingToApply { step: Step },
}

impl MutationOutcome {
    /// Vista de la secuencia modificada, sólo si cambió el estado almacenado.
    pub fn sequence(&self) -> Option<&SequenceView> {
        match self {
            MutationOutcome::SequenceCreated(view) => Some(view),
            MutationOutcome::StepAdded { sequence, .. }
            | MutationOutcome::StepUpdated { sequence, .. }
            | MutationOutcome::StepDeleted { sequence, .. } => Some(sequence),
            MutationOutcome::NoCurrentSequence
            | MutationOutcome::StepNotFound { .. }
            | MutationOutcome::NothingToApply { .. } => None,
        }
    }

    pub fn changed_state(&self) -> bool {
        self.sequence().is_some()
    }
}

/// Motor de mutaciones. No guarda estado propio: todo pasa por el
/// repositorio inyectado. Tras cada cambio efectivo emite la vista completa
/// de la secuencia por el `EventSink`; si alguna llamada al almacén falla no
/// se emite nada.
pub struct MutationEngine<R>
    where R: SequenceRepository + ?Sized
{
    repo: Arc<R>,
    sink: Arc<dyn EventSink>,
}

impl<R> MutationEngine<R> where R: SequenceRepository + ?Sized
{
    pub fn new(repo: Arc<R>, sink: Arc<dyn EventSink>) -> Self {
        Self { repo, sink }
    }

    pub fn repo(&self) -> &Arc<R> {
        &self.repo
    }

    /// Aplica la directiva en el contexto dado.
    pub fn apply(&self, directive: &Directive, ctx: &ActionContext) -> Result<MutationOutcome> {
        let outcome = match directive {
            Directive::CreateSequence(p) => self.create_sequence(p, ctx)?,
            Directive::AddStep(p) => self.add_step(p, ctx)?,
            Directive::UpdateStep(p) => self.update_step(p, ctx)?,
            Directive::DeleteStep(p) => self.delete_step(p, ctx)?,
        };
        if let Some(view) = outcome.sequence() {
            self.sink.emit(WorkspaceEvent::SequenceUpdate(view.clone()));
        }
        Ok(outcome)
    }

    /// Secuencia sobre la que actúan ADD/UPDATE/DELETE.
    pub fn current_sequence(&self, ctx: &ActionContext) -> Result<Option<Sequence>> {
        match ctx.sequence_id {
            Some(id) => Ok(self.repo.get_sequence(&id)?.filter(|s| s.owner_id == ctx.owner_id)),
            None => Ok(self.repo.most_recent_sequence(&ctx.owner_id)?),
        }
    }

    /// Inserta la secuencia y sus pasos con los números recibidos; aquí no
    /// se renumera.
    fn create_sequence(&self, payload: &CreateSequencePayload, ctx: &ActionContext) -> Result<MutationOutcome> {
        let sequence = self.repo.create_sequence(&ctx.owner_id, &payload.title)?;
        for record in &payload.steps {
            self.repo.insert_step(&sequence.id, record.step_number, &record.content, &record.kind)?;
        }
        info!("secuencia {} creada con {} pasos", sequence.id, payload.steps.len());
        let steps = self.repo.list_steps(&sequence.id)?;
        Ok(MutationOutcome::SequenceCreated(SequenceView::new(sequence, steps)))
    }

    fn add_step(&self, record: &StepRecord, ctx: &ActionContext) -> Result<MutationOutcome> {
        let sequence = match self.current_sequence(ctx)? {
            Some(s) => s,
            None => {
                info!("owner {} sin secuencia actual; se crea '{}'", ctx.owner_id, DEFAULT_SEQUENCE_TITLE);
                self.repo.create_sequence(&ctx.owner_id, DEFAULT_SEQUENCE_TITLE)?
            }
        };
        let inserted = self.repo.insert_step(&sequence.id, record.step_number, &record.content, &record.kind)?;
        let steps = self.repo.renumber_steps(&sequence.id)?;
        let step = steps.iter().find(|s| s.id == inserted.id).cloned().unwrap_or(inserted);
        info!("paso añadido a {} en la posición {}", sequence.id, step.step_number);
        Ok(MutationOutcome::StepAdded { step, sequence: SequenceView::new(sequence, steps) })
    }

    fn update_step(&self, payload: &UpdateStepPayload, ctx: &ActionContext) -> Result<MutationOutcome> {
        let Some(sequence) = self.current_sequence(ctx)? else {
            warn!("UPDATE_STEP ignorado: owner {} sin secuencia actual", ctx.owner_id);
            return Ok(MutationOutcome::NoCurrentSequence);
        };
        let Some(target) = self.find_step(&sequence, payload.step_number)? else {
            warn!("UPDATE_STEP ignorado: paso {:?} no existe en {}", payload.step_number, sequence.id);
            return Ok(MutationOutcome::StepNotFound { step_number: payload.step_number });
        };
        if payload.content.is_none() && payload.kind.is_none() {
            return Ok(MutationOutcome::NothingToApply { step: target });
        }
        let step = self.repo.update_step(&target.id, payload.content.as_deref(), payload.kind.as_ref())?;
        info!("paso {} de {} actualizado", step.step_number, sequence.id);
        let steps = self.repo.list_steps(&sequence.id)?;
        Ok(MutationOutcome::StepUpdated { step, sequence: SequenceView::new(sequence, steps) })
    }

    fn delete_step(&self, payload: &DeleteStepPayload, ctx: &ActionContext) -> Result<MutationOutcome> {
        let Some(sequence) = self.current_sequence(ctx)? else {
            warn!("DELETE_STEP ignorado: owner {} sin secuencia actual", ctx.owner_id);
            return Ok(MutationOutcome::NoCurrentSequence);
        };
        let Some(target) = self.find_step(&sequence, payload.step_number)? else {
            warn!("DELETE_STEP ignorado: paso {:?} no existe en {}", payload.step_number, sequence.id);
            return Ok(MutationOutcome::StepNotFound { step_number: payload.step_number });
        };
        self.repo.delete_step(&target.id)?;
        let steps = self.repo.renumber_steps(&sequence.id)?;
        info!("paso {} eliminado de {}; quedan {}", target.step_number, sequence.id, steps.len());
        Ok(MutationOutcome::StepDeleted { step: target, sequence: SequenceView::new(sequence, steps) })
    }

    /// Primer paso (en orden del almacén) con ese número.
    fn find_step(&self, sequence: &Sequence, step_number: Option<i64>) -> Result<Option<Step>> {
        let Some(number) = step_number else {
            return Ok(None);
        };
        Ok(self.repo
               .list_steps(&sequence.id)?
               .into_iter()
               .find(|s| s.step_number == number))
    }
}
