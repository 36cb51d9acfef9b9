// Archivo: service.rs
// Propósito: punto de entrada del protocolo. Recibe la respuesta cruda del
// generador y devuelve el texto visible junto con la bandera de acción.
use crate::engine::{ActionContext, MutationEngine};
use crate::errors::Result;
use crate::extractor::extract;
use crate::payload::decode;
use crate::rewriter::{strip_span, ProcessedResponse};
use log::{debug, warn};
use outreach_domain::{EventSink, SequenceRepository};
use std::sync::Arc;
use uuid::Uuid;

/// Encadena extracción, decodificación, mutación y reescritura.
///
/// Como mucho se ejecuta una directiva por respuesta. Un cuerpo mal formado
/// no es un error: se registra y el texto vuelve intacto. Sólo los fallos del
/// almacén se propagan, y en ese caso no se emite ningún evento.
pub struct ActionService<R>
    where R: SequenceRepository + ?Sized
{
    engine: MutationEngine<R>,
}

impl<R> ActionService<R> where R: SequenceRepository + ?Sized
{
    pub fn new(repo: Arc<R>, sink: Arc<dyn EventSink>) -> Self {
        Self { engine: MutationEngine::new(repo, sink) }
    }

    pub fn engine(&self) -> &MutationEngine<R> {
        &self.engine
    }

    pub fn process(&self, text: &str, ctx: &ActionContext) -> Result<ProcessedResponse> {
        let Some(block) = extract(text) else {
            return Ok(ProcessedResponse::untouched(text));
        };
        debug!("bloque {} localizado en {:?}", block.kind, block.span);
        let directive = match decode(block.kind, block.body) {
            Ok(d) => d,
            Err(e) => {
                warn!("bloque {} descartado: {}", block.kind, e);
                return Ok(ProcessedResponse::untouched(text));
            }
        };
        let outcome = self.engine.apply(&directive, ctx)?;
        Ok(ProcessedResponse { text: strip_span(text, block.span),
                               action_performed: true,
                               outcome: Some(outcome) })
    }

    /// Atajo sin secuencia explícita: actúa sobre la más reciente del owner.
    pub fn process_for_owner(&self, text: &str, owner_id: Uuid) -> Result<ProcessedResponse> {
        self.process(text, &ActionContext::for_owner(owner_id))
    }
}
