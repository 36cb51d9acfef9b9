//! Crate `action-protocol`: protocolo de bloques de acción
//!
//! El generador de texto intercala en sus respuestas bloques delimitados por
//! marcadores literales que piden modificar la secuencia de contacto del
//! usuario:
//!
//! ```text
//! ---ACTION: ADD_STEP---
//! {"content": "Hola", "type": "email", "step_number": 2}
//! ---END ACTION---
//! ```
//!
//! Diseño resumido:
//! - `grammar`: tipos de bloque, marcadores y orden de prioridad.
//! - `extractor`: localiza el primer bloque del tipo de mayor prioridad.
//! - `payload`: decodifica el cuerpo JSON con valores por defecto.
//! - `engine`: aplica la directiva sobre `SequenceRepository` y mantiene la
//!   numeración contigua 1..N.
//! - `rewriter`: elimina el bloque del texto visible.
//! - `service`: `ActionService::process`, que encadena todo lo anterior.
//! - `sequences`: operaciones directas sobre secuencias (equivalentes a las
//!   rutas REST) que respetan el mismo invariante de numeración.
//!
//! Ejemplo rápido:
//! ```rust
//! use action_protocol::{ActionContext, ActionService};
//! use outreach_domain::{InMemoryOutreachRepository, NullSink};
//! use std::sync::Arc;
//! let repo = Arc::new(InMemoryOutreachRepository::new());
//! let service = ActionService::new(repo, Arc::new(NullSink));
//! let ctx = ActionContext::for_owner(uuid::Uuid::new_v4());
//! let out = service.process("Hola!", &ctx).unwrap();
//! assert_eq!(out.text, "Hola!");
//! assert!(!out.action_performed);
//! ```
pub mod engine;
pub mod errors;
pub mod extractor;
pub mod grammar;
pub mod payload;
pub mod rewriter;
pub mod sequences;
pub mod service;

pub use engine::{ActionContext, MutationEngine, MutationOutcome};
pub use errors::{ActionError, DecodeError, Result};
pub use extractor::{extract, ExtractedBlock};
pub use grammar::{DirectiveKind, END_MARKER};
pub use payload::{decode, parse_generated_steps, CreateSequencePayload, DeleteStepPayload, Directive, StepRecord,
                  UpdateStepPayload};
pub use rewriter::{strip_span, ProcessedResponse};
pub use sequences::{NewStep, SequenceService, StepPatch};
pub use service::ActionService;
