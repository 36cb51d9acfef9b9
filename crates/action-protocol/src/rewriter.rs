// Archivo: rewriter.rs
// Propósito: texto visible para el usuario tras procesar un bloque.
use crate::engine::MutationOutcome;
use std::ops::Range;

/// Quita `span` del texto y recorta espacios en ambos extremos del
/// resultado. Sólo desaparece el bloque indicado; cualquier otro bloque del
/// texto se conserva literal.
pub fn strip_span(text: &str, span: Range<usize>) -> String {
    let mut out = String::with_capacity(text.len().saturating_sub(span.len()));
    out.push_str(&text[..span.start]);
    out.push_str(&text[span.end..]);
    out.trim().to_string()
}

/// Resultado de `ActionService::process`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResponse {
    /// Texto a mostrar. Si no hubo bloque válido es la entrada sin tocar.
    pub text: String,
    /// `true` si se localizó y decodificó un bloque, aunque su destino no
    /// existiera.
    pub action_performed: bool,
    pub outcome: Option<MutationOutcome>,
}

impl ProcessedResponse {
    pub fn untouched(text: &str) -> Self {
        Self { text: text.to_string(),
               action_performed: false,
               outcome: None }
    }

    pub fn changed_state(&self) -> bool {
        self.outcome.as_ref().is_some_and(MutationOutcome::changed_state)
    }
}
