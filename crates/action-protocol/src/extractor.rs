// Archivo: extractor.rs
// Propósito: localizar en el texto generado el bloque de acción a ejecutar.
use crate::grammar::DirectiveKind;
use std::ops::Range;

/// Bloque localizado. Referencia el texto original: `matched` incluye los
/// marcadores y `body` es el contenido entre ellos, sin recortar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBlock<'a> {
    pub kind: DirectiveKind,
    pub body: &'a str,
    pub matched: &'a str,
    /// Posición en bytes de `matched` dentro del texto.
    pub span: Range<usize>,
}

/// Busca los tipos de bloque en orden de prioridad y devuelve la primera
/// coincidencia del primer tipo que tenga alguna.
///
/// Un marcador de apertura sin cierre no produce coincidencia para su tipo;
/// la búsqueda continúa con el siguiente. Los bloques de otros tipos presentes
/// en el mismo texto se ignoran.
pub fn extract(text: &str) -> Option<ExtractedBlock<'_>> {
    for kind in DirectiveKind::PRIORITY {
        let Some(caps) = kind.pattern().captures(text) else {
            continue;
        };
        if let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) {
            return Some(ExtractedBlock { kind,
                                         body: body.as_str(),
                                         matched: whole.as_str(),
                                         span: whole.range() });
        }
    }
    None
}
