// Archivo: payload.rs
// Propósito: decodificar el cuerpo de un bloque en una `Directive` tipada.
//
// El generador no es fiable: no se asume presencia ni tipo de ningún campo.
// Los campos ausentes toman su valor por defecto; un campo presente con un
// tipo incorrecto invalida el bloque entero.
use crate::errors::DecodeError;
use crate::grammar::DirectiveKind;
use once_cell::sync::Lazy;
use outreach_domain::{StepKind, DEFAULT_SEQUENCE_TITLE};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

fn default_title() -> String {
    DEFAULT_SEQUENCE_TITLE.to_string()
}

fn default_step_number() -> i64 {
    1
}

/// Registro de paso usado por CREATE_SEQUENCE (cada elemento de `steps`) y
/// por ADD_STEP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepRecord {
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: StepKind,
    /// No se autonumera: se usa tal cual al insertar.
    #[serde(default = "default_step_number")]
    pub step_number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateSequencePayload {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

/// Sólo los campos presentes se aplican; `step_number` selecciona el paso.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateStepPayload {
    #[serde(default)]
    pub step_number: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<StepKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteStepPayload {
    #[serde(default)]
    pub step_number: Option<i64>,
}

/// Directiva decodificada. Existe sólo durante el procesamiento de una
/// respuesta; nunca se persiste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    CreateSequence(CreateSequencePayload),
    AddStep(StepRecord),
    UpdateStep(UpdateStepPayload),
    DeleteStep(DeleteStepPayload),
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::CreateSequence(_) => DirectiveKind::CreateSequence,
            Directive::AddStep(_) => DirectiveKind::AddStep,
            Directive::UpdateStep(_) => DirectiveKind::UpdateStep,
            Directive::DeleteStep(_) => DirectiveKind::DeleteStep,
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "booleano",
        JsonValue::Number(_) => "número",
        JsonValue::String(_) => "cadena",
        JsonValue::Array(_) => "lista",
        JsonValue::Object(_) => "objeto",
    }
}

fn shaped<T: DeserializeOwned>(value: JsonValue) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::Shape(e.to_string()))
}

/// Decodifica el cuerpo (se recorta antes de parsear) según `kind`.
///
/// El cuerpo debe ser un objeto JSON; cualquier otra cosa es un error.
pub fn decode(kind: DirectiveKind, body: &str) -> Result<Directive, DecodeError> {
    let value: JsonValue = serde_json::from_str(body.trim()).map_err(DecodeError::Syntax)?;
    if !value.is_object() {
        return Err(DecodeError::Shape(format!("se esperaba un objeto JSON en {}, se recibió {}",
                                              kind,
                                              json_type_name(&value))));
    }
    let directive = match kind {
        DirectiveKind::CreateSequence => Directive::CreateSequence(shaped(value)?),
        DirectiveKind::AddStep => Directive::AddStep(shaped(value)?),
        DirectiveKind::UpdateStep => Directive::UpdateStep(shaped(value)?),
        DirectiveKind::DeleteStep => Directive::DeleteStep(shaped(value)?),
    };
    Ok(directive)
}

static FENCED_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*(\[[\s\S]*?\])\s*```").expect("patrón de bloque json inválido"));
static WIDE_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\[[\s\S]*\])").expect("patrón de lista inválido"));
static BARE_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\[[\s\S]*?\])").expect("patrón de lista inválido"));
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//[^\n]*\n").expect("patrón de comentario inválido"));

/// Extrae la lista de pasos de una respuesta de generación de secuencia
/// completa. Candidatos, en orden: el texto entero, un bloque
/// ```json [...]```, el tramo entre el primer `[` y el último `]` y la
/// primera lista `[...]`. Cada candidato se reintenta una vez quitando
/// comentarios `//` de fin de línea. Los pasos sin `type` toman `email` y los
/// números de paso se ignoran (el llamador numera 1..N).
pub fn parse_generated_steps(response: &str) -> Result<Vec<StepRecord>, DecodeError> {
    let mut candidates = vec![response.trim()];
    for pattern in [&FENCED_ARRAY, &WIDE_ARRAY, &BARE_ARRAY] {
        if let Some(m) = pattern.captures(response).and_then(|c| c.get(1)) {
            candidates.push(m.as_str().trim());
        }
    }
    let mut first_error = None;
    for candidate in candidates {
        match parse_lenient(candidate) {
            Ok(value) => {
                if !value.is_array() {
                    return Err(DecodeError::Shape(format!("se esperaba una lista de pasos, se recibió {}",
                                                          json_type_name(&value))));
                }
                return shaped(value);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(DecodeError::Syntax(e)),
        None => Err(DecodeError::Shape("respuesta vacía".into())),
    }
}

fn parse_lenient(candidate: &str) -> Result<JsonValue, serde_json::Error> {
    serde_json::from_str(candidate).or_else(|first| {
                                       let cleaned =
                                           LINE_COMMENT.replace_all(&format!("{}\n", candidate), "\n").into_owned();
                                       serde_json::from_str(cleaned.trim()).map_err(|_| first)
                                   })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sequence_defaults() {
        let d = decode(DirectiveKind::CreateSequence, "  {}  ").unwrap();
        assert_eq!(d,
                   Directive::CreateSequence(CreateSequencePayload { title: "New Sequence".into(), steps: vec![] }));

        let d = decode(DirectiveKind::CreateSequence, r#"{"title":"X","steps":[{},{"content":"b","step_number":7}]}"#).unwrap();
        let Directive::CreateSequence(p) = d else { panic!("kind") };
        assert_eq!(p.title, "X");
        assert_eq!(p.steps[0], StepRecord { content: String::new(), kind: StepKind::Email, step_number: 1 });
        assert_eq!(p.steps[1].step_number, 7);
        assert_eq!(p.steps[1].content, "b");
    }

    #[test]
    fn update_keeps_absent_fields_absent() {
        let d = decode(DirectiveKind::UpdateStep, r#"{"step_number": 1, "content": "New text"}"#).unwrap();
        assert_eq!(d,
                   Directive::UpdateStep(UpdateStepPayload { step_number: Some(1),
                                                             content: Some("New text".into()),
                                                             kind: None }));
        let d = decode(DirectiveKind::DeleteStep, r#"{"reason": "dup"}"#).unwrap();
        assert_eq!(d, Directive::DeleteStep(DeleteStepPayload { step_number: None }));
    }

    #[test]
    fn truncated_body_is_a_syntax_error() {
        let err = decode(DirectiveKind::CreateSequence, r#"{"title": "X""#).unwrap_err();
        assert!(matches!(err, DecodeError::Syntax(_)));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(matches!(decode(DirectiveKind::AddStep, "[1, 2]"), Err(DecodeError::Shape(_))));
        assert!(matches!(decode(DirectiveKind::AddStep, r#""texto""#), Err(DecodeError::Shape(_))));
        assert!(matches!(decode(DirectiveKind::AddStep, r#"{"step_number": "dos"}"#), Err(DecodeError::Shape(_))));
        assert!(matches!(decode(DirectiveKind::CreateSequence, r#"{"steps": {"content": "x"}}"#),
                         Err(DecodeError::Shape(_))));
        assert!(matches!(decode(DirectiveKind::CreateSequence, r#"{"steps": [3]}"#), Err(DecodeError::Shape(_))));
    }

    #[test]
    fn custom_step_type_survives_decoding() {
        let d = decode(DirectiveKind::AddStep, r#"{"content":"x","type":"linkedin"}"#).unwrap();
        let Directive::AddStep(rec) = d else { panic!("kind") };
        assert_eq!(rec.kind, StepKind::Custom("linkedin".into()));
        assert_eq!(rec.step_number, 1);
    }

    #[test]
    fn generated_steps_from_fenced_block() {
        let response = "Aquí va:\n```json\n[\n {\"type\": \"email\", \"content\": \"Hola\"},\n {\"type\": \"call\", \"content\": \"Guion\"}\n]\n```\nFin";
        let steps = parse_generated_steps(response).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].kind, StepKind::Call);
    }

    #[test]
    fn generated_steps_tolerate_line_comments() {
        let response = "[\n {\"type\": \"message\", \"content\": \"a\"} // primero\n]";
        let steps = parse_generated_steps(response).unwrap();
        assert_eq!(steps[0].content, "a");

        let with_url = r#"[{"type": "email", "content": "visita https://acme.dev"}]"#;
        assert_eq!(parse_generated_steps(with_url).unwrap()[0].content, "visita https://acme.dev");
    }

    #[test]
    fn generated_steps_keep_bracket_placeholders() {
        let bare = r#"[{"type": "email", "content": "Hi [Candidate Name], we are hiring"}, {"type": "call", "content": "x"}]"#;
        let steps = parse_generated_steps(bare).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].content, "Hi [Candidate Name], we are hiring");

        let wrapped = format!("Aquí tienes la secuencia:\n{}\nSuerte.", bare);
        let steps = parse_generated_steps(&wrapped).unwrap();
        assert_eq!(steps[1].kind, StepKind::Call);

        let fenced = "```json\n[{\"type\": \"email\", \"content\": \"[Email content]\"}]\n```";
        assert_eq!(parse_generated_steps(fenced).unwrap()[0].content, "[Email content]");
    }

    #[test]
    fn generated_steps_reject_objects() {
        assert!(parse_generated_steps(r#"{"type": "email"}"#).is_err());
        assert!(parse_generated_steps("no hay json").is_err());
    }
}
