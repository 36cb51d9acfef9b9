// Archivo: grammar.rs
// Propósito: marcadores literales de los bloques de acción y el orden fijo
// en que se buscan.
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Marcador de cierre común a todos los bloques.
pub const END_MARKER: &str = "---END ACTION---";

/// Tipos de bloque reconocidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    CreateSequence,
    AddStep,
    UpdateStep,
    DeleteStep,
}

impl DirectiveKind {
    /// Orden de búsqueda. Sólo se actúa sobre el primer tipo con coincidencia.
    pub const PRIORITY: [DirectiveKind; 4] = [DirectiveKind::CreateSequence,
                                              DirectiveKind::AddStep,
                                              DirectiveKind::UpdateStep,
                                              DirectiveKind::DeleteStep];

    /// Etiqueta tal como aparece en el marcador de apertura.
    pub fn tag(self) -> &'static str {
        match self {
            DirectiveKind::CreateSequence => "CREATE_SEQUENCE",
            DirectiveKind::AddStep => "ADD_STEP",
            DirectiveKind::UpdateStep => "UPDATE_STEP",
            DirectiveKind::DeleteStep => "DELETE_STEP",
        }
    }

    /// `---ACTION: <TAG>---`
    pub fn opening_marker(self) -> String {
        format!("---ACTION: {}---", self.tag())
    }

    /// Envuelve `body` con los marcadores de este tipo.
    pub fn wrap(self, body: &str) -> String {
        format!("{}\n{}\n{}", self.opening_marker(), body, END_MARKER)
    }

    /// Patrón compilado: apertura, cuerpo mínimo (cruza saltos de línea) y cierre.
    pub(crate) fn pattern(self) -> &'static Regex {
        let idx = Self::PRIORITY.iter().position(|k| *k == self).unwrap_or(0);
        &BLOCK_PATTERNS[idx]
    }
}

// Los patrones son constantes; un fallo al compilarlos es un error de programa.
static BLOCK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    DirectiveKind::PRIORITY.iter()
                           .map(|kind| {
                               let pattern = format!(r"(?s){}(.*?){}",
                                                     regex::escape(&kind.opening_marker()),
                                                     regex::escape(END_MARKER));
                               Regex::new(&pattern).expect("patrón de bloque inválido")
                           })
                           .collect()
});

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for DirectiveKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::PRIORITY.iter().copied().find(|k| k.tag() == s).ok_or(())
    }
}
