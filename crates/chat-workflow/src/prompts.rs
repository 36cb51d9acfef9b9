// Archivo: prompts.rs
// Propósito: textos fijos enviados al generador.
use action_protocol::DirectiveKind;

/// Instrucciones de sistema del asistente de reclutamiento, incluyendo el
/// formato de los bloques de acción que el asistente puede emitir.
pub fn system_prompt() -> String {
    format!("You are Helix, an agentic recruiting assistant that helps users write personalized outreach \
             sequences for hiring candidates.\n\
             When helping with sequences, ask for details about the role and the company culture, keep the \
             tone professional but not generic, and suggest follow-up steps.\n\n\
             You can modify the user's current sequence by including exactly one action block in your reply. \
             The block body must be a JSON object:\n\n{}\n\n{}\n\n{}\n\n{}\n\n\
             Step types are usually email, message or call. Steps are renumbered 1..N after every change.",
            DirectiveKind::CreateSequence.wrap(r#"{"title": "...", "steps": [{"step_number": 1, "type": "email", "content": "..."}]}"#),
            DirectiveKind::AddStep.wrap(r#"{"step_number": 2, "type": "message", "content": "..."}"#),
            DirectiveKind::UpdateStep.wrap(r#"{"step_number": 1, "content": "...", "type": "email"}"#),
            DirectiveKind::DeleteStep.wrap(r#"{"step_number": 3}"#))
}

/// Petición de una secuencia completa en formato JSON.
pub fn sequence_prompt(job_title: &str, company_name: &str, details: Option<&str>) -> String {
    let details = details.map(str::trim)
                         .filter(|d| !d.is_empty())
                         .unwrap_or("No additional details provided.");
    format!("Create a recruiting outreach sequence for a {job_title} role at {company_name}.\n\n\
             Additional details:\n{details}\n\n\
             Please provide a complete sequence with:\n\
             1. Initial outreach email\n\
             2. Follow-up message\n\
             3. Final connection attempt\n\n\
             Format your ENTIRE response as a valid JSON array where each element has 'type' (email, message, \
             call) and 'content' fields. Do not include any text outside of the JSON.")
}
