use action_protocol::{ActionContext, ActionService, NewStep, SequenceService};
use chat_workflow::{ChannelSink, ChatConfig, ChatService, GenerationError, GenerationRequest, SequenceGenerationService,
                    TextGenerator};
use log::info;
use outreach_domain::{StepKind, WorkspaceEvent};
use outreach_persistence::DieselOutreachRepository;
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use uuid::Uuid;

/// Generador atendido por el operador: muestra la petición y lee la
/// respuesta del asistente desde stdin hasta una línea con un solo ".".
/// Permite probar los bloques de acción a mano.
struct OperatorGenerator;

impl TextGenerator for OperatorGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        println!("\n--- petición al generador ({} mensajes de contexto) ---", request.history.len());
        println!("{}", request.prompt);
        println!("--- escribe la respuesta del asistente; termina con una línea '.' (vacía = error) ---");
        let reply = read_block().map_err(|e| GenerationError::Unavailable(e.to_string()))?;
        if reply.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(reply)
    }
}

/// Pequeño menú interactivo sobre el almacén de secuencias configurado en
/// `HELIX_DB_URL` (SQLite por defecto, `helix.db`).
///
/// Opciones soportadas:
/// 1) Ver secuencias
/// 2) Ver pasos de una secuencia
/// 3) Crear secuencia
/// 4) Eliminar secuencia
/// 5) Añadir paso
/// 6) Procesar una respuesta del asistente con bloques de acción
/// 7) Enviar mensaje de chat
/// 8) Generar secuencia para un puesto
/// 9) Ver historial de chat
/// 10) Borrar historial de chat
/// 11) Salir
fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                                 tracing_subscriber::EnvFilter::new("info")
                             }))
                             .with_writer(io::stderr)
                             .init();

    // Inicializar repo (aplica migraciones embebidas)
    let repo = Arc::new(outreach_persistence::new_from_env()?);
    let owner = owner_from_env()?;
    info!("operando como owner {}", owner);

    let sink = Arc::new(ChannelSink::default());
    let mut events = sink.subscribe();
    let sequences = SequenceService::new(repo.clone(), sink.clone());
    let actions = ActionService::new(repo.clone(), sink.clone());
    let generator = Arc::new(OperatorGenerator);
    let chat = ChatService::new(repo.clone(), generator.clone(), sink.clone(), ChatConfig::from_env()?);
    let generation: SequenceGenerationService<DieselOutreachRepository, OperatorGenerator> =
        SequenceGenerationService::new(repo.clone(), generator, sink.clone());

    loop {
        println!("\n== Helix CLI ==");
        println!("1) Ver secuencias");
        println!("2) Ver pasos de una secuencia");
        println!("3) Crear secuencia");
        println!("4) Eliminar secuencia");
        println!("5) Añadir paso");
        println!("6) Procesar respuesta del asistente");
        println!("7) Enviar mensaje de chat");
        println!("8) Generar secuencia para un puesto");
        println!("9) Ver historial de chat");
        println!("10) Borrar historial de chat");
        println!("11) Salir");
        let choice = prompt("Elige una opción: ")?;
        match choice.trim() {
            "1" => match sequences.list_sequences(&owner) {
                Ok(list) => {
                    println!("\nID                                   | CREADA                    | TÍTULO");
                    println!("-----------------------------------------------------------------------------------");
                    for s in list {
                        println!("{} | {} | {}", s.id, s.created_at.format("%Y-%m-%d %H:%M:%S"), s.title);
                    }
                }
                Err(e) => eprintln!("Error listando secuencias: {}", e),
            },
            "2" => {
                let Some(id) = prompt_uuid("Secuencia (UUID): ")? else { continue };
                match sequences.get_sequence(&owner, &id) {
                    Ok(view) => {
                        println!("\n{} ({} pasos)", view.sequence.title, view.steps.len());
                        for step in &view.steps {
                            println!("  {}. [{}] {}", step.step_number, step.kind, step.content);
                        }
                    }
                    Err(e) => eprintln!("Error leyendo secuencia: {}", e),
                }
            }
            "3" => {
                let title = prompt("Título: ")?;
                match sequences.create_sequence(&owner, &title) {
                    Ok(view) => println!("Secuencia creada: {}", view.id()),
                    Err(e) => eprintln!("Error creando secuencia: {}", e),
                }
            }
            "4" => {
                let Some(id) = prompt_uuid("Secuencia a eliminar (UUID): ")? else { continue };
                let confirm = prompt(&format!("Confirma borrado de {}? escribir 'yes' para confirmar: ", id))?;
                if confirm.trim().eq_ignore_ascii_case("yes") {
                    match sequences.delete_sequence(&owner, &id) {
                        Ok(()) => println!("Secuencia eliminada: {}", id),
                        Err(e) => eprintln!("Error eliminando secuencia: {}", e),
                    }
                } else {
                    println!("Borrado cancelado");
                }
            }
            "5" => {
                let Some(id) = prompt_uuid("Secuencia (UUID): ")? else { continue };
                let content = prompt("Contenido: ")?;
                let kind = prompt("Tipo (email/message/call, enter = email): ")?;
                let position = prompt("Posición (enter = al final): ")?;
                let mut step = NewStep::new(content.trim());
                if !kind.trim().is_empty() {
                    step = step.with_kind(StepKind::from(kind.trim()));
                }
                if !position.trim().is_empty() {
                    match position.trim().parse() {
                        Ok(n) => step = step.at(n),
                        Err(_) => {
                            eprintln!("Posición inválida");
                            continue;
                        }
                    }
                }
                match sequences.add_step(&owner, &id, step) {
                    Ok(s) => println!("Paso {} añadido: {}", s.step_number, s.id),
                    Err(e) => eprintln!("Error añadiendo paso: {}", e),
                }
            }
            "6" => {
                println!("Pega la respuesta; termina con una línea '.'");
                let text = read_block()?;
                match actions.process(&text, &ActionContext::for_owner(owner)) {
                    Ok(out) => {
                        println!("\nacción aplicada: {}", out.action_performed);
                        if let Some(outcome) = &out.outcome {
                            println!("resultado: {:?}", outcome);
                        }
                        println!("texto visible:\n{}", out.text);
                    }
                    Err(e) => eprintln!("Error aplicando la acción: {}", e),
                }
            }
            "7" => {
                let content = prompt("Mensaje: ")?;
                match chat.send_message(owner, content.trim()) {
                    Ok(exchange) => println!("\nHelix: {}", exchange.assistant_message.content),
                    Err(e) => eprintln!("Error enviando mensaje: {}", e),
                }
            }
            "8" => {
                let job = prompt("Puesto: ")?;
                let company = prompt("Empresa: ")?;
                let details = prompt("Detalles (enter para ninguno): ")?;
                match generation.generate(&owner, &job, &company, Some(details.as_str())) {
                    Ok(view) => println!("Secuencia generada: {} ({} pasos)", view.sequence.title, view.steps.len()),
                    Err(e) => eprintln!("Error generando secuencia: {}", e),
                }
            }
            "9" => match chat.history(&owner) {
                Ok(messages) => {
                    for m in messages {
                        println!("[{}] {}: {}", m.timestamp.format("%H:%M:%S"), m.role, m.content);
                    }
                }
                Err(e) => eprintln!("Error leyendo historial: {}", e),
            },
            "10" => match chat.clear(&owner) {
                Ok(n) => println!("Historial borrado ({} mensajes)", n),
                Err(e) => eprintln!("Error borrando historial: {}", e),
            },
            "11" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
        drain_events(&mut events);
    }

    Ok(())
}

/// Muestra los eventos emitidos durante la última operación.
fn drain_events(rx: &mut Receiver<WorkspaceEvent>) {
    loop {
        match rx.try_recv() {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => println!("[evento {}] {}", event.name(), json),
                Err(e) => eprintln!("[evento {}] no serializable: {}", event.name(), e),
            },
            Err(TryRecvError::Lagged(n)) => println!("[eventos] {} perdidos", n),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

/// Owner fijo de la sesión: `HELIX_OWNER_ID` o el UUID nulo.
fn owner_from_env() -> Result<Uuid, Box<dyn Error>> {
    match std::env::var("HELIX_OWNER_ID") {
        Ok(raw) if !raw.trim().is_empty() => Ok(Uuid::parse_str(raw.trim())?),
        _ => Ok(Uuid::nil()),
    }
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}

fn prompt_uuid(msg: &str) -> io::Result<Option<Uuid>> {
    let raw = prompt(msg)?;
    match Uuid::parse_str(raw.trim()) {
        Ok(u) => Ok(Some(u)),
        Err(_) => {
            eprintln!("UUID inválido");
            Ok(None)
        }
    }
}

// Lee líneas hasta "." o fin de entrada.
fn read_block() -> io::Result<String> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line == "." {
            break;
        }
        lines.push(line.to_string());
    }
    Ok(lines.join("\n"))
}
