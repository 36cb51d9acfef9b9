use action_protocol::{DirectiveKind, MutationOutcome};
use chat_workflow::{ChannelSink, ChatConfig, ChatError, ChatService, GenerationError, ScriptedGenerator,
                    DEFAULT_APOLOGY_MESSAGE};
use outreach_domain::{ChatMessage, DomainError, DomainStubs, InMemoryOutreachRepository, MessageRepository,
                      RecordingSink, Role, Sequence, SequenceRepository, Step, StepKind, WorkspaceEvent};
use std::sync::Arc;
use uuid::Uuid;

type Service = ChatService<InMemoryOutreachRepository, ScriptedGenerator>;

fn setup(config: ChatConfig) -> (Arc<InMemoryOutreachRepository>, Arc<ScriptedGenerator>, Arc<RecordingSink>, Service) {
  let repo = Arc::new(InMemoryOutreachRepository::new());
  let generator = Arc::new(ScriptedGenerator::new());
  let sink = Arc::new(RecordingSink::new());
  let service = ChatService::new(repo.clone(), generator.clone(), sink.clone(), config);
  (repo, generator, sink, service)
}

#[test]
fn plain_reply_is_stored_and_emitted() {
  let (repo, generator, sink, service) = setup(ChatConfig::default());
  let owner = Uuid::new_v4();
  generator.push_reply("¡Hola! ¿Para qué puesto buscas candidatos?");

  let exchange = service.send_message(owner, "Hola").unwrap();
  assert!(!exchange.action_performed);
  assert!(!exchange.apologized);
  assert_eq!(exchange.assistant_message.role, Role::Assistant);

  let history = service.history(&owner).unwrap();
  let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
  assert_eq!(roles, vec![Role::User, Role::Assistant]);
  assert_eq!(history[1].content, "¡Hola! ¿Para qué puesto buscas candidatos?");

  let emitted = sink.messages();
  assert_eq!(emitted.len(), 2);
  assert_eq!(emitted[0].id, exchange.user_message.id);
  assert_eq!(emitted[1].id, exchange.assistant_message.id);
  assert!(sink.sequence_updates().is_empty());
  assert!(repo.list_sequences(&owner).unwrap().is_empty());
}

#[test]
fn empty_content_is_rejected_before_storing() {
  let (repo, generator, sink, service) = setup(ChatConfig::default());
  let owner = Uuid::new_v4();
  assert!(matches!(service.send_message(owner, "  \n"), Err(ChatError::Validation(_))));
  assert!(repo.list_messages(&owner).unwrap().is_empty());
  assert!(generator.requests().is_empty());
  assert!(sink.events().is_empty());
}

#[test]
fn action_block_is_applied_and_stripped() {
  let (repo, generator, sink, service) = setup(ChatConfig::default());
  let owner = Uuid::new_v4();
  let body = r#"{"title": "Backend at Foo", "steps": [{"step_number": 1, "content": "Hola"}, {"step_number": 2, "type": "call", "content": "Llamada"}]}"#;
  generator.push_reply(format!("He creado la secuencia.\n\n{}", DirectiveKind::CreateSequence.wrap(body)));

  let exchange = service.send_message(owner, "Crea una secuencia").unwrap();
  assert!(exchange.action_performed);
  assert!(matches!(exchange.outcome, Some(MutationOutcome::SequenceCreated(_))));
  assert_eq!(exchange.assistant_message.content, "He creado la secuencia.");

  let seq = repo.most_recent_sequence(&owner).unwrap().unwrap();
  assert_eq!(seq.title, "Backend at Foo");
  // orden de eventos: mensaje del usuario, secuencia, mensaje del asistente
  let names: Vec<&str> = sink.events().iter().map(WorkspaceEvent::name).collect();
  assert_eq!(names, vec!["message", "sequence_update", "message"]);
}

#[test]
fn generator_failure_stores_apology() {
  let (repo, generator, sink, service) = setup(ChatConfig::default());
  let owner = Uuid::new_v4();
  generator.push_failure(GenerationError::Unavailable("timeout".into()));

  let exchange = service.send_message(owner, "Hola").unwrap();
  assert!(exchange.apologized);
  assert!(!exchange.action_performed);
  assert_eq!(exchange.assistant_message.content, DEFAULT_APOLOGY_MESSAGE);
  assert_eq!(repo.list_messages(&owner).unwrap().len(), 2);
  assert_eq!(sink.messages().len(), 2);
}

#[test]
fn history_excludes_current_message_and_respects_limit() {
  let config = ChatConfig { history_limit: 3,
                            ..ChatConfig::default() };
  let (repo, generator, _sink, service) = setup(config);
  let owner = Uuid::new_v4();
  repo.save_message(&ChatMessage::new(owner, Role::System, "nota interna")).unwrap();
  for i in 0..3 {
    generator.push_reply(format!("r{}", i));
    service.send_message(owner, &format!("u{}", i)).unwrap();
  }
  generator.push_reply("r3");
  service.send_message(owner, "u3").unwrap();

  let requests = generator.requests();
  assert_eq!(requests.len(), 4);
  // la primera petición no tiene contexto: sólo había un mensaje de sistema
  assert!(requests[0].history.is_empty());
  let last = &requests[3];
  assert_eq!(last.prompt, "u3");
  let context: Vec<&str> = last.history.iter().map(|h| h.content.as_str()).collect();
  assert_eq!(context, vec!["r1", "u2", "r2"]);
  assert!(last.history.iter().all(|h| h.role != Role::System));
  assert!(last.system.contains("---ACTION: ADD_STEP---"));
}

#[test]
fn clear_removes_only_owner_history() {
  let (_repo, generator, _sink, service) = setup(ChatConfig::default());
  let owner = Uuid::new_v4();
  let other = Uuid::new_v4();
  generator.push_reply("a");
  generator.push_reply("b");
  service.send_message(owner, "hola").unwrap();
  service.send_message(other, "hola").unwrap();

  assert_eq!(service.clear(&owner).unwrap(), 2);
  assert!(service.history(&owner).unwrap().is_empty());
  assert_eq!(service.history(&other).unwrap().len(), 2);
}

#[test]
fn events_reach_channel_subscribers() {
  let repo = Arc::new(InMemoryOutreachRepository::new());
  let generator = Arc::new(ScriptedGenerator::with_replies([DirectiveKind::AddStep.wrap(r#"{"content": "Hola"}"#)]));
  let sink = Arc::new(ChannelSink::default());
  let mut rx = sink.subscribe();
  let service = ChatService::new(repo, generator, sink.clone(), ChatConfig::default());

  let exchange = service.send_message(Uuid::new_v4(), "añade un paso").unwrap();
  assert!(exchange.action_performed);
  assert_eq!(exchange.assistant_message.content, "");

  let mut names = Vec::new();
  while let Ok(event) = rx.try_recv() {
    names.push(event.name());
  }
  assert_eq!(names, vec!["message", "sequence_update", "message"]);
}

// Repositorio cuyas escrituras de pasos fallan; el historial funciona.
struct BrokenSteps {
  inner: InMemoryOutreachRepository,
}

impl SequenceRepository for BrokenSteps {
  fn create_sequence(&self, owner_id: &Uuid, title: &str) -> Result<Sequence, DomainError> {
    self.inner.create_sequence(owner_id, title)
  }
  fn get_sequence(&self, id: &Uuid) -> Result<Option<Sequence>, DomainError> {
    self.inner.get_sequence(id)
  }
  fn most_recent_sequence(&self, owner_id: &Uuid) -> Result<Option<Sequence>, DomainError> {
    self.inner.most_recent_sequence(owner_id)
  }
  fn list_sequences(&self, owner_id: &Uuid) -> Result<Vec<Sequence>, DomainError> {
    self.inner.list_sequences(owner_id)
  }
  fn rename_sequence(&self, id: &Uuid, title: &str) -> Result<Sequence, DomainError> {
    self.inner.rename_sequence(id, title)
  }
  fn delete_sequence(&self, id: &Uuid) -> Result<(), DomainError> {
    self.inner.delete_sequence(id)
  }
  fn list_steps(&self, sequence_id: &Uuid) -> Result<Vec<Step>, DomainError> {
    self.inner.list_steps(sequence_id)
  }
  fn get_step(&self, step_id: &Uuid) -> Result<Option<Step>, DomainError> {
    self.inner.get_step(step_id)
  }
  fn insert_step(&self, _: &Uuid, _: i64, _: &str, _: &StepKind) -> Result<Step, DomainError> {
    Err(DomainError::StorageError("disco lleno".into()))
  }
  fn update_step(&self, _: &Uuid, _: Option<&str>, _: Option<&StepKind>) -> Result<Step, DomainError> {
    Err(DomainError::StorageError("disco lleno".into()))
  }
  fn set_step_number(&self, _: &Uuid, _: i64) -> Result<(), DomainError> {
    Err(DomainError::StorageError("disco lleno".into()))
  }
  fn delete_step(&self, _: &Uuid) -> Result<(), DomainError> {
    Err(DomainError::StorageError("disco lleno".into()))
  }
}

impl MessageRepository for BrokenSteps {
  fn save_message(&self, message: &ChatMessage) -> Result<(), DomainError> {
    self.inner.save_message(message)
  }
  fn list_messages(&self, owner_id: &Uuid) -> Result<Vec<ChatMessage>, DomainError> {
    self.inner.list_messages(owner_id)
  }
  fn clear_messages(&self, owner_id: &Uuid) -> Result<usize, DomainError> {
    self.inner.clear_messages(owner_id)
  }
}

#[test]
fn store_failure_during_action_degrades_to_apology() {
  let owner = Uuid::new_v4();
  let inner = InMemoryOutreachRepository::new();
  DomainStubs::seed_sequence(&inner, owner, "Dev at Foo", 1);
  let repo = Arc::new(BrokenSteps { inner });
  let generator = Arc::new(ScriptedGenerator::with_replies([DirectiveKind::AddStep.wrap(r#"{"content": "x"}"#)]));
  let sink = Arc::new(RecordingSink::new());
  let config = ChatConfig { apology_message: "Lo siento".into(),
                            ..ChatConfig::default() };
  let service = ChatService::new(repo.clone(), generator, sink.clone(), config);

  let exchange = service.send_message(owner, "añade un paso").unwrap();
  assert!(exchange.apologized);
  assert_eq!(exchange.assistant_message.content, "Lo siento");
  assert!(sink.sequence_updates().is_empty());
  assert_eq!(repo.list_messages(&owner).unwrap().len(), 2);
}
