use outreach_domain::{ChatMessage, DomainStubs, EventSink, RecordingSink, Role, SequenceRepository, WorkspaceEvent};
use uuid::Uuid;

#[test]
fn sequence_update_wire_format() {
  let owner = Uuid::new_v4();
  let (repo, seq) = DomainStubs::sample_repo(owner, 2);
  let view = repo.load_view(&seq.id).unwrap().unwrap();
  let value = serde_json::to_value(WorkspaceEvent::SequenceUpdate(view)).unwrap();

  assert_eq!(value["event"], "sequence_update");
  let data = &value["data"];
  assert_eq!(data["id"], seq.id.to_string());
  assert_eq!(data["user_id"], owner.to_string());
  assert_eq!(data["title"], "Senior Rust Engineer at Acme");
  assert_eq!(data["steps"][0]["step_number"], 1);
  assert_eq!(data["steps"][0]["type"], "email");
  assert_eq!(data["steps"][1]["type"], "message");
}

#[test]
fn message_event_round_trips() {
  let msg = ChatMessage::new(Uuid::new_v4(), Role::Assistant, "hola");
  let event = WorkspaceEvent::Message(msg.clone());
  let json = serde_json::to_string(&event).unwrap();
  assert!(json.contains("\"event\":\"message\""));
  assert!(json.contains("\"role\":\"assistant\""));
  let back: WorkspaceEvent = serde_json::from_str(&json).unwrap();
  assert_eq!(back, event);
  assert_eq!(back.name(), "message");
}

#[test]
fn recording_sink_splits_by_kind() {
  let sink = RecordingSink::new();
  let owner = Uuid::new_v4();
  let (repo, seq) = DomainStubs::sample_repo(owner, 1);
  sink.emit(WorkspaceEvent::Message(ChatMessage::new(owner, Role::User, "a")));
  sink.emit(WorkspaceEvent::SequenceUpdate(repo.load_view(&seq.id).unwrap().unwrap()));
  assert_eq!(sink.events().len(), 2);
  assert_eq!(sink.messages().len(), 1);
  assert_eq!(sink.sequence_updates()[0].id(), seq.id);
  sink.clear();
  assert!(sink.events().is_empty());
}
