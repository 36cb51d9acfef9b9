use outreach_domain::{ChatMessage, DomainError, MessageRepository, Role, SequenceRepository, StepKind};
use outreach_persistence::DieselOutreachRepository;
use std::path::PathBuf;
use uuid::Uuid;

// Base SQLite temporaria en fichero; se borra al salir del test.
struct TempDb {
  path: PathBuf,
}
impl TempDb {
  fn new() -> Self {
    Self { path: std::env::temp_dir().join(format!("helix_test_{}.db", Uuid::new_v4())) }
  }
  fn url(&self) -> String {
    self.path.to_str().unwrap().to_string()
  }
}
impl Drop for TempDb {
  fn drop(&mut self) {
    let _ = std::fs::remove_file(&self.path);
    let _ = std::fs::remove_file(self.path.with_extension("db-wal"));
    let _ = std::fs::remove_file(self.path.with_extension("db-shm"));
  }
}

fn sqlite_repo() -> Option<(TempDb, DieselOutreachRepository)> {
  if cfg!(feature = "pg") {
    eprintln!("skipping sqlite-only persistence test because 'pg' feature is enabled");
    return None;
  }
  let db = TempDb::new();
  let repo = DieselOutreachRepository::new(&db.url()).expect("failed to create repo");
  Some((db, repo))
}

#[test]
fn sequence_and_steps_lifecycle() {
  let Some((_db, repo)) = sqlite_repo() else { return };
  let owner = Uuid::new_v4();
  let first = repo.create_sequence(&owner, "Primera").unwrap();
  let second = repo.create_sequence(&owner, "Segunda").unwrap();
  assert!(second.created_at > first.created_at);
  assert_eq!(repo.most_recent_sequence(&owner).unwrap().unwrap().id, second.id);
  let ids: Vec<Uuid> = repo.list_sequences(&owner).unwrap().into_iter().map(|s| s.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);

  let a = repo.insert_step(&first.id, 2, "a", &StepKind::Email).unwrap();
  let b = repo.insert_step(&first.id, 1, "b", &StepKind::Custom("linkedin".into())).unwrap();
  let c = repo.insert_step(&first.id, 1, "c", &StepKind::Call).unwrap();
  // mismo número: gana el orden de inserción
  let order: Vec<Uuid> = repo.list_steps(&first.id).unwrap().into_iter().map(|s| s.id).collect();
  assert_eq!(order, vec![b.id, c.id, a.id]);

  let renumbered = repo.renumber_steps(&first.id).unwrap();
  let numbers: Vec<i64> = renumbered.iter().map(|s| s.step_number).collect();
  assert_eq!(numbers, vec![1, 2, 3]);
  assert_eq!(repo.get_step(&a.id).unwrap().unwrap().step_number, 3);
  assert_eq!(repo.get_step(&b.id).unwrap().unwrap().kind, StepKind::Custom("linkedin".into()));

  let updated = repo.update_step(&c.id, Some("c2"), None).unwrap();
  assert_eq!(updated.content, "c2");
  assert_eq!(updated.kind, StepKind::Call);
  let updated = repo.update_step(&c.id, None, Some(&StepKind::Message)).unwrap();
  assert_eq!(updated.content, "c2");
  assert_eq!(updated.kind, StepKind::Message);

  repo.delete_step(&b.id).unwrap();
  assert!(matches!(repo.delete_step(&b.id), Err(DomainError::NotFound(_))));
  let numbers: Vec<i64> = repo.renumber_steps(&first.id).unwrap().iter().map(|s| s.step_number).collect();
  assert_eq!(numbers, vec![1, 2]);

  let renamed = repo.rename_sequence(&first.id, "Renombrada").unwrap();
  assert_eq!(renamed.title, "Renombrada");
  assert_eq!(renamed.created_at, first.created_at);

  repo.delete_sequence(&first.id).unwrap();
  assert!(repo.get_sequence(&first.id).unwrap().is_none());
  assert!(repo.list_steps(&first.id).unwrap().is_empty());
  assert!(matches!(repo.delete_sequence(&first.id), Err(DomainError::NotFound(_))));
}

#[test]
fn missing_rows_are_not_found() {
  let Some((_db, repo)) = sqlite_repo() else { return };
  let ghost = Uuid::new_v4();
  assert!(matches!(repo.insert_step(&ghost, 1, "x", &StepKind::Email), Err(DomainError::NotFound(_))));
  assert!(matches!(repo.update_step(&ghost, Some("x"), None), Err(DomainError::NotFound(_))));
  assert!(matches!(repo.set_step_number(&ghost, 1), Err(DomainError::NotFound(_))));
  assert!(matches!(repo.rename_sequence(&ghost, "x"), Err(DomainError::NotFound(_))));
  assert!(repo.most_recent_sequence(&ghost).unwrap().is_none());
}

#[test]
fn message_history_is_chronological_and_clearable() {
  let Some((_db, repo)) = sqlite_repo() else { return };
  let owner = Uuid::new_v4();
  let other = Uuid::new_v4();
  for i in 0..5 {
    repo.save_message(&ChatMessage::new(owner, Role::User, format!("m{}", i))).unwrap();
  }
  repo.save_message(&ChatMessage::new(other, Role::Assistant, "ajeno")).unwrap();

  let all: Vec<String> = repo.list_messages(&owner).unwrap().into_iter().map(|m| m.content).collect();
  assert_eq!(all, vec!["m0", "m1", "m2", "m3", "m4"]);
  let recent: Vec<String> = repo.recent_messages(&owner, 2).unwrap().into_iter().map(|m| m.content).collect();
  assert_eq!(recent, vec!["m3", "m4"]);

  assert_eq!(repo.clear_messages(&owner).unwrap(), 5);
  assert!(repo.list_messages(&owner).unwrap().is_empty());
  assert_eq!(repo.list_messages(&other).unwrap().len(), 1);
}

#[test]
fn data_survives_reopening_the_database() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let owner = Uuid::new_v4();
  let seq_id = {
    let repo = DieselOutreachRepository::new(&db.url()).unwrap();
    let seq = repo.create_sequence(&owner, "Persistente").unwrap();
    repo.insert_step(&seq.id, 1, "hola", &StepKind::Email).unwrap();
    seq.id
  };
  // con prefijo sqlite:// también abre el mismo fichero
  let repo = DieselOutreachRepository::new(&format!("sqlite://{}", db.url())).unwrap();
  let view = repo.load_view(&seq_id).unwrap().unwrap();
  assert_eq!(view.sequence.title, "Persistente");
  assert_eq!(view.step_numbers(), vec![1]);
}
