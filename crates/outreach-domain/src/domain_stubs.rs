use crate::domain_repository::{InMemoryOutreachRepository, SequenceRepository};
use crate::{Sequence, StepKind};
use uuid::Uuid;

pub struct DomainStubs;

impl DomainStubs {
    /// Crea un repositorio en memoria con una secuencia de ejemplo para
    /// `owner_id`, con pasos numerados 1..=`steps`.
    pub fn sample_repo(owner_id: Uuid, steps: usize) -> (InMemoryOutreachRepository, Sequence) {
        let repo = InMemoryOutreachRepository::new();
        let sequence = Self::seed_sequence(&repo, owner_id, "Senior Rust Engineer at Acme", steps);
        (repo, sequence)
    }

    /// Inserta en `repo` una secuencia con pasos 1..=`steps` alternando tipos.
    pub fn seed_sequence<R>(repo: &R, owner_id: Uuid, title: &str, steps: usize) -> Sequence
        where R: SequenceRepository + ?Sized
    {
        // El repositorio en memoria no falla salvo mutex envenenado; en ese
        // caso el stub no tiene sentido y se aborta.
        let sequence = repo.create_sequence(&owner_id, title).expect("crear secuencia de ejemplo");
        let kinds = [StepKind::Email, StepKind::Message, StepKind::Call];
        for n in 1..=steps {
            let kind = &kinds[(n - 1) % kinds.len()];
            repo.insert_step(&sequence.id, n as i64, &format!("Paso {} de ejemplo", n), kind)
                .expect("insertar paso de ejemplo");
        }
        sequence
    }
}
