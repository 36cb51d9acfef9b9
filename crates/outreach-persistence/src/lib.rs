//! Persistencia Diesel de secuencias, pasos e historial de chat.
//! Implementa `SequenceRepository` y `MessageRepository` sobre SQLite (por
//! defecto) o Postgres (feature `pg`). Las migraciones van embebidas y se
//! aplican al construir el repositorio.

mod domain_persistence;
pub mod schema;

pub use domain_persistence::{new_from_env, normalize_database_url, DieselOutreachRepository, MIGRATIONS};
