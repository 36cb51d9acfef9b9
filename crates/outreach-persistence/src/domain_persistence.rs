use crate::schema;
use crate::schema::messages::dsl as msg_dsl;
use crate::schema::sequence_steps::dsl as step_dsl;
use crate::schema::sequences::dsl as seq_dsl;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};
use outreach_domain::{ChatMessage, DomainError, MessageRepository, Role, Sequence, SequenceRepository, Step, StepKind};
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
#[cfg(feature = "pg")]
type DbConn = PgConnection;
#[cfg(not(feature = "pg"))]
type DbConn = SqliteConnection;
type DbPool = Pool<ConnectionManager<DbConn>>;
type DbPooled = PooledConnection<ConnectionManager<DbConn>>;

/// Ruta SQLite usada cuando no hay URL configurada.
pub const DEFAULT_SQLITE_PATH: &str = "helix.db";

/// Repo Diesel que implementa `SequenceRepository` y `MessageRepository`.
///
/// Cada operación toma su propia conexión del pool; las que tocan varias
/// filas (borrado en cascada, renumeración) van en una transacción.
pub struct DieselOutreachRepository {
  pool: Arc<DbPool>,
}

// Ajustes por conexión: busy_timeout y foreign_keys no persisten en el
// fichero, hay que fijarlos en cada conexión del pool.
#[cfg(not(feature = "pg"))]
#[derive(Debug)]
struct SqlitePragmas;
#[cfg(not(feature = "pg"))]
impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(conn)
                                                     .map_err(diesel::r2d2::Error::QueryError)?;
    diesel::sql_query("PRAGMA foreign_keys = ON;").execute(conn)
                                                   .map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}

impl DieselOutreachRepository {
  /// Abre el pool y aplica las migraciones pendientes.
  pub fn new(database_url: &str) -> Result<Self, DomainError> {
    let url = normalize_database_url(database_url);
    let manager = ConnectionManager::<DbConn>::new(url.as_str());
    let builder = Pool::builder().max_size(4);
    #[cfg(not(feature = "pg"))]
    let builder = builder.connection_customizer(Box::new(SqlitePragmas));
    let pool = builder.build(manager)
                      .map_err(|e| DomainError::StorageError(format!("no se pudo crear el pool: {}", e)))?;
    let repo = DieselOutreachRepository { pool: Arc::new(pool) };
    let mut conn = repo.conn()?;
    #[cfg(not(feature = "pg"))]
    {
      if let Err(e) = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut conn) {
        log::warn!("no se pudo activar WAL, se sigue con el modo por defecto: {}", e);
      }
    }
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::StorageError(format!("migraciones: {}", e)))?;
    info!("repositorio de secuencias listo");
    Ok(repo)
  }
  fn conn(&self) -> Result<DbPooled, DomainError> {
    self.pool
        .get()
        .map_err(|e: r2d2::Error| DomainError::StorageError(format!("pool: {}", e)))
  }
}

/// Acepta `postgres://` como alias de `postgresql://` y quita el prefijo
/// `sqlite://` de las rutas SQLite.
pub fn normalize_database_url(url: &str) -> String {
  let url = url.trim();
  if let Some(rest) = url.strip_prefix("postgres://") {
    return format!("postgresql://{}", rest);
  }
  if let Some(rest) = url.strip_prefix("sqlite://") {
    return rest.to_string();
  }
  url.to_string()
}

fn looks_like_postgres(url: &str) -> bool {
  let l = url.to_lowercase();
  l.starts_with("postgres://") || l.starts_with("postgresql://")
}

/// Crea el repositorio a partir de `HELIX_DB_URL` (o `DATABASE_URL`).
///
/// Sin la feature `pg` sólo se aceptan rutas SQLite; si no hay variable se
/// usa `helix.db` en el directorio actual.
#[cfg(not(feature = "pg"))]
pub fn new_from_env() -> Result<DieselOutreachRepository, DomainError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("HELIX_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                         .unwrap_or_else(|_| DEFAULT_SQLITE_PATH.into());
  if looks_like_postgres(&url) {
    return Err(DomainError::ValidationError("outreach-persistence se compiló sin la feature 'pg'; activa 'pg' para \
                                             usar Postgres"
                                                           .into()));
  }
  DieselOutreachRepository::new(&url)
}
#[cfg(feature = "pg")]
pub fn new_from_env() -> Result<DieselOutreachRepository, DomainError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("HELIX_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                         .map_err(|_| DomainError::ValidationError("HELIX_DB_URL / DATABASE_URL not set".into()))?;
  if !looks_like_postgres(&url) {
    return Err(DomainError::ValidationError("HELIX_DB_URL / DATABASE_URL does not look like Postgres URL".into()));
  }
  DieselOutreachRepository::new(&url)
}

// Marca de inserción monótona: desempata pasos con el mismo número y
// mensajes con la misma fecha según el orden en que se guardaron.
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);
fn next_stamp() -> i64 {
  let now = Utc::now().timestamp_micros();
  match LAST_STAMP.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1))) {
    Ok(prev) | Err(prev) => now.max(prev + 1),
  }
}

#[derive(Debug, Error)]
enum TxError {
  #[error(transparent)]
  Db(#[from] DieselError),
  #[error(transparent)]
  Domain(#[from] DomainError),
}
impl From<TxError> for DomainError {
  fn from(e: TxError) -> Self {
    match e {
      TxError::Db(e) => DomainError::StorageError(format!("db: {}", e)),
      TxError::Domain(e) => e,
    }
  }
}
fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, DomainError> {
  res.map_err(|e| DomainError::StorageError(format!("db: {}", e)))
}
fn parse_uuid(s: &str) -> Result<Uuid, DomainError> {
  Uuid::parse_str(s).map_err(|e| DomainError::SerializationError(format!("invalid uuid '{}': {}", s, e)))
}
fn from_micros(ts: i64) -> Result<DateTime<Utc>, DomainError> {
  DateTime::<Utc>::from_timestamp_micros(ts).ok_or_else(|| DomainError::SerializationError(format!("marca de tiempo \
                                                                                                   fuera de rango: {}",
                                                                                                  ts)))
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::sequences)]
struct SequenceRow {
  pub id: String,
  pub owner_id: String,
  pub title: String,
  pub created_at_ts: i64,
}
impl SequenceRow {
  fn into_domain(self) -> Result<Sequence, DomainError> {
    Ok(Sequence { id: parse_uuid(&self.id)?,
                  owner_id: parse_uuid(&self.owner_id)?,
                  title: self.title,
                  created_at: from_micros(self.created_at_ts)? })
  }
}
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::sequence_steps)]
struct StepRow {
  pub id: String,
  pub sequence_id: String,
  pub step_number: i64,
  pub content: String,
  pub kind: String,
  pub inserted_at_ts: i64,
}
impl StepRow {
  fn into_domain(self) -> Result<Step, DomainError> {
    Ok(Step { id: parse_uuid(&self.id)?,
              sequence_id: parse_uuid(&self.sequence_id)?,
              step_number: self.step_number,
              content: self.content,
              kind: StepKind::from(self.kind) })
  }
}
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::messages)]
struct MessageRow {
  pub id: String,
  pub owner_id: String,
  pub role: String,
  pub content: String,
  pub timestamp_ts: i64,
  pub inserted_at_ts: i64,
}
impl MessageRow {
  fn into_domain(self) -> Result<ChatMessage, DomainError> {
    Ok(ChatMessage { id: parse_uuid(&self.id)?,
                     owner_id: parse_uuid(&self.owner_id)?,
                     content: self.content,
                     role: Role::from_str(&self.role)?,
                     timestamp: from_micros(self.timestamp_ts)? })
  }
}

fn load_steps(conn: &mut DbPooled, sequence_id: &str) -> Result<Vec<StepRow>, DieselError> {
  step_dsl::sequence_steps.filter(step_dsl::sequence_id.eq(sequence_id))
                          .order((step_dsl::step_number.asc(), step_dsl::inserted_at_ts.asc()))
                          .load::<StepRow>(conn)
}

impl SequenceRepository for DieselOutreachRepository {
  fn create_sequence(&self, owner_id: &Uuid, title: &str) -> Result<Sequence, DomainError> {
    let mut conn = self.conn()?;
    let row = SequenceRow { id: Uuid::new_v4().to_string(),
                            owner_id: owner_id.to_string(),
                            title: title.to_string(),
                            created_at_ts: next_stamp() };
    map_db_err(diesel::insert_into(seq_dsl::sequences).values(&row).execute(&mut conn))?;
    debug!("secuencia {} insertada", row.id);
    row.into_domain()
  }
  fn get_sequence(&self, id: &Uuid) -> Result<Option<Sequence>, DomainError> {
    let mut conn = self.conn()?;
    let opt = map_db_err(seq_dsl::sequences.filter(seq_dsl::id.eq(id.to_string()))
                                           .first::<SequenceRow>(&mut conn)
                                           .optional())?;
    opt.map(SequenceRow::into_domain).transpose()
  }
  fn most_recent_sequence(&self, owner_id: &Uuid) -> Result<Option<Sequence>, DomainError> {
    let mut conn = self.conn()?;
    let opt = map_db_err(seq_dsl::sequences.filter(seq_dsl::owner_id.eq(owner_id.to_string()))
                                           .order(seq_dsl::created_at_ts.desc())
                                           .first::<SequenceRow>(&mut conn)
                                           .optional())?;
    opt.map(SequenceRow::into_domain).transpose()
  }
  fn list_sequences(&self, owner_id: &Uuid) -> Result<Vec<Sequence>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(seq_dsl::sequences.filter(seq_dsl::owner_id.eq(owner_id.to_string()))
                                            .order(seq_dsl::created_at_ts.desc())
                                            .load::<SequenceRow>(&mut conn))?;
    rows.into_iter().map(SequenceRow::into_domain).collect()
  }
  fn rename_sequence(&self, id: &Uuid, title: &str) -> Result<Sequence, DomainError> {
    let mut conn = self.conn()?;
    let id_s = id.to_string();
    let n = map_db_err(diesel::update(seq_dsl::sequences.filter(seq_dsl::id.eq(&id_s))).set(seq_dsl::title.eq(title))
                                                                                          .execute(&mut conn))?;
    if n == 0 {
      return Err(DomainError::NotFound(format!("secuencia {}", id)));
    }
    let row = map_db_err(seq_dsl::sequences.filter(seq_dsl::id.eq(&id_s)).first::<SequenceRow>(&mut conn))?;
    row.into_domain()
  }
  fn delete_sequence(&self, id: &Uuid) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let id_s = id.to_string();
    conn.transaction::<_, TxError, _>(|conn| {
          diesel::delete(step_dsl::sequence_steps.filter(step_dsl::sequence_id.eq(&id_s))).execute(conn)?;
          let n = diesel::delete(seq_dsl::sequences.filter(seq_dsl::id.eq(&id_s))).execute(conn)?;
          if n == 0 {
            return Err(DomainError::NotFound(format!("secuencia {}", id_s)).into());
          }
          Ok(())
        })?;
    info!("secuencia {} eliminada con sus pasos", id);
    Ok(())
  }
  fn list_steps(&self, sequence_id: &Uuid) -> Result<Vec<Step>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(load_steps(&mut conn, &sequence_id.to_string()))?;
    rows.into_iter().map(StepRow::into_domain).collect()
  }
  fn get_step(&self, step_id: &Uuid) -> Result<Option<Step>, DomainError> {
    let mut conn = self.conn()?;
    let opt = map_db_err(step_dsl::sequence_steps.filter(step_dsl::id.eq(step_id.to_string()))
                                                 .first::<StepRow>(&mut conn)
                                                 .optional())?;
    opt.map(StepRow::into_domain).transpose()
  }
  fn insert_step(&self,
                 sequence_id: &Uuid,
                 step_number: i64,
                 content: &str,
                 kind: &StepKind)
                 -> Result<Step, DomainError> {
    let mut conn = self.conn()?;
    let seq_s = sequence_id.to_string();
    let exists = map_db_err(seq_dsl::sequences.filter(seq_dsl::id.eq(&seq_s))
                                              .select(seq_dsl::id)
                                              .first::<String>(&mut conn)
                                              .optional())?;
    if exists.is_none() {
      return Err(DomainError::NotFound(format!("secuencia {}", sequence_id)));
    }
    let row = StepRow { id: Uuid::new_v4().to_string(),
                        sequence_id: seq_s,
                        step_number,
                        content: content.to_string(),
                        kind: kind.as_str().to_string(),
                        inserted_at_ts: next_stamp() };
    map_db_err(diesel::insert_into(step_dsl::sequence_steps).values(&row).execute(&mut conn))?;
    row.into_domain()
  }
  fn update_step(&self, step_id: &Uuid, content: Option<&str>, kind: Option<&StepKind>) -> Result<Step, DomainError> {
    let mut conn = self.conn()?;
    let id_s = step_id.to_string();
    let row = conn.transaction::<_, TxError, _>(|conn| {
                    let target = || step_dsl::sequence_steps.filter(step_dsl::id.eq(&id_s));
                    if let Some(c) = content {
                      diesel::update(target()).set(step_dsl::content.eq(c)).execute(conn)?;
                    }
                    if let Some(k) = kind {
                      diesel::update(target()).set(step_dsl::kind.eq(k.as_str())).execute(conn)?;
                    }
                    let row = target().first::<StepRow>(conn)
                                    .optional()?
                                    .ok_or_else(|| DomainError::NotFound(format!("paso {}", id_s)))?;
                    Ok(row)
                  })?;
    row.into_domain()
  }
  fn set_step_number(&self, step_id: &Uuid, step_number: i64) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let n = map_db_err(diesel::update(step_dsl::sequence_steps.filter(step_dsl::id.eq(step_id.to_string())))
                         .set(step_dsl::step_number.eq(step_number))
                         .execute(&mut conn))?;
    if n == 0 {
      return Err(DomainError::NotFound(format!("paso {}", step_id)));
    }
    Ok(())
  }
  fn delete_step(&self, step_id: &Uuid) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let n = map_db_err(diesel::delete(step_dsl::sequence_steps.filter(step_dsl::id.eq(step_id.to_string())))
                         .execute(&mut conn))?;
    if n == 0 {
      return Err(DomainError::NotFound(format!("paso {}", step_id)));
    }
    Ok(())
  }
  /// Igual que la versión por defecto pero en una sola transacción: o se
  /// reescriben todos los números o ninguno.
  fn renumber_steps(&self, sequence_id: &Uuid) -> Result<Vec<Step>, DomainError> {
    let mut conn = self.conn()?;
    let seq_s = sequence_id.to_string();
    let rows = conn.transaction::<_, TxError, _>(|conn| {
                     let mut rows = load_steps(conn, &seq_s)?;
                     for (idx, row) in rows.iter_mut().enumerate() {
                       let expected = idx as i64 + 1;
                       if row.step_number != expected {
                         diesel::update(step_dsl::sequence_steps.filter(step_dsl::id.eq(&row.id)))
                           .set(step_dsl::step_number.eq(expected))
                           .execute(conn)?;
                         row.step_number = expected;
                       }
                     }
                     Ok(rows)
                   })?;
    rows.into_iter().map(StepRow::into_domain).collect()
  }
}

impl MessageRepository for DieselOutreachRepository {
  fn save_message(&self, message: &ChatMessage) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let row = MessageRow { id: message.id.to_string(),
                           owner_id: message.owner_id.to_string(),
                           role: message.role.as_str().to_string(),
                           content: message.content.clone(),
                           timestamp_ts: message.timestamp.timestamp_micros(),
                           inserted_at_ts: next_stamp() };
    map_db_err(diesel::insert_into(msg_dsl::messages).values(&row).execute(&mut conn))?;
    Ok(())
  }
  fn list_messages(&self, owner_id: &Uuid) -> Result<Vec<ChatMessage>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(msg_dsl::messages.filter(msg_dsl::owner_id.eq(owner_id.to_string()))
                                           .order((msg_dsl::timestamp_ts.asc(), msg_dsl::inserted_at_ts.asc()))
                                           .load::<MessageRow>(&mut conn))?;
    rows.into_iter().map(MessageRow::into_domain).collect()
  }
  /// Limita en la consulta en vez de cargar todo el historial.
  fn recent_messages(&self, owner_id: &Uuid, limit: usize) -> Result<Vec<ChatMessage>, DomainError> {
    let mut conn = self.conn()?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut rows = map_db_err(msg_dsl::messages.filter(msg_dsl::owner_id.eq(owner_id.to_string()))
                                               .order((msg_dsl::timestamp_ts.desc(), msg_dsl::inserted_at_ts.desc()))
                                               .limit(limit)
                                               .load::<MessageRow>(&mut conn))?;
    rows.reverse();
    rows.into_iter().map(MessageRow::into_domain).collect()
  }
  fn clear_messages(&self, owner_id: &Uuid) -> Result<usize, DomainError> {
    let mut conn = self.conn()?;
    map_db_err(diesel::delete(msg_dsl::messages.filter(msg_dsl::owner_id.eq(owner_id.to_string()))).execute(&mut conn))
  }
}
