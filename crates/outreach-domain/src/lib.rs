mod domain_repository;
mod domain_stubs;
mod errors;
mod events;
mod message;
mod sequence;
mod step;

pub use domain_repository::{InMemoryOutreachRepository, MessageRepository, SequenceRepository};
pub use domain_stubs::DomainStubs;
pub use errors::DomainError;
pub use events::{EventSink, NullSink, RecordingSink, WorkspaceEvent};
pub use message::{ChatMessage, Role};
pub use sequence::{Sequence, SequenceView, DEFAULT_SEQUENCE_TITLE};
pub use step::{Step, StepKind};
