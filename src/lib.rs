mod debounce;
#[cfg(feature = "emitter")]
mod emitter;
mod error;
mod key;
mod persist;
mod record;
mod snapshot;
mod source;
mod storage;

pub use debounce::Debouncer;
pub use error::PersistError;
pub use key::{storage_key, STORAGE_PREFIX};
pub use persist::{FormPersist, FormPersistBuilder, RestoreOutcome, WeakFormPersist};
pub use record::{Record, SAVED_AT_KEY};
pub use snapshot::{is_changed, without_fields, Snapshot};
pub use source::{SetValueOpts, ValueSource};
pub use storage::{InMemoryStorage, Storage};

#[cfg(feature = "emitter")]
pub use emitter::watch_values;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
