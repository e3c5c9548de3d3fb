use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// The stored record could not be parsed as a JSON object.
    CorruptRecord(String),
    /// The storage adapter failed under its own contract.
    Storage(String),
    LockPoisoned(&'static str),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::CorruptRecord(detail) => {
                write!(f, "persisted record is corrupt: {}", detail)
            }
            PersistError::Storage(detail) => {
                write!(f, "storage adapter failure: {}", detail)
            }
            PersistError::LockPoisoned(operation) => {
                write!(f, "state lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for PersistError {}
