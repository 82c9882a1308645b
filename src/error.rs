use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrainerError>;

/// Validation failures raised by the core. None of these are transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainerError {
    #[error("dilemma not found: {id}")]
    NotFound { id: String },

    #[error("invalid selection: no dilemma with id or title {id:?}")]
    InvalidSelection { id: String },

    #[error("no dilemma selected")]
    NoSelection,

    #[error("unknown choice key {key:?} for dilemma {dilemma_id}")]
    UnknownChoiceKey { dilemma_id: String, key: String },

    #[error("unknown session: {id}")]
    UnknownSession { id: String },

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}
