use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The document has no top-level array with this name.
    #[error("Resource \"{0}\" not found")]
    UnknownResource(String),

    /// No record in the collection carries this id.
    #[error("Item with ID \"{id}\" not found in {resource}")]
    NotFound { resource: String, id: String },

    /// A record with this id already exists in the collection.
    #[error("Insert failed, duplicate id \"{id}\" in {resource}")]
    Conflict { resource: String, id: String },

    /// A request body or stored record has the wrong shape.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The JSON document on disk is not an object of arrays.
    #[error("Corrupt document: {0}")]
    Corrupt(String),

    /// Reading or writing the document file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// (De)serialization failure, including typed record decoding.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// True for both unknown collections and unknown ids.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::UnknownResource(_) | StoreError::NotFound { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
