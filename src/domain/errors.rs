use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn grade_out_of_range(grade: i32) -> Self {
        DomainError::Validation(format!("Grade must be between 0 and 100 (got {grade})"))
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
