//! Error types for the analysis engine

use thiserror::Error;

/// Main error type for model construction and analysis
#[derive(Error, Debug)]
pub enum FeltError {
    #[error("Element definition '{0}' is already registered")]
    DuplicateDefinition(String),

    #[error("Element definition '{0}' is not registered")]
    DefinitionNotFound(String),

    #[error("Node {0} not found in problem")]
    NodeNotFound(u32),

    #[error("Element {0} not found in problem")]
    ElementNotFound(u32),

    #[error("Material '{0}' not found in problem")]
    MaterialNotFound(String),

    #[error("Constraint '{0}' not found in problem")]
    ConstraintNotFound(String),

    #[error("Force '{0}' not found in problem")]
    ForceNotFound(String),

    #[error("Load '{0}' not found in problem")]
    LoadNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Duplicate node number {0}")]
    DuplicateNode(u32),

    #[error("Duplicate element number {0}")]
    DuplicateElement(u32),

    #[error("Element {element}: {message}")]
    InvalidElement { element: u32, message: String },

    #[error("nothing to do")]
    NothingToDo,

    #[error("{0} errors found in analysis parameters")]
    InvalidParameters(usize),

    #[error("{0} fatal errors in element stiffness and mass definitions")]
    Assembly(usize),

    #[error("{0} fatal errors found computing element stresses")]
    Stress(usize),

    #[error("could not solve for global displacements")]
    SingularMatrix,

    #[error("did not converge on a solution after {0} iterations")]
    ConvergenceFailed(usize),

    #[error("fatal error in integration (probably a singularity)")]
    IntegrationFailed,

    #[error("coefficient matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("could not compute eigenmodes: {0}")]
    EigenFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for analysis operations
pub type FeltResult<T> = Result<T, FeltError>;
