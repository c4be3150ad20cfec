use thiserror::Error;

pub type Result<T> = std::result::Result<T, MomentError>;

#[derive(Debug, Error)]
pub enum MomentError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("non-polynomial term {term}: species {species} does not occur as a non-negative integer power")]
    NonPolynomial { term: String, species: String },
    #[error("malformed network: {0}")]
    Shape(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}
