use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("illegal move: {0}")]
    IllegalMove(String),
    #[error("invalid square: {0}")]
    InvalidSquare(String),
    #[error("invalid move notation: {0}")]
    InvalidNotation(String),
    #[error("invalid board layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
