use thiserror::Error;

use crate::engine::EngineError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mutation value '{0}' is not valid (expected 1, 2 or 3)")]
    InvalidMutation(String),

    #[error("Table error at line {line}: {message}")]
    Table { line: usize, message: String },

    #[error("Circuit error at line {line}: {message}")]
    Circuit { line: usize, message: String },

    #[error("Seeded circuit is not functionally correct (score {score})")]
    SeedNotCorrect { score: u64 },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
