use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoopForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Degenerate Distribution: {0}")]
    DegenerateDistribution(String),

    #[error("No accessible origin: no free site within {radius} sites behind origin {origin}")]
    NoAccessibleOrigin { origin: usize, radius: usize },

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

pub type LfResult<T> = Result<T, LoopForgeError>;
