use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid page dimensions: {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid grouping plan: {0}")]
    InvalidGrouping(String),
    #[error("Score has no systems to lay out")]
    Empty,
}

pub type Result<T> = std::result::Result<T, LayoutError>;
