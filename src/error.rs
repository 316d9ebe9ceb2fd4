use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Particle capacity exceeded: capacity={capacity}")]
    CapacityExceeded { capacity: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decoding error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

pub type SimResult<T> = Result<T, SimError>;
