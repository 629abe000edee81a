use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
