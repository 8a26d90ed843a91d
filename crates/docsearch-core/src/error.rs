use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store failure: {0}")]
    Store(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self { Error::InvalidRequest(msg.into()) }

    pub fn is_invalid_request(&self) -> bool { matches!(self, Error::InvalidRequest(_)) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self { Error::Operation(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
