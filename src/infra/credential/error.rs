use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No credential stored for {0}")]
    NotFound(String),

    #[error("Invalid credential input: {0}")]
    InvalidInput(&'static str),

    #[error("Credential store unavailable: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, CredentialError>;
