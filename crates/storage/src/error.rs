use reqwest::StatusCode;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("account name must not be empty")]
    MissingAccountName,
    #[error("at least one signer is required")]
    NoSigners,
    #[error("invalid Manta URL '{0}'")]
    InvalidUrl(String),
    #[error("Error reading key material from {}: {source}", .path.display())]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read key material '{0}': no key found")]
    NoKeyFound(String),
    #[error(
        "Failed to read key '{0}': password protected keys are\n\
         not currently supported. Please decrypt the key prior to use."
    )]
    EncryptedKey(String),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("private key fingerprint {actual} does not match key id {expected}")]
    FingerprintMismatch { expected: String, actual: String },
    #[error("ssh agent: {0}")]
    Agent(String),
    #[error("no key matching {0} found in ssh agent")]
    KeyNotInAgent(String),
    #[error("signing request: {0}")]
    Signing(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unexpected response from storage service: {0}")]
    InvalidResponse(String),
    #[error("{status}: {code}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },
}

impl Error {
    /// HTTP status returned by the storage service, if this error came from it.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
