use std::backtrace::Backtrace;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub backtrace: Backtrace,
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            write!(f, ", {}", self.backtrace)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    /// Extension of the uploaded file is missing or not allow-listed. Carries
    /// the allowed extensions so the caller can correct the upload.
    #[error(
        "invalid file type, files must be one of the following: {}",
        .0.iter().map(|e| format!(".{e}")).collect::<Vec<_>>().join(", ")
    )]
    InvalidFileType(Vec<String>),

    #[error("not found: {0}")]
    NotFound(String),

    /// Object store refused or failed the upload. Nothing was committed.
    #[error("remote upload failed: {0}")]
    RemoteUploadFailure(String),

    /// Registry write failed after the object reached the object store.
    #[error("failed committing image record: {0}")]
    CommitFailure(String),

    /// Shortcode already taken at commit time. Retried by the uploader and
    /// never surfaced to clients.
    #[error("shortcode already taken: {0}")]
    ShortcodeCollision(String),

    #[error("shortcode space exhausted: {0}")]
    CodespaceExhausted(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("object store error: {0}")]
    ObjectStore(String),

    #[error("unexpected error")]
    StdIoError(#[from] std::io::Error),

    #[error("config error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("db error: {0}")]
    DbError(String),
    #[error("sled db error: {0}")]
    SledError(#[from] sled::Error),

    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("passwordhash error: {0}")]
    PasswordHashError(#[from] argon2::password_hash::Error),

    #[error("pot decode error: {0}")]
    PotError(#[from] pot::Error),

    #[error("uuid error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("url parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("other error: {0}")]
    Other(String),

    #[error("infallible?")]
    Infallible(#[from] Infallible),
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::new(ErrorKind::Other(e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::new(ErrorKind::ReqwestError(e))
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::new(ErrorKind::PasswordHashError(e))
    }
}

impl From<uuid::Error> for Error {
    fn from(e: uuid::Error) -> Self {
        Self::new(ErrorKind::UuidError(e))
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Self::new(ErrorKind::SledError(e))
    }
}

impl From<sled::transaction::TransactionError<ErrorKind>> for Error {
    fn from(e: sled::transaction::TransactionError<ErrorKind>) -> Self {
        match e {
            sled::transaction::TransactionError::Abort(kind) => Self::new(kind),
            sled::transaction::TransactionError::Storage(e) => Self::new(ErrorKind::SledError(e)),
        }
    }
}

impl From<pot::Error> for Error {
    fn from(e: pot::Error) -> Self {
        Self::new(ErrorKind::PotError(e))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::new(ErrorKind::UrlParseError(e))
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::new(ErrorKind::ConfigError(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::StdIoError(e))
    }
}

impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        Self::new(ErrorKind::Infallible(e))
    }
}

impl From<ErrorKind> for Error {
    fn from(k: ErrorKind) -> Self {
        Self::new(k)
    }
}
