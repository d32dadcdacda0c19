use axum::http::header::WWW_AUTHENTICATE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};

use crate::{Error, ErrorKind};

/// Implements conversion into a plain text response for all possible error
/// variants.
///
/// Backtrace and additional context information are never part of the
/// response and always only available through the application logs.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self.kind {
            ErrorKind::InvalidFileType(_) | ErrorKind::BadInput(_) => {
                tracing::trace!("{}", self);
                (StatusCode::BAD_REQUEST, self.kind.to_string()).into_response()
            }
            ErrorKind::NotFound(_) => {
                tracing::trace!("{}", self);
                (StatusCode::NOT_FOUND, "The image does not exist").into_response()
            }
            ErrorKind::Unauthorized => {
                tracing::debug!("{}", self);
                // Don't tell which of the credentials was wrong, just
                // challenge again.
                (
                    StatusCode::UNAUTHORIZED,
                    AppendHeaders([(WWW_AUTHENTICATE, r#"Basic realm="Login Required""#)]),
                    "Could not verify your access level for that URL.\n\
                    You have to login with proper credentials",
                )
                    .into_response()
            }
            ErrorKind::RemoteUploadFailure(_) => {
                tracing::warn!("{}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed storing the image. Please try again later.",
                )
                    .into_response()
            }
            ErrorKind::CommitFailure(_) | ErrorKind::CodespaceExhausted(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "An error occurred while accessing the database. Please try again later.",
                )
                    .into_response()
            }
            _ => {
                tracing::error!("{}", self);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
