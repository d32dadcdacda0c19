use axum::extract::{Multipart, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Extension, Json};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use crate::{routes, Error, ErrorKind, Listing, Result};

use super::{Router, ServiceExt};

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

pub fn router() -> Router {
    Router::new()
        .route(routes::HOME, get(home))
        .route(routes::UPLOAD, post(upload))
        .route(routes::LIST, get(list))
        .route(routes::IMAGE, get(image).delete(super::admin::delete_path))
        .route(&format!("{}/", routes::IMAGE), get(image))
}

pub async fn home(Extension(service): ServiceExt) -> impl IntoResponse {
    format!(
        "{} running on {}",
        service.config.name, service.config.app_path
    )
}

/// Accepts a multipart upload, responding with the public link. The file is
/// streamed into staging as it arrives.
pub async fn upload(
    Extension(service): ServiceExt,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ErrorKind::BadInput(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ErrorKind::BadInput("no file name was provided".to_string()))?;

        let reader = StreamReader::new(
            field.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.body_text())),
        );
        tokio::pin!(reader);

        let uploaded = service
            .upload(&mut reader, &filename)
            .await
            .map_err(|e| match e.kind {
                // the request body broke off or exceeded the size limit
                ErrorKind::StdIoError(io) if io.kind() == std::io::ErrorKind::InvalidData => {
                    Error::new(ErrorKind::BadInput(io.to_string()))
                }
                kind => Error::new(kind),
            })?;
        return Ok((StatusCode::CREATED, uploaded.link));
    }

    Err(ErrorKind::BadInput("no file was provided".to_string()).into())
}

pub async fn list(Extension(service): ServiceExt) -> Result<Json<Vec<Listing>>> {
    Ok(Json(service.list()?))
}

/// Sends the client over to the object store.
pub async fn image(
    Path(shortcode): Path<String>,
    Extension(service): ServiceExt,
) -> Result<impl IntoResponse> {
    let resolved = service.resolve(&shortcode)?;
    Ok(Redirect::temporary(resolved.remote_url.as_str()))
}
