//! Operator-only routes.

use axum::extract::{Path, Query};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Extension;

use crate::{routes, ErrorKind, Result};

use super::{Admin, Router, ServiceExt};

pub fn router() -> Router {
    Router::new().route(routes::DELETE, get(delete_query))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub filename: Option<String>,
    pub redirect: Option<String>,
}

/// `GET /delete?filename=<shortcode>[&redirect=<target>]`
pub async fn delete_query(
    admin: Admin,
    Extension(service): ServiceExt,
    Query(query): Query<DeleteQuery>,
) -> Result<Response> {
    let shortcode = query
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ErrorKind::BadInput("Invalid URL Parameters".to_string()))?;

    service.delete(&shortcode).await?;
    tracing::debug!(operator = %admin.username, %shortcode, "deleted over http");

    // Only ever redirect within the application.
    match query
        .redirect
        .as_deref()
        .map(|r| r.trim_matches('/'))
        .filter(|r| !r.is_empty() && !r.contains('\\'))
    {
        Some(target) => Ok(Redirect::to(&format!("/{}/", target)).into_response()),
        None => Ok("The file has been deleted".into_response()),
    }
}

/// `DELETE /<shortcode>`, registered with the image routes.
pub async fn delete_path(
    admin: Admin,
    Path(shortcode): Path<String>,
    Extension(service): ServiceExt,
) -> Result<Response> {
    service.delete(&shortcode).await?;
    tracing::debug!(operator = %admin.username, %shortcode, "deleted over http");
    Ok("The file has been deleted".into_response())
}
