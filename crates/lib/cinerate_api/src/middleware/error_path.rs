//! Stamps the request path onto error payloads.

use axum::{
    Json,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::models::ErrorResponse;

/// Axum middleware: rewrites [`ErrorResponse`] bodies produced by
/// [`AppError`](crate::error::AppError) to include the request path.
pub async fn attach_error_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<ErrorResponse>() {
        Some(mut body) => {
            body.path = Some(path);
            (response.status(), Json(body)).into_response()
        }
        None => response,
    }
}
