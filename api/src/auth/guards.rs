use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

#[derive(serde::Serialize, Default)]
pub struct Empty;

/// Rejects unauthenticated requests with 401 and hands the verified
/// [`AuthUser`] to handlers through the request extensions.
pub async fn allow_authenticated(req: Request<Body>, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    let user = match AuthUser::from_request_parts(&mut parts, &()).await {
        Ok(user) => user,
        Err((status, message)) => {
            return (status, Json(ApiResponse::<Empty>::error(message))).into_response();
        }
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user);
    next.run(req).await
}
