use axum::{body::Body, http::Request, middleware::Next, response::Response};
use uuid::Uuid;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;

/// Middleware that materializes the caller identity forwarded by the
/// authenticating gateway (`x-user-id` / `x-user-role` headers) and attaches
/// it to the request extensions. Session issuance and token validation happen
/// upstream; a request without these headers never reached the gateway.
pub async fn identity_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = user_from_headers(&request)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn user_from_headers<B>(request: &Request<B>) -> Result<User, AppError> {
    let id_header = request
        .headers()
        .get("x-user-id")
        .ok_or_else(|| AppError::Auth("Missing x-user-id header".to_string()))?;

    let id = id_header
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| AppError::Auth("Invalid x-user-id header".to_string()))?;

    let role_header = request
        .headers()
        .get("x-user-role")
        .ok_or_else(|| AppError::Auth("Missing x-user-role header".to_string()))?;

    let role: Role = role_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid x-user-role header".to_string()))?
        .parse()
        .map_err(|e: String| AppError::Auth(e))?;

    Ok(User { id, role })
}
