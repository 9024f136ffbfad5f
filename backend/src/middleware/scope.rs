//! Tenant scope middleware
//!
//! Authentication happens upstream at the API gateway; by the time a request
//! reaches this service it carries the authenticated company and user ids as
//! trusted headers. This middleware extracts them and makes them available to
//! handlers, which pass them explicitly into every service call.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ErrorDetail, ErrorResponse};

/// Header carrying the authenticated company id
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// Header carrying the authenticated acting user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Tenant scope extracted from gateway headers
#[derive(Clone, Debug)]
pub struct ScopeContext {
    pub company_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
}

/// Middleware that extracts the tenant scope from request headers
pub async fn scope_middleware(mut request: Request<Body>, next: Next) -> Response {
    let company_id = match header_uuid(&request, COMPANY_ID_HEADER) {
        Ok(id) => id,
        Err(msg) => return unauthorized_response(&msg),
    };

    let user_id = match header_uuid(&request, USER_ID_HEADER) {
        Ok(id) => id,
        Err(msg) => return unauthorized_response(&msg),
    };

    request.extensions_mut().insert(ScopeContext {
        company_id,
        user_id,
    });

    next.run(request).await
}

fn header_uuid(request: &Request<Body>, name: &str) -> Result<uuid::Uuid, String> {
    let value = request
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| format!("Missing {} header", name))?;

    uuid::Uuid::parse_str(value).map_err(|_| format!("Invalid {} header", name))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for the current tenant scope
/// Use this in handlers to get the authenticated company and user ids
#[derive(Clone, Debug)]
pub struct CurrentScope(pub ScopeContext);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentScope
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ScopeContext>()
            .cloned()
            .map(CurrentScope)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Tenant scope required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
