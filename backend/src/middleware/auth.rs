use std::sync::Arc;

use aide::OperationIo;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::{
    jwt::{Claims, JwtManager},
    types::{AppError, Environment},
};

/// Authenticated caller, resolved once per request by [`auth_middleware`]
#[derive(Debug, Clone, PartialEq, Eq, OperationIo)]
pub struct AuthenticatedUser {
    /// The user ID from the JWT subject
    pub user_id: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }
}

/// Axum extractor for authenticated user
///
/// Only usable on routes behind [`auth_middleware`]:
/// ```ignore
/// async fn protected_handler(user: AuthenticatedUser) -> Result<impl IntoResponse, AppError> {
///     Ok(format!("Hello {}", user.user_id))
/// }
/// ```
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            AppError::new(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authentication required but user not found in request extensions",
                false,
            )
        })
    }
}

/// JWT Authentication middleware
///
/// This middleware:
/// 1. Extracts Bearer token from Authorization header
/// 2. Validates JWT using `JwtManager`
/// 3. Adds `AuthenticatedUser` to request extensions
/// 4. Returns 401 for invalid/missing tokens
///
/// In development, `DISABLE_AUTH=true` skips verification and uses the token as the user ID.
///
/// # Errors
///
/// - `AppError` - Invalid/missing token with 401 status code
pub async fn auth_middleware(
    Extension(jwt_manager): Extension<Arc<JwtManager>>,
    Extension(environment): Extension<Environment>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::new(
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Authorization header must contain a valid Bearer token",
                false,
            )
        })?;

    let user = if environment.disable_auth() {
        AuthenticatedUser {
            user_id: token.to_string(),
        }
    } else {
        let claims = jwt_manager
            .validate(token, environment.jwt_issued_after())
            .map_err(|err| {
                tracing::debug!("Rejected token: {err}");
                AppError::new(
                    StatusCode::UNAUTHORIZED,
                    "invalid_token",
                    "Invalid or expired token",
                    false,
                )
            })?;
        AuthenticatedUser::from(claims)
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, middleware, routing::get, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn whoami(user: AuthenticatedUser) -> String {
        user.user_id
    }

    fn router(environment: Environment, jwt_manager: Arc<JwtManager>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn(auth_middleware))
            .layer(Extension(environment))
            .layer(Extension(jwt_manager))
    }

    async fn call(router: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut request = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        let response = router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let jwt_manager = Arc::new(JwtManager::new("secret"));
        let token = jwt_manager.issue_token("user-42").unwrap();

        let (status, body) = call(
            router(Environment::Staging, jwt_manager),
            Some(&format!("Bearer {token}")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user-42");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_rejected() {
        let jwt_manager = Arc::new(JwtManager::new("secret"));

        for header in [None, Some("Basic abc"), Some("Bearer   ")] {
            let (status, body) = call(router(Environment::Staging, jwt_manager.clone()), header).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(body.contains("missing_token"));
        }
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let token = JwtManager::new("other").issue_token("user-42").unwrap();

        let (status, body) = call(
            router(Environment::Staging, Arc::new(JwtManager::new("secret"))),
            Some(&format!("Bearer {token}")),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("invalid_token"));
    }

    #[tokio::test]
    async fn test_disabled_auth_trusts_token_as_user_id() {
        let (status, body) = call(
            router(
                Environment::Development { disable_auth: true },
                Arc::new(JwtManager::new("secret")),
            ),
            Some("Bearer dev-user"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "dev-user");
    }
}
