//! Bearer-token authentication middleware
//!
//! Validates HS256 JWTs on every request except `/health`. The token's `sub`
//! claim carries the user id, which is inserted into request extensions for
//! handlers. An empty shared secret disables validation entirely (test mode);
//! requests then run as a fixed all-zero user id.

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

/// The authenticated caller, available to handlers via request extensions
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// JWT claims we require
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Tower layer for bearer-token authentication
///
/// An empty `jwt_secret` disables authentication (used by tests).
#[derive(Clone)]
pub struct AuthLayer {
    pub jwt_secret: String,
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            jwt_secret: self.jwt_secret.clone(),
        }
    }
}

/// Tower service that performs token validation
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    jwt_secret: String,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let jwt_secret = self.jwt_secret.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Health endpoint is unauthenticated
            if request.uri().path() == "/health" {
                return inner.call(request).await;
            }

            if jwt_secret.is_empty() {
                tracing::debug!("API authentication disabled (empty secret)");
                let mut request = request;
                request.extensions_mut().insert(AuthUser(Uuid::nil()));
                return inner.call(request).await;
            }

            let mut request = request;
            match validate_bearer(&request, &jwt_secret) {
                Ok(user) => {
                    request.extensions_mut().insert(user);
                    inner.call(request).await
                }
                Err(response) => Ok(response),
            }
        })
    }
}

fn validate_bearer(request: &Request<Body>, jwt_secret: &str) -> Result<AuthUser, Response> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            auth_error_response("missing_token", "Authorization header is required")
        })?;

    let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
        auth_error_response("invalid_token", "Authorization header must be a bearer token")
    })?;

    let key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::default()).map_err(|err| {
        match err.kind() {
            ErrorKind::ExpiredSignature => {
                auth_error_response("token_expired", "Bearer token has expired")
            }
            _ => auth_error_response("invalid_token", "Bearer token is invalid"),
        }
    })?;

    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| auth_error_response("invalid_token", "Token subject is not a user id"))?;

    Ok(AuthUser(user_id))
}

fn auth_error_response(code: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(secret: &str, sub: &str, exp: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn request_with_auth(value: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/projects");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_valid_token_yields_user_id() {
        let user_id = Uuid::new_v4();
        let token = make_token(
            "secret",
            &user_id.to_string(),
            Utc::now().timestamp() + 3600,
        );

        let request = request_with_auth(Some(&format!("Bearer {token}")));
        let user = validate_bearer(&request, "secret").expect("should validate");
        assert_eq!(user.0, user_id);
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let request = request_with_auth(None);
        assert!(validate_bearer(&request, "secret").is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = make_token(
            "other-secret",
            &Uuid::new_v4().to_string(),
            Utc::now().timestamp() + 3600,
        );
        let request = request_with_auth(Some(&format!("Bearer {token}")));
        assert!(validate_bearer(&request, "secret").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = make_token(
            "secret",
            &Uuid::new_v4().to_string(),
            Utc::now().timestamp() - 3600,
        );
        let request = request_with_auth(Some(&format!("Bearer {token}")));
        assert!(validate_bearer(&request, "secret").is_err());
    }
}
