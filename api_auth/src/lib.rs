use middleware::auth::AuthMiddleware;

pub mod middleware {
    pub mod auth;
}

/// Authenticates the caller and hands a reconciled `User` to the handlers.
pub fn auth_middleware(jwt_secret: &str) -> AuthMiddleware {
    AuthMiddleware::new(jwt_secret.to_string())
}
