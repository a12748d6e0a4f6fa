use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that require no session: the portal entry point, every
/// sign-in flavour, registration, password reset, and the language
/// preference. The entry route still reads the session if one is presented,
/// so an already-signed-in client is routed straight to its home.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Portal entry. Authenticated sessions are redirected to their home
        // page by resolved role; everyone else is shown the login page.
        .route("/", get(handlers::entry))
        // POST /login
        // Password sign-in against the hosted identity service. The response
        // carries the role-dependent landing route.
        .route("/login", post(handlers::login))
        // POST /register
        // Account creation plus initial profile document (role `user`).
        .route("/register", post(handlers::register))
        // POST /auth/federated
        // Google sign-in completion. A dismissed window is a silent 204.
        .route("/auth/federated", post(handlers::federated_sign_in))
        // POST /password-reset
        // Dispatches a reset email through the identity provider.
        .route("/password-reset", post(handlers::password_reset))
        // GET/PUT /language
        // The portal-wide language preference (th default, ms supported).
        .route(
            "/language",
            get(handlers::get_language).put(handlers::set_language),
        )
}
