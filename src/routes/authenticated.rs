use crate::{AppState, guard, handlers};
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes available to any established session, whatever its role: the
/// session's own profile and sign-out. The `require_session` layer redirects
/// unauthenticated requests to the login page before any handler runs; the
/// layer needs the application state to verify bearer tokens, so it is
/// attached here with the state passed down from `create_router`.
pub fn authenticated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // GET/PUT /me
        // The session's own profile. Owners may only change their display
        // name; role and email edits are admin console territory.
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        // POST /logout
        // Revokes the session at the provider and resets the resolver.
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(
            state,
            guard::require_session,
        ))
}
