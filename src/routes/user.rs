use crate::{AppState, guard, handlers};
use axum::{Router, middleware, routing::get};

/// User Dashboard Router Module
///
/// The end-user portal pages: the dashboard index and the per-section
/// localized content listings. The `require_user` layer redirects a signed-in
/// administrator to the admin console, a session with no determined role to
/// the login route, and anonymous requests likewise to login.
pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // GET /user
        // Dashboard description: the content sections in display order.
        .route("/", get(handlers::user_home))
        // GET /user/content/{section}?lang=...
        // One section's items flattened into a single locale, ordered by
        // title. `?lang=` overrides the portal preference per request.
        .route("/content/{section}", get(handlers::get_section_content))
        .route_layer(middleware::from_fn_with_state(state, guard::require_user))
}
