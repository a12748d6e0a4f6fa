use crate::{AppState, guard, handlers};
use axum::{
    Router, middleware,
    routing::{get, put},
};

/// Admin Router Module
///
/// The admin console: account management, content management, and dashboard
/// counters. The `require_admin` layer sends a signed-in non-admin to the
/// user dashboard and an anonymous request to the login page, so nothing
/// below it ever renders for the wrong audience. The handlers repeat the
/// role check as a backstop.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // GET /admin
        // Console landing page. Serves the same counters as /admin/stats so
        // the landing redirect always has content behind it.
        .route("/", get(handlers::get_admin_stats))
        // GET /admin/stats
        // Dashboard counters: total accounts plus per-section item counts.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/users
        // The account table, ordered by email.
        .route("/users", get(handlers::list_users))
        // PUT/DELETE /admin/users/{uid}
        // Partial profile edit (including role promotion) and removal. A
        // promoted role takes effect on that account's next resolution.
        .route(
            "/users/{uid}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        // GET/POST /admin/content/{section}
        // Bilingual listing and creation for one content section.
        .route(
            "/content/{section}",
            get(handlers::list_content).post(handlers::create_content),
        )
        // PUT/DELETE /admin/content/{section}/{id}
        // In-place edit (preserving created_at) and deletion of one item.
        .route(
            "/content/{section}/{id}",
            put(handlers::update_content).delete(handlers::delete_content),
        )
        .route_layer(middleware::from_fn_with_state(state, guard::require_admin))
}
