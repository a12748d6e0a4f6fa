use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    response::Redirect,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod config;
pub mod guard;
pub mod handlers;
pub mod i18n;
pub mod identity;
pub mod models;
pub mod prefs;
pub mod resolver;
pub mod store;

// Module for routing segregation (Public, Authenticated, User, Admin).
pub mod routes;
use routes::{admin, authenticated, public, user};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::{AppConfig, Env};
pub use identity::{HostedIdentityClient, IdentityState, MemoryIdentity};
pub use prefs::{FilePreferences, MemoryPreferences, PrefState};
pub use resolver::{ResolverState, SessionResolver, Verdict};
pub use store::{MemoryStore, PostgresStore, StoreState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the portal.
/// It aggregates all paths and schemas decorated with the `#[utoipa::path]`
/// and `#[derive(utoipa::ToSchema)]` macros. The resulting JSON is served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::register, handlers::federated_sign_in,
        handlers::password_reset, handlers::logout,
        handlers::get_language, handlers::set_language,
        handlers::get_me, handlers::update_me,
        handlers::user_home, handlers::get_section_content,
        handlers::get_admin_stats, handlers::list_users, handlers::update_user,
        handlers::delete_user, handlers::list_content, handlers::create_content,
        handlers::update_content, handlers::delete_content
    ),
    components(
        schemas(
            models::Role, models::Lang, models::LocalizedText, models::ContentSection,
            models::ContentRecord, models::ContentView,
            models::LoginRequest, models::RegisterRequest, models::FederatedSignInRequest,
            models::PasswordResetRequest, models::UpdateProfileRequest,
            models::UpdateUserRequest, models::UpsertContentRequest,
            models::LanguageUpdateRequest,
            models::SessionResponse, models::ProfileResponse, models::UserAccount,
            models::DashboardStats, models::UserHome, models::LanguageResponse,
            models::ResetResponse, models::RedirectResponse, models::ErrorBody,
        )
    ),
    tags(
        (name = "heritage-portal", description = "Role-based heritage content portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding every application
/// service and the loaded configuration. Shared across all requests.
#[derive(Clone)]
pub struct AppState {
    /// Document store: schema-less collections behind a trait object.
    pub store: StoreState,
    /// Hosted identity provider: credential handling and token verification.
    pub identity: IdentityState,
    /// Session resolver: the one place session changes become verdicts.
    pub resolver: ResolverState,
    /// Small persisted client-visible settings (the language preference).
    pub prefs: PrefState,
    /// Loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These let handlers and the guard extractor selectively pull components from
// the shared AppState.

impl FromRef<AppState> for StoreState {
    fn from_ref(app_state: &AppState) -> StoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for ResolverState {
    fn from_ref(app_state: &AppState) -> ResolverState {
        app_state.resolver.clone()
    }
}

impl FromRef<AppState> for PrefState {
    fn from_ref(app_state: &AppState) -> PrefState {
        app_state.prefs.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the portal's routing structure, applies global and scoped
/// middleware, and registers the application state. Role gates live on the
/// route modules themselves; unknown paths fall back to the entry redirect
/// so a stale client link always lands somewhere sensible.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: entry, auth flows, language. No gate.
        .merge(public::public_routes())
        // Authenticated Routes: any established session.
        .merge(authenticated::authenticated_routes(state.clone()))
        // User Dashboard: any established session, nested under /user.
        .nest("/user", user::user_routes(state.clone()))
        // Admin Console: resolved role `admin` only, nested under /admin.
        .nest("/admin", admin::admin_routes(state.clone()))
        // Unknown paths land back on the entry route.
        .fallback(|| async { Redirect::to("/") })
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the whole request/response lifecycle
                // in a span carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: returns x-request-id to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes `TraceLayer` span creation: the `x-request-id` header (when
/// present) is included alongside the HTTP method and URI so every log line
/// for one request correlates by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
