use heritage_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    identity::{HostedIdentityClient, IdentityState, MemoryIdentity},
    models::{Profile, Role, USERS_COLLECTION},
    prefs::{FilePreferences, PrefState},
    resolver::SessionResolver,
    store::{DocumentStore, MemoryStore, PostgresStore, StoreState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point, responsible for initializing all core
/// components: Configuration, Logging, Store, Identity, Resolver, and the
/// HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production secrets.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes RUST_LOG, falling back to sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "heritage_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Store & Identity Initialization
    // Production talks to Postgres and the hosted identity API; local runs
    // stay fully in-process so the portal works without infrastructure.
    let (store, identity): (StoreState, IdentityState) = match config.env {
        Env::Production => {
            let db_url = config
                .db_url
                .as_deref()
                .expect("FATAL: DATABASE_URL required in production");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
            let store = PostgresStore::new(pool);
            store
                .ensure_schema()
                .await
                .expect("FATAL: Failed to prepare the documents table.");

            let identity = HostedIdentityClient::new(
                &config.identity_url,
                &config.identity_api_key,
                &config.jwt_secret,
            );
            (Arc::new(store) as StoreState, Arc::new(identity) as IdentityState)
        }
        Env::Local => {
            let store = MemoryStore::new();
            let identity = MemoryIdentity::new(config.jwt_secret.clone());

            // Seed one administrator so the admin console is reachable out
            // of the box.
            let uid = identity.register_account("admin@portal.local", "admin123");
            let profile = Profile {
                name: Some("Local Admin".to_owned()),
                email: "admin@portal.local".to_owned(),
                role: Some(Role::Admin),
            };
            store
                .set_document(USERS_COLLECTION, &uid.to_string(), profile.to_fields())
                .await
                .expect("memory store writes cannot fail");
            tracing::info!("Seeded local admin account admin@portal.local / admin123");

            (Arc::new(store) as StoreState, Arc::new(identity) as IdentityState)
        }
    };

    // 5. Resolver & Preferences Initialization
    let resolver = Arc::new(SessionResolver::new(store.clone()));
    let prefs = Arc::new(FilePreferences::load(&config.prefs_path)) as PrefState;

    // 6. Unified State Assembly
    let app_state = AppState {
        store,
        identity,
        resolver,
        prefs,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
