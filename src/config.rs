use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed
/// to be immutable once loaded, ensuring consistency across all services
/// (identity client, document store, resolver). It is pulled into the
/// application state via FromRef.
#[derive(Clone)]
pub struct AppConfig {
    /// Runtime environment marker. Controls in-process vs hosted backends and
    /// the development auth bypass.
    pub env: Env,
    /// Base URL of the hosted identity provider project.
    pub identity_url: String,
    /// Public API key sent with every identity provider request. Not a secret
    /// by design (the provider scopes it to client operations).
    pub identity_api_key: String,
    /// Secret used to verify the HS256 session tokens the provider issues.
    pub jwt_secret: String,
    /// Postgres connection string backing the document store. Only required
    /// in production; local runs use the in-memory store.
    pub db_url: Option<String>,
    /// Path of the JSON file persisting the portal language preference.
    pub prefs_path: String,
}

/// Env
///
/// Defines the runtime context, used to switch between in-process development
/// backends (memory store/identity, auth bypass) and the hosted production
/// infrastructure (Postgres, hosted identity API).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Provides a safe, non-panicking AppConfig instance primarily used for
    /// test setup, without requiring any environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            identity_url: "http://localhost:9999".to_string(),
            identity_api_key: "local-anon-key".to_string(),
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            db_url: None,
            prefs_path: "portal-preferences.json".to_string(),
        }
    }
}

impl AppConfig {
    /// The canonical function for initializing the application configuration
    /// at startup. Project identifiers and the API key carry literal fallback
    /// defaults; production-only secrets follow the fail-fast principle.
    ///
    /// # Panics
    /// Panics if a critical environment variable required in production is
    /// not set, preventing a start with an incomplete configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // Identity project identifiers: env vars with literal fallbacks, the
        // same convention the frontend build uses.
        let identity_url = env::var("PORTAL_AUTH_URL")
            .unwrap_or_else(|_| "https://project-webapp-da8c5.supabase.co".to_string());
        let identity_api_key =
            env::var("PORTAL_API_KEY").unwrap_or_else(|_| "anon-project-webapp-da8c5".to_string());
        let prefs_path = env::var("PORTAL_PREFS_PATH")
            .unwrap_or_else(|_| "portal-preferences.json".to_string());

        // The production JWT secret is mandatory and must be explicitly set.
        let jwt_secret = match env {
            Env::Production => env::var("PORTAL_JWT_SECRET")
                .expect("FATAL: PORTAL_JWT_SECRET must be set in production."),
            _ => env::var("PORTAL_JWT_SECRET")
                .unwrap_or_else(|_| "super-secure-test-secret-value-local".to_string()),
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
            ),
            Env::Local => env::var("DATABASE_URL").ok(),
        };

        Self {
            env,
            identity_url,
            identity_api_key,
            jwt_secret,
            db_url,
            prefs_path,
        }
    }
}
