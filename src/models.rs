use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::str::FromStr;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Store collection holding one profile document per session `uid`.
pub const USERS_COLLECTION: &str = "users";

// --- Core Application Schemas (Mapped to the Document Store) ---

/// Role
///
/// The RBAC field carried by profile documents. Documents written before the
/// role model existed have no role at all, which the rest of the system models
/// as `Option<Role>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lang
///
/// Supported portal locales. Thai is the primary locale and the fallback for
/// every missing translation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    TS,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Lang {
    #[default]
    Th,
    Ms,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Th => "th",
            Lang::Ms => "ms",
        }
    }
}

impl FromStr for Lang {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "th" => Ok(Lang::Th),
            "ms" => Ok(Lang::Ms),
            _ => Err(()),
        }
    }
}

/// LocalizedText
///
/// A mapping from locale code to localized value. Resolution falls back to the
/// primary locale (Thai) when the requested translation is absent or empty,
/// so a record authored in one language still renders everywhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LocalizedText(pub BTreeMap<Lang, String>);

impl LocalizedText {
    /// Creates a text carrying only the primary-locale value.
    pub fn new(primary: impl Into<String>) -> Self {
        let mut texts = BTreeMap::new();
        texts.insert(Lang::Th, primary.into());
        LocalizedText(texts)
    }

    /// Builder-style insertion of one translation. Empty strings are skipped
    /// so that blank form fields never shadow the fallback.
    pub fn with(mut self, lang: Lang, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.0.insert(lang, text);
        }
        self
    }

    /// Resolves the value for `lang`, defaulting to the primary locale.
    pub fn get(&self, lang: Lang) -> &str {
        self.0
            .get(&lang)
            .filter(|t| !t.is_empty())
            .or_else(|| self.0.get(&Lang::Th))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// The primary-locale value, used for store-side ordering.
    pub fn primary(&self) -> &str {
        self.get(Lang::Th)
    }
}

/// Profile
///
/// The stored record of a session's role and display attributes, kept in the
/// `users` collection keyed by the session `uid`. `role` is optional: legacy
/// documents predate the role model, and an empty-string role counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Profile {
    pub name: Option<String>,
    pub email: String,
    pub role: Option<Role>,
}

impl Profile {
    /// Reads a profile out of raw document fields. Unknown or empty role
    /// strings resolve to `None` rather than failing the whole document.
    pub fn from_fields(fields: &Value) -> Self {
        Profile {
            name: fields
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
            email: fields
                .get("email")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            role: fields
                .get("role")
                .and_then(Value::as_str)
                .filter(|r| !r.is_empty())
                .and_then(|r| r.parse().ok()),
        }
    }

    pub fn to_fields(&self) -> Value {
        json!({
            "name": self.name.clone().unwrap_or_default(),
            "email": self.email,
            "role": self.role.map(|r| r.as_str().to_owned()).unwrap_or_default(),
        })
    }
}

/// ContentSection
///
/// The three named content collections rendered on the user dashboard and
/// managed from the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContentSection {
    Explore,
    Museum,
    Herb,
}

impl ContentSection {
    pub const ALL: [ContentSection; 3] = [
        ContentSection::Explore,
        ContentSection::Museum,
        ContentSection::Herb,
    ];

    /// The store collection backing this section.
    pub fn collection(&self) -> &'static str {
        match self {
            ContentSection::Explore => "content_explore",
            ContentSection::Museum => "content_museum",
            ContentSection::Herb => "content_herb",
        }
    }
}

/// ContentRecord
///
/// One bilingual content item as managed from the admin console. The store
/// keeps the flat `title`/`title_ms` wire format for compatibility with
/// existing data; this struct is the structured view of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContentRecord {
    /// Store-assigned document key.
    pub id: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    /// Image URL.
    pub image: String,
    /// Optional external link.
    pub link: Option<String>,
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContentRecord {
    /// Rehydrates a record from the flat stored fields.
    pub fn from_fields(id: impl Into<String>, fields: &Value) -> Self {
        let text_pair = |primary: &str, secondary: &str| {
            LocalizedText::new(
                fields
                    .get(primary)
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
            )
            .with(
                Lang::Ms,
                fields
                    .get(secondary)
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
            )
        };
        let timestamp = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc))
        };

        ContentRecord {
            id: id.into(),
            title: text_pair("title", "title_ms"),
            description: text_pair("description", "description_ms"),
            image: fields
                .get("image")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            link: fields
                .get("link")
                .and_then(Value::as_str)
                .filter(|l| !l.is_empty())
                .map(str::to_owned),
            created_at: timestamp("created_at"),
            updated_at: timestamp("updated_at"),
        }
    }

    /// Flattens a record into a single locale for the end-user dashboard.
    pub fn localize(&self, lang: Lang) -> ContentView {
        ContentView {
            id: self.id.clone(),
            title: self.title.get(lang).to_owned(),
            description: self.description.get(lang).to_owned(),
            image: self.image.clone(),
            link: self.link.clone(),
        }
    }
}

/// ContentView
///
/// A content item flattened into one locale for the user dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContentView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub link: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// Input payload for the login endpoint (POST /login). `lang` selects the
/// locale for any user-visible error message.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub lang: Option<Lang>,
}

/// Input payload for registration (POST /register). The password only passes
/// through to the external identity provider and is never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub lang: Option<Lang>,
}

/// Input payload for federated sign-in (POST /auth/federated). `cancelled`
/// marks a sign-in window dismissed by the user, which is not an error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FederatedSignInRequest {
    pub provider_token: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
    pub lang: Option<Lang>,
}

/// Input payload for password-reset dispatch (POST /password-reset).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PasswordResetRequest {
    pub email: String,
    pub lang: Option<Lang>,
}

/// Input payload for the owner's profile edit (PUT /me). Owners may change
/// their display name only; everything else is admin territory.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// Partial update payload for the admin user editor (PUT /admin/users/{uid}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Input payload for creating or replacing one content item. Field names
/// mirror the stored flat wire format.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpsertContentRequest {
    pub title: String,
    pub title_ms: Option<String>,
    pub description: String,
    pub description_ms: Option<String>,
    pub image: String,
    pub link: Option<String>,
}

/// Input payload for changing the portal language preference (PUT /language).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LanguageUpdateRequest {
    pub language: String,
}

// --- Response Schemas (Output) ---

/// Output of every sign-in flavoured endpoint: the session token plus the
/// landing route the client should navigate to.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionResponse {
    pub access_token: String,
    pub uid: Uuid,
    pub email: String,
    pub redirect_to: String,
}

/// Output schema for the authenticated user's own profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileResponse {
    pub uid: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// One row of the admin console's user table (GET /admin/users).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub role: Option<Role>,
}

/// Output schema for the administrative dashboard counters.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_explore: i64,
    pub total_museum: i64,
    pub total_herb: i64,
}

/// Output schema of the user home (GET /user): the sections the dashboard
/// renders, in display order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserHome {
    pub sections: Vec<ContentSection>,
}

/// Current portal language preference.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LanguageResponse {
    pub language: Lang,
}

/// Confirmation payload for password-reset dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ResetResponse {
    pub message: String,
}

/// Landing route after an action that ends the page's session state.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RedirectResponse {
    pub redirect_to: String,
}

/// Localized, user-visible error message. Raw provider codes never cross this
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorBody {
    pub message: String,
}
