use crate::{
    AppState,
    guard::{self, Target},
    i18n,
    identity::AuthError,
    models::{
        ContentRecord, ContentSection, ContentView, DashboardStats, ErrorBody,
        FederatedSignInRequest, Lang, LanguageResponse, LanguageUpdateRequest, LoginRequest,
        PasswordResetRequest, Profile, ProfileResponse, RedirectResponse, RegisterRequest,
        ResetResponse, Role,
        SessionResponse, UpdateProfileRequest, UpdateUserRequest, UpsertContentRequest,
        UserAccount, UserHome, USERS_COLLECTION,
    },
    prefs::LANGUAGE_KEY,
    resolver::Verdict,
    store::StoreError,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Uniform error shape for every fallible endpoint: an HTTP status plus a
/// localized, user-showable message.
pub type ApiError = (StatusCode, Json<ErrorBody>);

// --- Filter Structs ---

/// LangQuery
///
/// Defines the accepted query parameters for locale-sensitive endpoints.
/// `?lang=` overrides the persisted portal preference for one request.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LangQuery {
    pub lang: Option<Lang>,
}

// --- Helpers ---

/// Resolves the locale for one request: explicit request value first, then
/// the persisted portal preference, then the primary locale.
fn portal_lang(state: &AppState, requested: Option<Lang>) -> Lang {
    requested
        .or_else(|| state.prefs.get(LANGUAGE_KEY).and_then(|v| v.parse().ok()))
        .unwrap_or_default()
}

/// Maps an identity failure to its HTTP status. `PopupClosed` never reaches
/// here: a dismissed sign-in window is handled silently upstream.
fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::EmailAlreadyInUse => StatusCode::CONFLICT,
        AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
        AuthError::UserNotFound
        | AuthError::WrongPassword
        | AuthError::InvalidCredential
        | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
        AuthError::Provider(_) => StatusCode::BAD_GATEWAY,
        AuthError::PopupClosed => StatusCode::NO_CONTENT,
    }
}

fn auth_failure(lang: Lang, err: &AuthError) -> ApiError {
    (
        auth_status(err),
        Json(ErrorBody {
            message: i18n::auth_message(lang, err).to_owned(),
        }),
    )
}

fn store_failure(lang: Lang, err: &StoreError) -> ApiError {
    let status = match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::PermissionDenied => StatusCode::FORBIDDEN,
        StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            message: i18n::store_message(lang).to_owned(),
        }),
    )
}

fn validation_failure(lang: Lang) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: i18n::validation_message(lang).to_owned(),
        }),
    )
}

/// Guard backstop for handlers mounted behind a role layer. The route layers
/// are the real gate; this keeps a misconfigured router from leaking data.
fn forbidden() -> ApiError {
    (StatusCode::FORBIDDEN, Json(ErrorBody::default()))
}

/// Flattens an upsert payload into the stored flat wire format. `created_at`
/// is omitted on updates so the merge keeps the original value.
fn content_fields(payload: &UpsertContentRequest, created_at: Option<&str>, updated_at: &str) -> Value {
    let mut fields = json!({
        "title": payload.title.trim(),
        "title_ms": payload.title_ms.as_deref().unwrap_or("").trim(),
        "description": payload.description.trim(),
        "description_ms": payload.description_ms.as_deref().unwrap_or("").trim(),
        "image": payload.image.trim(),
        "link": payload.link.as_deref().unwrap_or("").trim(),
        "updated_at": updated_at,
    });
    if let Some(created) = created_at {
        fields["created_at"] = json!(created);
    }
    fields
}

fn upsert_payload_ok(payload: &UpsertContentRequest) -> bool {
    !payload.title.trim().is_empty()
        && !payload.description.trim().is_empty()
        && !payload.image.trim().is_empty()
}

// --- Entry & Session Handlers ---

/// entry
///
/// [Public Route] The portal entry point. An established session is routed
/// straight to its home; everyone else gets the login page.
pub async fn entry(verdict: Verdict) -> Response {
    match guard::entry_target(&verdict) {
        Some(target) => Redirect::to(target.path()).into_response(),
        None => Json(json!({ "page": "login" })).into_response(),
    }
}

/// login
///
/// [Public Route] Exchanges email/password credentials for a session. The
/// response carries the landing route: administrators land on the admin
/// console, everyone else (including accounts whose role lookup fails) lands
/// on the user dashboard.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed In", body = SessionResponse),
        (status = 401, description = "Bad Credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let lang = portal_lang(&state, payload.lang);
    let handle = state
        .identity
        .sign_in(payload.email.trim(), &payload.password)
        .await
        .map_err(|e| auth_failure(lang, &e))?;

    let session = handle.session.clone();
    let verdict = state.resolver.handle_session_change(Some(session)).await;

    Ok(Json(SessionResponse {
        access_token: handle.access_token,
        uid: handle.session.uid,
        email: handle.session.email,
        redirect_to: Target::home_for(verdict.role()).path().to_owned(),
    }))
}

/// register
///
/// [Public Route] Creates an account with the identity provider, writes the
/// profile document (role `user`), and signs the new account in. New accounts
/// always land on the user dashboard.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = SessionResponse),
        (status = 409, description = "Email In Use", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let lang = portal_lang(&state, payload.lang);
    let name = payload.name.trim();
    if name.chars().count() < 2 {
        return Err(validation_failure(lang));
    }

    let handle = state
        .identity
        .sign_up(payload.email.trim(), &payload.password)
        .await
        .map_err(|e| auth_failure(lang, &e))?;

    let profile = Profile {
        name: Some(name.to_owned()),
        email: handle.session.email.clone(),
        role: Some(Role::User),
    };
    state
        .store
        .set_document(
            USERS_COLLECTION,
            &handle.session.uid.to_string(),
            profile.to_fields(),
        )
        .await
        .map_err(|e| store_failure(lang, &e))?;

    state
        .resolver
        .handle_session_change(Some(handle.session.clone()))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            access_token: handle.access_token,
            uid: handle.session.uid,
            email: handle.session.email,
            redirect_to: Target::UserHome.path().to_owned(),
        }),
    ))
}

/// federated_sign_in
///
/// [Public Route] Completes a federated (Google) sign-in. A window dismissed
/// by the user is not an error: the request reports `cancelled` and the
/// response is an empty 204 with no message. First-time federated accounts
/// get a profile document created on the spot.
#[utoipa::path(
    post,
    path = "/auth/federated",
    request_body = FederatedSignInRequest,
    responses(
        (status = 200, description = "Signed In", body = SessionResponse),
        (status = 204, description = "Window Dismissed"),
        (status = 502, description = "Provider Failure", body = ErrorBody)
    )
)]
pub async fn federated_sign_in(
    State(state): State<AppState>,
    Json(payload): Json<FederatedSignInRequest>,
) -> Response {
    let lang = portal_lang(&state, payload.lang);
    if payload.cancelled {
        return StatusCode::NO_CONTENT.into_response();
    }
    let Some(token) = payload.provider_token else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                message: i18n::federated_message(lang).to_owned(),
            }),
        )
            .into_response();
    };

    let handle = match state.identity.sign_in_federated(&token).await {
        Ok(handle) => handle,
        Err(AuthError::PopupClosed) => return StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            return (
                auth_status(&err),
                Json(ErrorBody {
                    message: i18n::federated_message(lang).to_owned(),
                }),
            )
                .into_response();
        }
    };

    let key = handle.session.uid.to_string();
    match state.store.get_document(USERS_COLLECTION, &key).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let profile = Profile {
                name: None,
                email: handle.session.email.clone(),
                role: Some(Role::User),
            };
            if let Err(err) = state
                .store
                .set_document(USERS_COLLECTION, &key, profile.to_fields())
                .await
            {
                tracing::error!(uid = %handle.session.uid, error = %err, "failed to create federated profile");
            }
        }
        Err(err) => {
            tracing::error!(uid = %handle.session.uid, error = %err, "profile lookup failed during federated sign-in");
        }
    }

    let verdict = state
        .resolver
        .handle_session_change(Some(handle.session.clone()))
        .await;

    Json(SessionResponse {
        access_token: handle.access_token,
        uid: handle.session.uid,
        email: handle.session.email,
        redirect_to: Target::home_for(verdict.role()).path().to_owned(),
    })
    .into_response()
}

/// password_reset
///
/// [Public Route] Asks the identity provider to send a password-reset email.
#[utoipa::path(
    post,
    path = "/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset Email Sent", body = ResetResponse),
        (status = 401, description = "Unknown Email", body = ErrorBody)
    )
)]
pub async fn password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    let lang = portal_lang(&state, payload.lang);
    state
        .identity
        .send_password_reset(payload.email.trim())
        .await
        .map_err(|e| auth_failure(lang, &e))?;
    Ok(Json(ResetResponse {
        message: i18n::reset_sent_message(lang).to_owned(),
    }))
}

/// logout
///
/// [Authenticated Route] Revokes the bearer session (best-effort) and resets
/// the resolver to signed-out. The client lands back on the login page.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Signed Out", body = RedirectResponse))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<RedirectResponse> {
    if let Some(token) = guard::bearer_token(&headers) {
        if let Err(err) = state.identity.sign_out(token).await {
            tracing::warn!(error = %err, "sign-out call to identity provider failed");
        }
    }
    state.resolver.handle_session_change(None).await;
    Json(RedirectResponse {
        redirect_to: Target::Login.path().to_owned(),
    })
}

// --- Language Handlers ---

/// get_language
///
/// [Public Route] Returns the persisted portal language, defaulting to Thai.
#[utoipa::path(
    get,
    path = "/language",
    responses((status = 200, description = "Current Language", body = LanguageResponse))
)]
pub async fn get_language(State(state): State<AppState>) -> Json<LanguageResponse> {
    Json(LanguageResponse {
        language: portal_lang(&state, None),
    })
}

/// set_language
///
/// [Public Route] Persists the portal language preference. Unsupported codes
/// are rejected rather than silently ignored.
#[utoipa::path(
    put,
    path = "/language",
    request_body = LanguageUpdateRequest,
    responses(
        (status = 200, description = "Language Updated", body = LanguageResponse),
        (status = 400, description = "Unsupported Language", body = ErrorBody)
    )
)]
pub async fn set_language(
    State(state): State<AppState>,
    Json(payload): Json<LanguageUpdateRequest>,
) -> Result<Json<LanguageResponse>, ApiError> {
    let Ok(language) = payload.language.parse::<Lang>() else {
        let lang = portal_lang(&state, None);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                message: i18n::unsupported_language_message(lang).to_owned(),
            }),
        ));
    };
    state.prefs.set(LANGUAGE_KEY, language.as_str());
    Ok(Json(LanguageResponse { language }))
}

// --- Profile Handlers ---

/// get_me
///
/// [Authenticated Route] Returns the requesting session's profile. A missing
/// profile document is not an error: the response simply carries no name or
/// role, mirroring how the session itself is treated.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "My Profile", body = ProfileResponse))
)]
pub async fn get_me(
    verdict: Verdict,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Verdict::Authenticated { uid, role } = verdict else {
        return Err((StatusCode::UNAUTHORIZED, Json(ErrorBody::default())));
    };

    let response = match state
        .store
        .get_document(USERS_COLLECTION, &uid.to_string())
        .await
    {
        Ok(Some(doc)) => {
            let profile = Profile::from_fields(&doc.fields);
            ProfileResponse {
                uid,
                name: profile.name,
                email: Some(profile.email).filter(|e| !e.is_empty()),
                role: profile.role,
            }
        }
        Ok(None) => ProfileResponse {
            uid,
            name: None,
            email: None,
            role,
        },
        Err(err) => {
            tracing::error!(uid = %uid, error = %err, "profile read failed");
            ProfileResponse {
                uid,
                name: None,
                email: None,
                role,
            }
        }
    };
    Ok(Json(response))
}

/// update_me
///
/// [Authenticated Route] Lets a session change its own display name. Every
/// sign-up path writes the profile document up front, so a missing document
/// here is anomalous and reported rather than silently recreated without an
/// email.
#[utoipa::path(
    put,
    path = "/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile Updated", body = ProfileResponse),
        (status = 400, description = "Invalid Name", body = ErrorBody),
        (status = 404, description = "No Profile Document", body = ErrorBody)
    )
)]
pub async fn update_me(
    verdict: Verdict,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Verdict::Authenticated { uid, role } = verdict else {
        return Err((StatusCode::UNAUTHORIZED, Json(ErrorBody::default())));
    };
    let lang = portal_lang(&state, None);
    let name = payload.name.trim();
    if name.chars().count() < 2 {
        return Err(validation_failure(lang));
    }

    let key = uid.to_string();
    let patch = json!({ "name": name });
    state
        .store
        .update_document(USERS_COLLECTION, &key, patch)
        .await
        .map_err(|e| store_failure(lang, &e))?;

    let fields = state
        .store
        .get_document(USERS_COLLECTION, &key)
        .await
        .map_err(|e| store_failure(lang, &e))?
        .map(|doc| doc.fields)
        .unwrap_or_default();
    let profile = Profile::from_fields(&fields);

    Ok(Json(ProfileResponse {
        uid,
        name: profile.name,
        email: Some(profile.email).filter(|e| !e.is_empty()),
        role: profile.role.or(role),
    }))
}

// --- User Dashboard Handlers ---

/// user_home
///
/// [User Route] Describes the user dashboard: the content sections it
/// renders, in display order.
#[utoipa::path(
    get,
    path = "/user",
    responses((status = 200, description = "User Dashboard", body = UserHome))
)]
pub async fn user_home() -> Json<UserHome> {
    Json(UserHome {
        sections: ContentSection::ALL.to_vec(),
    })
}

/// get_section_content
///
/// [User Route] Lists one section's content flattened into a single locale,
/// ordered by title. Missing translations fall back to the primary locale.
#[utoipa::path(
    get,
    path = "/user/content/{section}",
    params(LangQuery),
    responses((status = 200, description = "Section Content", body = [ContentView]))
)]
pub async fn get_section_content(
    State(state): State<AppState>,
    Path(section): Path<ContentSection>,
    Query(query): Query<LangQuery>,
) -> Result<Json<Vec<ContentView>>, ApiError> {
    let lang = portal_lang(&state, query.lang);
    let docs = state
        .store
        .query_collection(section.collection(), "title")
        .await
        .map_err(|e| store_failure(lang, &e))?;

    let items = docs
        .iter()
        .map(|doc| ContentRecord::from_fields(doc.key.as_str(), &doc.fields).localize(lang))
        .collect();
    Ok(Json(items))
}

// --- Admin Handlers ---

/// get_admin_stats
///
/// [Admin Route] Counters for the admin console landing page: total accounts
/// plus per-section content counts.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Dashboard Stats", body = DashboardStats))
)]
pub async fn get_admin_stats(
    verdict: Verdict,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    if verdict.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    let lang = portal_lang(&state, None);

    let count = |collection: &'static str, order_by: &'static str| {
        let store = state.store.clone();
        async move {
            store
                .query_collection(collection, order_by)
                .await
                .map(|docs| docs.len() as i64)
        }
    };

    let total_users = count(USERS_COLLECTION, "email")
        .await
        .map_err(|e| store_failure(lang, &e))?;
    let total_explore = count(ContentSection::Explore.collection(), "title")
        .await
        .map_err(|e| store_failure(lang, &e))?;
    let total_museum = count(ContentSection::Museum.collection(), "title")
        .await
        .map_err(|e| store_failure(lang, &e))?;
    let total_herb = count(ContentSection::Herb.collection(), "title")
        .await
        .map_err(|e| store_failure(lang, &e))?;

    Ok(Json(DashboardStats {
        total_users,
        total_explore,
        total_museum,
        total_herb,
    }))
}

/// list_users
///
/// [Admin Route] Lists every account for the admin user table, ordered by
/// email. Documents whose key is not a valid uid are skipped with a warning
/// rather than failing the whole listing.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "User Accounts", body = [UserAccount]))
)]
pub async fn list_users(
    verdict: Verdict,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserAccount>>, ApiError> {
    if verdict.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    let lang = portal_lang(&state, None);

    let docs = state
        .store
        .query_collection(USERS_COLLECTION, "email")
        .await
        .map_err(|e| store_failure(lang, &e))?;

    let accounts = docs
        .iter()
        .filter_map(|doc| match Uuid::parse_str(&doc.key) {
            Ok(id) => {
                let profile = Profile::from_fields(&doc.fields);
                Some(UserAccount {
                    id,
                    name: profile.name,
                    email: profile.email,
                    role: profile.role,
                })
            }
            Err(_) => {
                tracing::warn!(key = %doc.key, "skipping user document with a non-uid key");
                None
            }
        })
        .collect();
    Ok(Json(accounts))
}

/// update_user
///
/// [Admin Route] Partial edit of one account's profile document. Changing
/// `role` here is how an account is promoted; the new role takes effect the
/// next time that account's session is resolved.
#[utoipa::path(
    put,
    path = "/admin/users/{uid}",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User Updated", body = UserAccount),
        (status = 404, description = "No Such User", body = ErrorBody)
    )
)]
pub async fn update_user(
    verdict: Verdict,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    if verdict.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    let lang = portal_lang(&state, None);

    let mut patch = serde_json::Map::new();
    if let Some(name) = &payload.name {
        patch.insert("name".to_owned(), json!(name.trim()));
    }
    if let Some(email) = &payload.email {
        patch.insert("email".to_owned(), json!(email.trim()));
    }
    if let Some(role) = payload.role {
        patch.insert("role".to_owned(), json!(role.as_str()));
    }
    if patch.is_empty() {
        return Err(validation_failure(lang));
    }

    let key = uid.to_string();
    state
        .store
        .update_document(USERS_COLLECTION, &key, Value::Object(patch))
        .await
        .map_err(|e| store_failure(lang, &e))?;

    let fields = state
        .store
        .get_document(USERS_COLLECTION, &key)
        .await
        .map_err(|e| store_failure(lang, &e))?
        .map(|doc| doc.fields)
        .unwrap_or_default();
    let profile = Profile::from_fields(&fields);

    Ok(Json(UserAccount {
        id: uid,
        name: profile.name,
        email: profile.email,
        role: profile.role,
    }))
}

/// delete_user
///
/// [Admin Route] Removes an account's profile document. The identity record
/// at the external provider is out of scope here; a session without a profile
/// simply resolves with no role.
#[utoipa::path(
    delete,
    path = "/admin/users/{uid}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No Such User")
    )
)]
pub async fn delete_user(
    verdict: Verdict,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if verdict.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    let lang = portal_lang(&state, None);

    let deleted = state
        .store
        .delete_document(USERS_COLLECTION, &uid.to_string())
        .await
        .map_err(|e| store_failure(lang, &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

/// list_content
///
/// [Admin Route] Full bilingual listing of one section for the content
/// manager, ordered by title.
#[utoipa::path(
    get,
    path = "/admin/content/{section}",
    responses((status = 200, description = "Section Content", body = [ContentRecord]))
)]
pub async fn list_content(
    verdict: Verdict,
    State(state): State<AppState>,
    Path(section): Path<ContentSection>,
) -> Result<Json<Vec<ContentRecord>>, ApiError> {
    if verdict.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    let lang = portal_lang(&state, None);

    let docs = state
        .store
        .query_collection(section.collection(), "title")
        .await
        .map_err(|e| store_failure(lang, &e))?;
    let records = docs
        .iter()
        .map(|doc| ContentRecord::from_fields(doc.key.as_str(), &doc.fields))
        .collect();
    Ok(Json(records))
}

/// create_content
///
/// [Admin Route] Adds one content item to a section. Title, description and
/// image are required; the Malay translations may be filled in later.
#[utoipa::path(
    post,
    path = "/admin/content/{section}",
    request_body = UpsertContentRequest,
    responses(
        (status = 201, description = "Content Created", body = ContentRecord),
        (status = 400, description = "Missing Required Fields", body = ErrorBody)
    )
)]
pub async fn create_content(
    verdict: Verdict,
    State(state): State<AppState>,
    Path(section): Path<ContentSection>,
    Json(payload): Json<UpsertContentRequest>,
) -> Result<(StatusCode, Json<ContentRecord>), ApiError> {
    if verdict.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    let lang = portal_lang(&state, None);
    if !upsert_payload_ok(&payload) {
        return Err(validation_failure(lang));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let fields = content_fields(&payload, Some(&now), &now);
    state
        .store
        .set_document(section.collection(), &id, fields.clone())
        .await
        .map_err(|e| store_failure(lang, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ContentRecord::from_fields(id, &fields)),
    ))
}

/// update_content
///
/// [Admin Route] Edits one content item in place. `created_at` is preserved;
/// `updated_at` moves to now.
#[utoipa::path(
    put,
    path = "/admin/content/{section}/{id}",
    request_body = UpsertContentRequest,
    responses(
        (status = 200, description = "Content Updated", body = ContentRecord),
        (status = 404, description = "No Such Item", body = ErrorBody)
    )
)]
pub async fn update_content(
    verdict: Verdict,
    State(state): State<AppState>,
    Path((section, id)): Path<(ContentSection, String)>,
    Json(payload): Json<UpsertContentRequest>,
) -> Result<Json<ContentRecord>, ApiError> {
    if verdict.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    let lang = portal_lang(&state, None);
    if !upsert_payload_ok(&payload) {
        return Err(validation_failure(lang));
    }

    let now = Utc::now().to_rfc3339();
    let patch = content_fields(&payload, None, &now);
    state
        .store
        .update_document(section.collection(), &id, patch)
        .await
        .map_err(|e| store_failure(lang, &e))?;

    let fields = state
        .store
        .get_document(section.collection(), &id)
        .await
        .map_err(|e| store_failure(lang, &e))?
        .map(|doc| doc.fields)
        .unwrap_or_default();
    Ok(Json(ContentRecord::from_fields(id, &fields)))
}

/// delete_content
///
/// [Admin Route] Removes one content item from a section.
#[utoipa::path(
    delete,
    path = "/admin/content/{section}/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No Such Item")
    )
)]
pub async fn delete_content(
    verdict: Verdict,
    State(state): State<AppState>,
    Path((section, id)): Path<(ContentSection, String)>,
) -> Result<StatusCode, ApiError> {
    if verdict.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    let lang = portal_lang(&state, None);

    let deleted = state
        .store
        .delete_document(section.collection(), &id)
        .await
        .map_err(|e| store_failure(lang, &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}
