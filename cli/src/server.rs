use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info};

use fitflow_core::generation::{RetryPolicy, TextGenerator, generate_with_retry};
use fitflow_core::models::{
    EquipmentCategory, EquipmentItem, FoodPreference, HistoryEntry, NewEquipment,
    NewFoodPreference, PreferenceType, Profile, ProfileInput, validate_profile_input,
    validate_user_name, validate_weight,
};
use fitflow_core::service::{FitFlowService, HISTORY_FETCH_LIMIT};
use fitflow_core::session::SessionContext;

use crate::sessions::SessionStore;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB
const MAX_HISTORY_LIMIT: i64 = 100;

struct AppState<G> {
    svc: Arc<Mutex<FitFlowService>>,
    sessions: Arc<Mutex<SessionStore>>,
    generator: Arc<G>,
    policy: RetryPolicy,
    api_key: Option<String>,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            svc: Arc::clone(&self.svc),
            sessions: Arc::clone(&self.sessions),
            generator: Arc::clone(&self.generator),
            policy: self.policy,
            api_key: self.api_key.clone(),
        }
    }
}

impl<G> AppState<G> {
    fn service(&self) -> MutexGuard<'_, FitFlowService> {
        self.svc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sessions(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self, id: &str) -> Result<SessionContext, ApiError> {
        self.sessions()
            .get_mut(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))
    }
}

// --- Request / Response types ---

#[derive(Serialize)]
struct UserSummary {
    user_name: String,
    configured: bool,
}

#[derive(Deserialize)]
struct RenameRequest {
    new_name: String,
}

#[derive(Deserialize)]
struct WeightRequest {
    weight_lbs: i64,
}

#[derive(Deserialize)]
struct CreateEquipmentRequest {
    name: String,
    category: EquipmentCategory,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct CreateFoodPreferenceRequest {
    item_name: String,
    preference_type: PreferenceType,
    nutritional_goal: Option<String>,
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct SelectUserRequest {
    user_name: String,
}

#[derive(Serialize)]
struct GenerationResponse {
    text: String,
    notices: Vec<String>,
}

#[derive(Serialize)]
struct SaveHistoryResponse {
    saved: bool,
    entry: Option<HistoryEntry>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_request(err: &anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err:#}"))
}

fn profile_not_found(name: &str) -> ApiError {
    ApiError::NotFound(format!("Profile '{name}' not found"))
}

// --- Middleware ---

async fn require_auth<G>(State(state): State<AppState<G>>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Profile handlers ---

async fn list_users<G>(State(state): State<AppState<G>>) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let svc = state.service();
    let mut users = Vec::new();
    for user_name in svc.display_user_names().context("database error")? {
        let configured = svc
            .get_profile(&user_name)
            .context("database error")?
            .is_some_and(|p| p.is_configured());
        users.push(UserSummary {
            user_name,
            configured,
        });
    }
    Ok(Json(users))
}

async fn get_profile<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let svc = state.service();
    svc.get_profile(&name)
        .context("database error")?
        .map(Json)
        .ok_or_else(|| profile_not_found(&name))
}

/// Follow a profile rename in every open session.
fn rename_in_sessions<G>(state: &AppState<G>, old: &str, new: &str) {
    for session in state.sessions().sessions_mut() {
        session.rename_user(old, new);
    }
}

async fn put_profile<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<Profile>, ApiError> {
    let current = validate_user_name(&name).map_err(|e| bad_request(&e))?;
    let target = match input.user_name.as_deref() {
        Some(n) => validate_user_name(n).map_err(|e| bad_request(&e))?,
        None => current.clone(),
    };
    validate_profile_input(&input).map_err(|e| bad_request(&e))?;

    let profile = {
        let svc = state.service();
        if target != current && svc.get_profile(&target).context("database error")?.is_some() {
            return Err(ApiError::BadRequest(format!(
                "A profile named '{target}' already exists"
            )));
        }
        svc.save_profile(&current, &input)
            .context("failed to save profile")?
    };

    if profile.user_name != current {
        rename_in_sessions(&state, &current, &profile.user_name);
    }
    Ok(Json(profile))
}

async fn rename_profile<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<Profile>, ApiError> {
    let new_name = validate_user_name(&req.new_name).map_err(|e| bad_request(&e))?;

    let profile = {
        let svc = state.service();
        if svc.get_profile(&name).context("database error")?.is_none() {
            return Err(profile_not_found(&name));
        }
        if new_name != name && svc.get_profile(&new_name).context("database error")?.is_some() {
            return Err(ApiError::BadRequest(format!(
                "A profile named '{new_name}' already exists"
            )));
        }
        svc.rename_user(&name, &new_name)
            .context("failed to rename profile")?
    };

    rename_in_sessions(&state, &name, &profile.user_name);
    Ok(Json(profile))
}

async fn put_weight<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
    Json(req): Json<WeightRequest>,
) -> Result<Json<Profile>, ApiError> {
    validate_weight(req.weight_lbs).map_err(|e| bad_request(&e))?;

    let svc = state.service();
    if svc.get_profile(&name).context("database error")?.is_none() {
        return Err(profile_not_found(&name));
    }
    let profile = svc
        .update_weight(&name, req.weight_lbs)
        .context("failed to update weight")?;
    Ok(Json(profile))
}

// --- Equipment handlers ---

async fn list_equipment<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<EquipmentItem>>, ApiError> {
    let svc = state.service();
    let items = svc.list_equipment(&name).context("database error")?;
    Ok(Json(items))
}

async fn create_equipment<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
    Json(req): Json<CreateEquipmentRequest>,
) -> Result<(StatusCode, Json<EquipmentItem>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Equipment name is required".to_string()));
    }

    let svc = state.service();
    if svc.get_profile(&name).context("database error")?.is_none() {
        return Err(profile_not_found(&name));
    }
    let item = svc
        .add_equipment(&NewEquipment {
            user_name: name,
            name: req.name,
            category: req.category,
            notes: req.notes,
        })
        .context("failed to add equipment")?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_equipment<G>(
    State(state): State<AppState<G>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let svc = state.service();
    if svc.delete_equipment(id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Equipment item {id} not found")))
    }
}

// --- Food preference handlers ---

async fn list_food_preferences<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<FoodPreference>>, ApiError> {
    let svc = state.service();
    let prefs = svc.list_food_preferences(&name).context("database error")?;
    Ok(Json(prefs))
}

async fn create_food_preference<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
    Json(req): Json<CreateFoodPreferenceRequest>,
) -> Result<(StatusCode, Json<FoodPreference>), ApiError> {
    if req.item_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Food item name is required".to_string()));
    }

    let svc = state.service();
    if svc.get_profile(&name).context("database error")?.is_none() {
        return Err(profile_not_found(&name));
    }
    let pref = svc
        .add_food_preference(&NewFoodPreference {
            user_name: name,
            item_name: req.item_name,
            preference_type: req.preference_type,
            nutritional_goal: req.nutritional_goal,
        })
        .context("failed to add food preference")?;
    Ok((StatusCode::CREATED, Json(pref)))
}

async fn delete_food_preference<G>(
    State(state): State<AppState<G>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let svc = state.service();
    if svc.delete_food_preference(id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Food preference {id} not found")))
    }
}

// --- History ---

async fn get_history<G>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(HISTORY_FETCH_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let svc = state.service();
    let entries = svc.get_history(&name, limit).context("database error")?;
    Ok(Json(entries))
}

// --- Session handlers ---

async fn create_session<G>(State(state): State<AppState<G>>) -> (StatusCode, Json<SessionContext>) {
    let session = SessionContext::new();
    let mut sessions = state.sessions();
    sessions.insert(session.clone());
    debug!(session_id = %session.id, active = sessions.len(), "session created");
    (StatusCode::CREATED, Json(session))
}

async fn get_session<G>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<Json<SessionContext>, ApiError> {
    state.session(&id).map(Json)
}

async fn delete_session<G>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions().remove(&id).is_some() {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {id} not found")))
    }
}

async fn select_user<G>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
    Json(req): Json<SelectUserRequest>,
) -> Result<Json<SessionContext>, ApiError> {
    let exists = state
        .service()
        .get_profile(&req.user_name)
        .context("database error")?
        .is_some();
    if !exists {
        return Err(profile_not_found(&req.user_name));
    }

    let mut sessions = state.sessions();
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))?;
    session.select_user(&req.user_name);
    Ok(Json(session.clone()))
}

#[derive(Clone, Copy)]
enum Recommend {
    Workout,
    Dinner,
    Recipe,
}

/// Build the prompt under the service lock, generate without holding any
/// lock, then record the result if the session still points at the same user.
async fn recommend<G: TextGenerator>(
    state: &AppState<G>,
    id: &str,
    kind: Recommend,
) -> Result<Json<GenerationResponse>, ApiError> {
    let session = state.session(id)?;
    let user = session
        .selected_user
        .clone()
        .ok_or_else(|| ApiError::BadRequest("No user selected for this session".to_string()))?;

    let prompt = {
        let svc = state.service();
        if svc.get_profile(&user).context("database error")?.is_none() {
            return Err(profile_not_found(&user));
        }
        match kind {
            Recommend::Workout => svc.workout_prompt(&user),
            Recommend::Dinner => svc.dinner_prompt(&user),
            Recommend::Recipe => {
                let dinner = session.last_dinner.as_deref().ok_or_else(|| {
                    ApiError::BadRequest("Generate a dinner before asking for its recipe".to_string())
                })?;
                svc.recipe_prompt(&user, dinner)
            }
        }
        .context("failed to build prompt")?
    };

    let mut notices = Vec::new();
    let text = generate_with_retry(state.generator.as_ref(), &prompt, state.policy, |notice| {
        notices.push(notice.to_string());
    })
    .await;

    if let Some(current) = state.sessions().get_mut(id) {
        if current.selected_user.as_deref() == Some(user.as_str()) {
            match kind {
                Recommend::Workout => current.set_workout(text.clone()),
                Recommend::Dinner => current.set_dinner(text.clone()),
                Recommend::Recipe => {}
            }
        }
    }

    Ok(Json(GenerationResponse { text, notices }))
}

async fn recommend_workout<G: TextGenerator>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<Json<GenerationResponse>, ApiError> {
    recommend(&state, &id, Recommend::Workout).await
}

async fn recommend_dinner<G: TextGenerator>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<Json<GenerationResponse>, ApiError> {
    recommend(&state, &id, Recommend::Dinner).await
}

async fn recommend_recipe<G: TextGenerator>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<Json<GenerationResponse>, ApiError> {
    recommend(&state, &id, Recommend::Recipe).await
}

async fn save_session_history<G>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SaveHistoryResponse>), ApiError> {
    let session = state.session(&id)?;
    if session.selected_user.is_none() {
        return Err(ApiError::BadRequest(
            "No user selected for this session".to_string(),
        ));
    }
    if session.pending_history().is_none() {
        return Err(ApiError::BadRequest(
            "Generate both a workout and a dinner before saving".to_string(),
        ));
    }

    let entry = state
        .service()
        .save_session_history(&session)
        .context("failed to save history")?;
    let status = if entry.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(SaveHistoryResponse {
            saved: entry.is_some(),
            entry,
        }),
    ))
}

fn build_router<G: TextGenerator + 'static>(state: AppState<G>) -> Router {
    Router::new()
        .route("/api/users", get(list_users::<G>))
        .route(
            "/api/profiles/{name}",
            get(get_profile::<G>).put(put_profile::<G>),
        )
        .route("/api/profiles/{name}/rename", post(rename_profile::<G>))
        .route("/api/profiles/{name}/weight", put(put_weight::<G>))
        .route(
            "/api/profiles/{name}/equipment",
            get(list_equipment::<G>).post(create_equipment::<G>),
        )
        .route("/api/equipment/{id}", delete(delete_equipment::<G>))
        .route(
            "/api/profiles/{name}/food-preferences",
            get(list_food_preferences::<G>).post(create_food_preference::<G>),
        )
        .route(
            "/api/food-preferences/{id}",
            delete(delete_food_preference::<G>),
        )
        .route("/api/profiles/{name}/history", get(get_history::<G>))
        .route("/api/sessions", post(create_session::<G>))
        .route(
            "/api/sessions/{id}",
            get(get_session::<G>).delete(delete_session::<G>),
        )
        .route("/api/sessions/{id}/user", put(select_user::<G>))
        .route("/api/sessions/{id}/workout", post(recommend_workout::<G>))
        .route("/api/sessions/{id}/dinner", post(recommend_dinner::<G>))
        .route("/api/sessions/{id}/recipe", post(recommend_recipe::<G>))
        .route("/api/sessions/{id}/history", post(save_session_history::<G>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<G>,
        ))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of a key, or only `...` when it is too short
/// to reveal any of it.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "...".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server<G: TextGenerator + 'static>(
    svc: FitFlowService,
    generator: G,
    policy: RetryPolicy,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    svc.ensure_default_users()?;
    if !svc.history_available() {
        info!("recommendation history disabled; saves will be skipped");
    }

    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
        sessions: Arc::new(Mutex::new(SessionStore::default())),
        generator: Arc::new(generator),
        policy,
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        eprintln!(
            "API key: {} (see api_key file in data directory)",
            mask_key(key)
        );
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
