use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invest_profile_core::context::AppContext;
use invest_profile_core::domain::profile::{
    PipelineState, ProfileClassification, ProfileStatus,
};
use invest_profile_core::domain::questionnaire::{normalize_answers, QuestionnaireSubmission};
use invest_profile_core::domain::recommendation::RecommendationSet;
use invest_profile_core::remote::auth::RegisterResponse;
use invest_profile_core::ProfileError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = invest_profile_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let ctx = match AppContext::from_settings(&settings).await {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "profile context unavailable; starting API in degraded mode");
            None
        }
    };

    let app = router(AppState { ctx }).layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/profile", delete(clear_profile))
        .route("/profile/status", get(get_status))
        .route(
            "/profile/questionnaire",
            get(get_questionnaire).post(save_questionnaire),
        )
        .route("/profile/analysis", get(get_analysis).post(analyze_profile))
        .route(
            "/profile/recommendations",
            get(get_recommendations).post(load_recommendations),
        )
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    ctx: Option<AppContext>,
}

impl AppState {
    fn ctx(&self) -> Result<&AppContext, ApiError> {
        self.ctx.as_ref().ok_or(ApiError::Unavailable)
    }
}

enum ApiError {
    Unavailable,
    NotFound,
    Profile(ProfileError),
    /// Errors from the auth routes, where the auth service's 4xx verdict is the answer.
    Auth(ProfileError),
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        Self::Profile(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn status_for(err: &ProfileError) -> StatusCode {
    match err {
        ProfileError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ProfileError::MissingPrecondition { .. } => StatusCode::CONFLICT,
        ProfileError::InvalidSubmission(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProfileError::Upstream { .. } | ProfileError::Transport(_) => StatusCode::BAD_GATEWAY,
        ProfileError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ProfileError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn auth_status_for(err: &ProfileError) -> StatusCode {
    match err {
        ProfileError::Upstream { status_code, .. } if (400..500).contains(status_code) => {
            StatusCode::from_u16(*status_code).unwrap_or(StatusCode::BAD_REQUEST)
        }
        other => status_for(other),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "unavailable",
                    message: "profile services are not configured".to_string(),
                },
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "not_found",
                    message: "no cached record".to_string(),
                },
            ),
            Self::Profile(err) => profile_error(status_for(&err), &err),
            Self::Auth(err) => profile_error(auth_status_for(&err), &err),
        };
        (status, Json(body)).into_response()
    }
}

fn profile_error(status: StatusCode, err: &ProfileError) -> (StatusCode, ErrorBody) {
    if status.is_server_error() {
        sentry::capture_error(err);
    }
    (
        status,
        ErrorBody {
            error: err.kind(),
            message: err.to_string(),
        },
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiStatus {
    #[serde(flatten)]
    status: ProfileStatus,
    state: PipelineState,
}

async fn get_status(State(state): State<AppState>) -> Result<Json<ApiStatus>, ApiError> {
    let status = state.ctx()?.orchestrator.status().await?;
    Ok(Json(ApiStatus {
        state: status.stage(),
        status,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitQuestionnaire {
    answers: BTreeMap<String, String>,
    monthly_investment_value: f64,
}

async fn save_questionnaire(
    State(state): State<AppState>,
    Json(body): Json<SubmitQuestionnaire>,
) -> Result<(StatusCode, Json<QuestionnaireSubmission>), ApiError> {
    let answers = normalize_answers(body.answers)?;

    let submission = state
        .ctx()?
        .orchestrator
        .save_submission(answers, body.monthly_investment_value)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn get_questionnaire(
    State(state): State<AppState>,
) -> Result<Json<QuestionnaireSubmission>, ApiError> {
    let submission = state.ctx()?.orchestrator.questionnaire().await?;
    submission.map(Json).ok_or(ApiError::NotFound)
}

async fn analyze_profile(
    State(state): State<AppState>,
) -> Result<Json<ProfileClassification>, ApiError> {
    Ok(Json(state.ctx()?.orchestrator.analyze_profile().await?))
}

async fn get_analysis(
    State(state): State<AppState>,
) -> Result<Json<ProfileClassification>, ApiError> {
    let classification = state.ctx()?.orchestrator.classification().await?;
    classification.map(Json).ok_or(ApiError::NotFound)
}

async fn load_recommendations(
    State(state): State<AppState>,
) -> Result<Json<RecommendationSet>, ApiError> {
    Ok(Json(state.ctx()?.orchestrator.load_recommendations().await?))
}

async fn get_recommendations(
    State(state): State<AppState>,
) -> Result<Json<RecommendationSet>, ApiError> {
    let recommendations = state.ctx()?.orchestrator.recommendations().await?;
    recommendations.map(Json).ok_or(ApiError::NotFound)
}

async fn clear_profile(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.ctx()?.orchestrator.clear_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiSession {
    user_id: String,
    email: String,
    username: String,
    login_time: DateTime<Utc>,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<ApiSession>, ApiError> {
    let ctx = state.ctx()?;
    let session = ctx
        .sessions
        .login(&ctx.auth, body.email.trim(), &body.password)
        .await
        .map_err(ApiError::Auth)?;

    Ok(Json(ApiSession {
        user_id: session.user_id,
        email: session.email,
        username: session.username,
        login_time: session.login_time,
    }))
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
    username: String,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let account = state
        .ctx()?
        .auth
        .register(body.email.trim(), &body.password, body.username.trim())
        .await
        .map_err(ApiError::Auth)?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.ctx()?.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &invest_profile_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
