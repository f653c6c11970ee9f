use axum::{
    routing::{get, post},
    Router,
    Json,
    Form,
    extract::{rejection::JsonRejection, Query, State},
    response::{Html, IntoResponse, Response},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{CorsLayer, Any};
use validator::Validate;

use crate::database::{ConversationRecord, Database};
use crate::knowledge_base::IndexStats;
use crate::llm::assistant::{farewell, greeting, Assistant, DEFAULT_GREETING};
use crate::providers::utils::count_tokens;

mod templates;

pub use templates::{escape_html, render_index, IndexPage};

const MAX_CONCURRENT_REQUESTS: usize = 64;

#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
    db: Arc<Database>,
    stats: Arc<IndexStats>,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>, db: Database, stats: IndexStats) -> Self {
        Self {
            assistant,
            db: Arc::new(db),
            stats: Arc::new(stats),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct IndexForm {
    name: Option<String>,
    dob: Option<String>,
    question: Option<String>,
}

#[derive(Deserialize)]
pub struct ExitQuery {
    name: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 1000))]
    question: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    dob: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
pub struct AskResponse {
    response: String,
    tokens: TokenInfo,
}

#[derive(Serialize)]
pub struct TokenInfo {
    input: usize,
    response: usize,
    total: usize,
}

#[derive(Serialize)]
pub struct FarewellResponse {
    farewell: String,
}

#[derive(Serialize)]
struct ApiResponse {
    status: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiResponse>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiResponse>) {
    (status, Json(ApiResponse { status: message.into() }))
}

/// Create and configure the router
pub fn create_api(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(index_page).post(index_form))
        .route("/exit", get(exit_handler))
        .route("/health", get(health_check))
        .route("/api/ask", post(ask_handler))
        .route("/api/history", get(history_handler))
        .route("/api/documents", get(documents_handler))
        .layer(cors)
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .with_state(state)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn index_page() -> Html<String> {
    Html(render_index(&IndexPage {
        greeting: DEFAULT_GREETING,
        ..Default::default()
    }))
}

async fn index_form(
    State(state): State<AppState>,
    Form(form): Form<IndexForm>,
) -> Response {
    let (Some(name), Some(dob), Some(question)) = (
        non_empty(form.name),
        non_empty(form.dob),
        non_empty(form.question),
    ) else {
        return index_page().await.into_response();
    };

    log::info!("Question from {}", name);
    let welcome = greeting(&name);

    match state.assistant.handle_user_input(&question).await {
        Ok(response) => {
            if let Err(e) = state
                .db
                .save_conversation(name.clone(), dob.clone(), question, response.clone())
                .await
            {
                log::warn!("Failed to save conversation to database: {}", e);
            }

            Html(render_index(&IndexPage {
                greeting: &welcome,
                response: Some(&response),
                error: None,
                name: Some(&name),
                dob: Some(&dob),
            }))
            .into_response()
        }
        Err(e) => {
            log::error!("Assistant error: {:#}", e);
            let message = format!("Something went wrong while answering: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_index(&IndexPage {
                    greeting: &welcome,
                    response: None,
                    error: Some(&message),
                    name: Some(&name),
                    dob: Some(&dob),
                })),
            )
                .into_response()
        }
    }
}

async fn exit_handler(Query(query): Query<ExitQuery>) -> Json<FarewellResponse> {
    let name = query.name.unwrap_or_else(|| "friend".to_string());
    Json(FarewellResponse {
        farewell: farewell(&name),
    })
}

async fn health_check() -> Response {
    Json(ApiResponse {
        status: "Server is running and healthy".to_string(),
    })
    .into_response()
}

async fn ask_handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult<AskResponse> {
    let Json(request) = payload.map_err(|e| {
        api_error(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid request: {}", e.body_text()))
    })?;
    request
        .validate()
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid request: {}", e)))?;

    let response = state
        .assistant
        .handle_user_input(&request.question)
        .await
        .map_err(|e| {
            log::error!("Assistant error: {:#}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("AI error: {}", e))
        })?;

    if let Err(e) = state
        .db
        .save_conversation(
            request.name.unwrap_or_default(),
            request.dob.unwrap_or_default(),
            request.question.clone(),
            response.clone(),
        )
        .await
    {
        log::warn!("Failed to save conversation to database: {}", e);
    }

    let input = count_tokens(&request.question);
    let output = count_tokens(&response);
    Ok(Json(AskResponse {
        response,
        tokens: TokenInfo {
            input,
            response: output,
            total: input + output,
        },
    }))
}

async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<ConversationRecord>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let records = state.db.get_recent_conversations(limit).await.map_err(|e| {
        log::error!("Database error: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
    })?;
    Ok(Json(records))
}

async fn documents_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.stats.as_ref().clone())
}
