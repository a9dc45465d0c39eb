// Idea Board HTTP interface - routes and handlers

use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    app_state::AppState,
    error::AppResult,
    infrastructure::middleware::client_addr_extractor::ClientAddr,
    models::{
        Comment, Idea, IdeaDetail, IdeaListQuery, IdeaSort, IdeaSummary, NewComment, NewIdea,
        NewVote, Period, Vote,
    },
    services::diagnostics_service::{run_diagnostics, DiagnosticsReport},
};

// HTTP Handlers

pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Vibe Ideas API" }))
}

pub async fn list_ideas_handler(
    State(state): State<AppState>,
    Query(query): Query<IdeaListQuery>,
) -> AppResult<Json<Vec<IdeaSummary>>> {
    let period = Period::parse(query.period.as_deref());
    let sort = IdeaSort::parse(query.sort.as_deref());
    let ideas = state.idea_service.list_ideas(period, sort).await?;
    Ok(Json(ideas))
}

pub async fn get_idea_handler(
    State(state): State<AppState>,
    AxumPath(idea_id): AxumPath<String>,
) -> AppResult<Json<IdeaDetail>> {
    Ok(Json(state.idea_service.get_idea(&idea_id).await?))
}

pub async fn create_idea_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewIdea>, JsonRejection>,
) -> AppResult<Json<Idea>> {
    let Json(payload) = payload?;
    Ok(Json(state.idea_service.create_idea(payload).await?))
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> AppResult<Json<Comment>> {
    let Json(payload) = payload?;
    Ok(Json(state.idea_service.add_comment(payload).await?))
}

pub async fn add_vote_handler(
    State(state): State<AppState>,
    client: ClientAddr,
    payload: Result<Json<NewVote>, JsonRejection>,
) -> AppResult<Json<Vote>> {
    let Json(payload) = payload?;
    let vote = state
        .idea_service
        .add_vote(payload, client.into_inner())
        .await?;
    Ok(Json(vote))
}

pub async fn diagnostics_handler(State(state): State<AppState>) -> Json<DiagnosticsReport> {
    Json(run_diagnostics(state.store(), &state.config.database).await)
}

/// Full application router: board API, diagnostics, open CORS and request tracing.
pub fn create_idea_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/test", get(diagnostics_handler))
        // Ideas
        .route("/api/ideas", get(list_ideas_handler).post(create_idea_handler))
        .route("/api/ideas/{id}", get(get_idea_handler))
        // Reactions
        .route("/api/comments", post(add_comment_handler))
        .route("/api/votes", post(add_vote_handler))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
