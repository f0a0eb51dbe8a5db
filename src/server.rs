use crate::models::Board;
use crate::state::AppState;
use crate::store::BoardError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route(
            "/boards/:slug",
            get(fetch_board).put(replace_board).delete(remove_board),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Binds the API on localhost and serves it in the background. Pass port 0
/// for an ephemeral port; the bound port is returned either way.
pub async fn start_server(
    app_state: AppState,
    port: u16,
) -> Result<u16, Box<dyn std::error::Error>> {
    let app = router(app_state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();

    println!("Board server started on port: {}", port);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Board server stopped: {}", e);
        }
    });

    Ok(port)
}

fn error_response(err: BoardError) -> (StatusCode, String) {
    let status = match &err {
        BoardError::NotFound { .. } => StatusCode::NOT_FOUND,
        BoardError::SlugTaken { .. } => StatusCode::CONFLICT,
        BoardError::InvalidName { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BoardError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

async fn list_boards(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_boards().await {
        Ok(mut boards) => {
            // Host enumeration order is unstable; keep the API output stable.
            boards.sort_by(|a, b| a.slug.cmp(&b.slug));
            Json(boards).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBoard {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

async fn create_board(
    State(state): State<AppState>,
    Json(req): Json<CreateBoard>,
) -> impl IntoResponse {
    match state.store.create_board(&req.name, req.description).await {
        Ok(board) => (StatusCode::CREATED, Json(board)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn fetch_board(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.store.get_board(&slug).await {
        Ok(board) => Json(board).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn replace_board(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(mut board): Json<Board>,
) -> impl IntoResponse {
    // The path identifies the board; the body's slug is ignored.
    board.slug = slug.clone();

    if let Err(e) = state.store.get_board(&slug).await {
        return error_response(e).into_response();
    }
    match state.store.save_board(board).await {
        Ok(board) => Json(board).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn remove_board(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_board(&slug).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
