use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::calculator::Calculator;
use crate::errors::DispatchError;

/// Body of `POST /solve`.
#[derive(Debug, Default, Deserialize)]
pub struct SolveRequest
{
    #[serde(default)]
    pub problem: Option<String>,
}

/// The router: `POST /solve` with permissive CORS.
pub fn app(calculator: Calculator) -> Router
{
    Router::new()
        .route("/solve", post(solve))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(calculator))
}

async fn solve(State(calculator): State<Arc<Calculator>>, Json(request): Json<SolveRequest>) -> Response
{
    let problem = match request.problem.as_deref().map(str::trim)
    {
        Some(problem) if !problem.is_empty() => problem.to_owned(),
        _ => return error_response(StatusCode::BAD_REQUEST, &DispatchError::EmptyProblem.to_string()),
    };

    // solving is CPU-bound, keep it off the async workers
    let task_problem = problem.clone();
    let solved = tokio::task::spawn_blocking(move || calculator.solve_problem(&task_problem)).await;

    match solved
    {
        Ok(Ok(answer)) => (StatusCode::OK, Json(json!({ "result": answer }))).into_response(),
        Ok(Err(e)) => {
            warn!("could not solve '{problem}': {e}");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string())
        },
        Err(e) => {
            error!("solver task for '{problem}' failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error while solving the problem")
        },
    }
}

fn error_response(status: StatusCode, message: &str) -> Response
{
    (status, Json(json!({ "error": message }))).into_response()
}

/// Binds `addr` and serves [`app`] until the process is stopped.
pub async fn serve(addr: SocketAddr, calculator: Calculator) -> anyhow::Result<()>
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(calculator)).await?;
    Ok(())
}
